// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the engines and what they are wired to: the store and the
//! path matcher.

pub mod adapter;
pub mod matcher;
pub mod storage;

pub use adapter::PluginAdapter;
pub use matcher::PathMatcher;
pub use storage::StorageAdapter;
