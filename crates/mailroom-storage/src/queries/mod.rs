// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.

pub mod agents;
pub mod links;
pub mod messages;
pub mod projects;
pub mod reservations;
