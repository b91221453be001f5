// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for mailroom integration tests.
//!
//! [`TestHarness`] opens a [`mailroom_coord::Coordinator`] on a throwaway
//! SQLite file and offers shortcuts for seeding projects and agents.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder};
