// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable state for projects, agents, links, reservations, and mail.
//!
//! One `tokio-rusqlite` connection per [`Database`]; refinery migrations run
//! on open. Each table has a query module under [`queries`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod timestamp;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use models::*;
