// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordination engines for agents sharing one codebase.
//!
//! - [`LeaseEngine`]: exclusive or shared, time-bounded reservations on
//!   file-path patterns, with conservative overlap detection.
//! - [`AdmissionEngine`]: contact links between agents and the decision of
//!   whether one agent may message another.
//! - [`MessageDispatcher`]: filters recipients through the Admission Engine
//!   and persists messages one at a time.
//!
//! [`Coordinator`] wires all three to a SQLite database.

pub mod admission;
pub mod coordinator;
pub mod dispatch;
pub mod lease;
pub mod lock;
pub mod matcher;
pub mod overlap;

pub use admission::AdmissionEngine;
pub use coordinator::Coordinator;
pub use dispatch::{MessageDispatcher, SendMessageInput, SendOutcome};
pub use lease::{LeaseEngine, ReserveOptions};
pub use lock::NamedLocks;
pub use matcher::GlobMatcher;
pub use overlap::patterns_overlap;
