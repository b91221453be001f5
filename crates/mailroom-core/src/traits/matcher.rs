// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-matching primitive consumed by the lease engine.

use std::path::Path;

use crate::error::MailroomError;
use crate::traits::adapter::PluginAdapter;

/// Tests literal paths against glob patterns.
///
/// Implementations must be pure: the same `(path, pattern)` pair always
/// yields the same answer.
pub trait PathMatcher: PluginAdapter {
    /// Whether the literal `path` is matched by `pattern`.
    fn matches(&self, path: &str, pattern: &str) -> bool;

    /// Every file under `root` matched by at least one of `patterns`.
    ///
    /// Paths are returned relative to `root`, `/`-separated, sorted and
    /// de-duplicated.
    fn find_matching(&self, root: &Path, patterns: &[String]) -> Result<Vec<String>, MailroomError>;
}
