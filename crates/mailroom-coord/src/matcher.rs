// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `PathMatcher` backed by the `glob` crate.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use tracing::debug;

use mailroom_core::{AdapterType, HealthStatus, MailroomError, PathMatcher, PluginAdapter};

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Shell-style glob matching where `*` stays within one segment and `**`
/// spans directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl GlobMatcher {
    /// Matcher with `*` confined to one path segment.
    pub fn new() -> Self {
        Self
    }
}

/// Render a path relative to `root` with `/` separators.
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[async_trait]
impl PluginAdapter for GlobMatcher {
    fn name(&self) -> &str {
        "glob"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Matcher
    }

    async fn health_check(&self) -> Result<HealthStatus, MailroomError> {
        Ok(HealthStatus::Healthy)
    }
}

impl PathMatcher for GlobMatcher {
    fn matches(&self, path: &str, pattern: &str) -> bool {
        match Pattern::new(pattern) {
            Ok(compiled) => compiled.matches_with(path, OPTIONS),
            Err(_) => path == pattern,
        }
    }

    fn find_matching(&self, root: &Path, patterns: &[String]) -> Result<Vec<String>, MailroomError> {
        if !root.is_dir() {
            return Err(MailroomError::Validation(format!(
                "`{}` is not a directory",
                root.display()
            )));
        }
        let escaped_root = Pattern::escape(&root.to_string_lossy());
        let mut found = BTreeSet::new();

        for pattern in patterns {
            let pattern = pattern.trim_start_matches("./");
            if Pattern::new(pattern).is_err() {
                if root.join(pattern).is_file() {
                    found.insert(pattern.to_string());
                }
                continue;
            }

            let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
            let entries = glob::glob_with(&full, OPTIONS).map_err(|e| {
                MailroomError::Validation(format!("invalid pattern `{pattern}`: {e}"))
            })?;
            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() => {
                        if let Some(rel) = relative_slash_path(root, &path) {
                            found.insert(rel);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "skipping unreadable path"),
                }
            }

            // `dir/**` names a directory; expand to everything beneath it.
            if pattern.ends_with("/**") || pattern == "**" {
                let nested = format!("{full}/*");
                if let Ok(entries) = glob::glob_with(&nested, OPTIONS) {
                    for path in entries.flatten().filter(|p| p.is_file()) {
                        if let Some(rel) = relative_slash_path(root, &path) {
                            found.insert(rel);
                        }
                    }
                }
            }
        }

        Ok(found.into_iter().collect())
    }
}
