// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lease Engine: file reservation lifecycle and conflict detection.
//!
//! Every mutation runs under the [`lock::RESERVATIONS`] lock, and the
//! check-then-insert of [`LeaseEngine::reserve_files`] additionally runs in a
//! single `BEGIN IMMEDIATE` transaction, so a conflict check can never be
//! invalidated by a concurrent grant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use mailroom_config::model::ReservationConfig;
use mailroom_core::{
    AgentId, FileReservation, MailroomError, PathMatcher, ProjectId, ReservationConflict,
    ReservationId,
};
use mailroom_storage::Database;
use mailroom_storage::ReservationFilter;
use mailroom_storage::queries::{agents, reservations};
use mailroom_storage::queries::reservations::ReservationRequest;

use crate::lock::{self, NamedLocks};
use crate::overlap::patterns_overlap;

/// Options for [`LeaseEngine::reserve_files`].
#[derive(Debug, Clone)]
pub struct ReserveOptions {
    /// Exclusive reservations block and are blocked; shared ones never are.
    pub exclusive: bool,
    /// Free text shown to agents that run into this reservation.
    pub reason: Option<String>,
    /// Falls back to `[reservations].default_ttl_seconds`.
    pub ttl_seconds: Option<i64>,
}

impl Default for ReserveOptions {
    fn default() -> Self {
        Self {
            exclusive: true,
            reason: None,
            ttl_seconds: None,
        }
    }
}

/// Patterns that reserve most of a tree, or point outside it.
fn is_suspicious(pattern: &str) -> bool {
    matches!(pattern, "*" | "**" | "**/*" | "/" | ".")
        || pattern.starts_with('/')
        || pattern.split('/').any(|seg| seg == "..")
}

/// Every (requested pattern, holder) pair that overlaps.
pub fn detect_conflicts(
    matcher: &dyn PathMatcher,
    patterns: &[String],
    holders: &[FileReservation],
) -> Vec<ReservationConflict> {
    let mut conflicts = Vec::new();
    for pattern in patterns {
        for holder in holders {
            if patterns_overlap(pattern, &holder.path_pattern, matcher) {
                conflicts.push(conflict_with(pattern, holder));
            }
        }
    }
    conflicts
}

fn conflict_with(pattern: &str, holder: &FileReservation) -> ReservationConflict {
    ReservationConflict {
        pattern: pattern.to_string(),
        holder_agent_id: holder.agent_id,
        holder_agent_name: None,
        holder_pattern: holder.path_pattern.clone(),
        holder_reservation_id: holder.id,
        holder_expires_ts: holder.expires_ts,
    }
}

/// Grants, releases, renews and checks file reservations.
#[derive(Clone)]
pub struct LeaseEngine {
    db: Database,
    matcher: Arc<dyn PathMatcher>,
    locks: NamedLocks,
    config: ReservationConfig,
}

impl LeaseEngine {
    /// Engine over `db`. Every mutation takes the reservations lock in `locks`.
    pub fn new(
        db: Database,
        matcher: Arc<dyn PathMatcher>,
        locks: NamedLocks,
        config: ReservationConfig,
    ) -> Self {
        Self {
            db,
            matcher,
            locks,
            config,
        }
    }

    /// The requested TTL, or the configured default, checked against the
    /// configured floor and ceiling.
    fn ttl_or_default(&self, ttl_seconds: Option<i64>) -> Result<i64, MailroomError> {
        let seconds = |name: &str, value: u64| {
            i64::try_from(value).map_err(|_| {
                MailroomError::Validation(format!("reservations.{name} ({value}) is out of range"))
            })
        };
        let min = seconds("min_ttl_seconds", self.config.min_ttl_seconds)?;
        let max = seconds("max_ttl_seconds", self.config.max_ttl_seconds)?;
        let ttl = match ttl_seconds {
            Some(ttl) => ttl,
            None => seconds("default_ttl_seconds", self.config.default_ttl_seconds)?,
        };

        if ttl < 0 || ttl < min {
            return Err(MailroomError::Validation(format!(
                "ttl_seconds {ttl} is below the minimum of {min}"
            )));
        }
        if ttl > max {
            return Err(MailroomError::Validation(format!(
                "ttl_seconds {ttl} is above the maximum of {max}"
            )));
        }
        Ok(ttl)
    }

    async fn fill_holder_names(
        &self,
        mut conflicts: Vec<ReservationConflict>,
    ) -> Result<Vec<ReservationConflict>, MailroomError> {
        let ids: Vec<AgentId> = conflicts.iter().map(|c| c.holder_agent_id).collect();
        let names = agents::agent_names(&self.db, &ids).await?;
        for conflict in &mut conflicts {
            conflict.holder_agent_name = names.get(&conflict.holder_agent_id).cloned();
        }
        Ok(conflicts)
    }

    /// Reserve `patterns` for an agent in its own project.
    ///
    /// An exclusive request that overlaps any other agent's active exclusive
    /// reservation is rejected as a whole with
    /// [`MailroomError::ReservationConflict`]. Otherwise one row per pattern
    /// is created, all sharing one creation and expiry time.
    pub async fn reserve_files(
        &self,
        agent_id: AgentId,
        patterns: &[String],
        options: ReserveOptions,
    ) -> Result<Vec<FileReservation>, MailroomError> {
        let agent = agents::get_agent(&self.db, agent_id)
            .await?
            .ok_or_else(|| MailroomError::not_found("agent", agent_id))?;

        let patterns: Vec<String> = patterns.iter().map(|p| p.trim().to_string()).collect();
        if patterns.is_empty() || patterns.iter().any(String::is_empty) {
            return Err(MailroomError::Validation(
                "at least one non-empty path pattern is required".into(),
            ));
        }
        let ttl_seconds = self.ttl_or_default(options.ttl_seconds)?;

        if self.config.warn_on_broad_patterns {
            for pattern in patterns.iter().filter(|p| is_suspicious(p)) {
                warn!(agent = %agent.name, pattern = %pattern, "reservation pattern covers a broad or out-of-tree path");
            }
        }

        let request = ReservationRequest {
            project_id: agent.project_id,
            agent_id,
            patterns: patterns.clone(),
            exclusive: options.exclusive,
            reason: options.reason,
            ttl_seconds,
        };
        let matcher = Arc::clone(&self.matcher);
        let detect_patterns = patterns.clone();

        let outcome = self
            .locks
            .with_lock(
                lock::RESERVATIONS,
                reservations::reserve_atomically(&self.db, request, move |holders| {
                    detect_conflicts(matcher.as_ref(), &detect_patterns, holders)
                }),
            )
            .await?;

        match outcome {
            Ok(granted) => {
                info!(
                    agent = %agent.name,
                    count = granted.len(),
                    exclusive = options.exclusive,
                    ttl_seconds,
                    "reservations granted"
                );
                Ok(granted)
            }
            Err(conflicts) => {
                for c in &conflicts {
                    warn!(
                        agent = %agent.name,
                        pattern = %c.pattern,
                        holder = %c.holder_display_name(),
                        holder_pattern = %c.holder_pattern,
                        "reservation denied"
                    );
                }
                Err(MailroomError::ReservationConflict { conflicts })
            }
        }
    }

    /// Conflicts `patterns` would meet if `agent_id` requested them exclusively now.
    pub async fn check_conflicts(
        &self,
        project_id: ProjectId,
        agent_id: AgentId,
        patterns: &[String],
    ) -> Result<Vec<ReservationConflict>, MailroomError> {
        let holders = reservations::active_exclusive(&self.db, project_id, Some(agent_id)).await?;
        let conflicts = detect_conflicts(self.matcher.as_ref(), patterns, &holders);
        self.fill_holder_names(conflicts).await
    }

    /// Active exclusive reservations that cover any of the concrete `paths`.
    ///
    /// Uses exact glob matching, not the overlap heuristic, since the paths
    /// are real files.
    pub async fn check_reservation_conflicts(
        &self,
        project_id: ProjectId,
        paths: &[String],
        excluding: Option<AgentId>,
    ) -> Result<Vec<ReservationConflict>, MailroomError> {
        let holders = reservations::active_exclusive(&self.db, project_id, excluding).await?;
        let mut conflicts = Vec::new();
        for path in paths {
            for holder in &holders {
                if self.matcher.matches(path, &holder.path_pattern) {
                    conflicts.push(conflict_with(path, holder));
                }
            }
        }
        self.fill_holder_names(conflicts).await
    }

    /// Whether a concrete path is covered by someone's active exclusive reservation.
    pub async fn is_file_reserved(
        &self,
        project_id: ProjectId,
        path: &str,
        excluding: Option<AgentId>,
    ) -> Result<bool, MailroomError> {
        let holders = reservations::active_exclusive(&self.db, project_id, excluding).await?;
        Ok(holders
            .iter()
            .any(|h| self.matcher.matches(path, &h.path_pattern)))
    }

    /// Release reservations by id. Already-released ids count as zero.
    pub async fn release_reservations(&self, ids: &[ReservationId]) -> Result<usize, MailroomError> {
        let released = self
            .locks
            .with_lock(lock::RESERVATIONS, reservations::release_ids(&self.db, ids))
            .await?;
        info!(requested = ids.len(), released, "reservations released");
        Ok(released)
    }

    /// Release every reservation an agent still holds.
    pub async fn release_all_for_agent(&self, agent_id: AgentId) -> Result<usize, MailroomError> {
        let released = self
            .locks
            .with_lock(
                lock::RESERVATIONS,
                reservations::release_all_for_agent(&self.db, agent_id),
            )
            .await?;
        info!(agent_id, released, "released all reservations for agent");
        Ok(released)
    }

    /// Administrative release of any reservation.
    ///
    /// An earlier release time is preserved. Returns whether the id exists.
    pub async fn force_release(&self, id: ReservationId) -> Result<bool, MailroomError> {
        let touched = self
            .locks
            .with_lock(lock::RESERVATIONS, reservations::force_release(&self.db, id))
            .await?;
        if touched {
            warn!(reservation_id = id, "reservation force-released");
        }
        Ok(touched)
    }

    /// Extend unreleased reservations to `now + ttl`. Released ids count as zero.
    pub async fn renew_reservations(
        &self,
        ids: &[ReservationId],
        ttl_seconds: Option<i64>,
    ) -> Result<usize, MailroomError> {
        let ttl = self.ttl_or_default(ttl_seconds)?;
        let renewed = self
            .locks
            .with_lock(lock::RESERVATIONS, reservations::renew(&self.db, ids, ttl))
            .await?;
        info!(requested = ids.len(), renewed, ttl_seconds = ttl, "reservations renewed");
        Ok(renewed)
    }

    /// Mark lapsed, unreleased reservations as released.
    ///
    /// Bookkeeping only: active-set queries already ignore expired rows.
    pub async fn expire_stale_reservations(&self) -> Result<usize, MailroomError> {
        let expired = self
            .locks
            .with_lock(lock::RESERVATIONS, reservations::expire_stale(&self.db))
            .await?;
        info!(expired, "expired stale reservations");
        Ok(expired)
    }

    /// Reservations in a project, optionally narrowed to one agent or to the
    /// active set.
    pub async fn list_reservations(
        &self,
        project_id: ProjectId,
        agent_id: Option<AgentId>,
        active_only: bool,
    ) -> Result<Vec<FileReservation>, MailroomError> {
        reservations::list_reservations(
            &self.db,
            ReservationFilter {
                project_id,
                agent_id,
                active_only,
            },
        )
        .await
    }

    /// Fails with `NotFound` for an unknown id.
    pub async fn get_reservation(&self, id: ReservationId) -> Result<FileReservation, MailroomError> {
        reservations::get_reservation(&self.db, id)
            .await?
            .ok_or_else(|| MailroomError::not_found("reservation", id))
    }

    /// Files under `root` covered by the agent's active reservations.
    pub async fn files_held_by(
        &self,
        agent_id: AgentId,
        root: &Path,
    ) -> Result<Vec<String>, MailroomError> {
        let held = reservations::active_for_agent(&self.db, agent_id).await?;
        if held.is_empty() {
            return Ok(Vec::new());
        }
        let patterns: Vec<String> = held.into_iter().map(|r| r.path_pattern).collect();
        let matcher = Arc::clone(&self.matcher);
        let root: PathBuf = root.to_path_buf();
        tokio::task::spawn_blocking(move || matcher.find_matching(&root, &patterns))
            .await
            .map_err(|e| MailroomError::Internal(format!("file scan task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::GlobMatcher;
    use mailroom_core::ContactPolicy;
    use mailroom_storage::NewAgent;
    use mailroom_storage::queries::projects;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    struct Fixture {
        engine: LeaseEngine,
        project_id: ProjectId,
        alpha: AgentId,
        bravo: AgentId,
        _dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lease.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let project = projects::create_project(&db, "demo", "/tmp/demo").await.unwrap();
        let mut ids = Vec::new();
        for name in ["Alpha", "Bravo"] {
            let agent = agents::create_agent(
                &db,
                &NewAgent {
                    project_id: project.id,
                    name: name.into(),
                    program: "codex".into(),
                    model: None,
                    contact_policy: ContactPolicy::Auto,
                },
            )
            .await
            .unwrap();
            ids.push(agent.id);
        }
        let engine = LeaseEngine::new(
            db,
            Arc::new(GlobMatcher::new()),
            NamedLocks::new(),
            ReservationConfig::default(),
        );
        Fixture {
            engine,
            project_id: project.id,
            alpha: ids[0],
            bravo: ids[1],
            _dir: dir,
        }
    }

    fn pats(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    fn shared() -> ReserveOptions {
        ReserveOptions {
            exclusive: false,
            ..ReserveOptions::default()
        }
    }

    #[tokio::test]
    async fn default_ttl_comes_from_config() {
        let f = setup().await;
        let granted = f
            .engine
            .reserve_files(f.alpha, &pats(&["src/a.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        let ttl = granted[0].expires_ts - granted[0].created_ts;
        assert_eq!(ttl.num_seconds(), 1800);
        assert!(granted[0].exclusive);
    }

    #[tokio::test]
    async fn conflicting_batch_is_rejected_whole() {
        let f = setup().await;
        f.engine
            .reserve_files(f.alpha, &pats(&["src/**"]), ReserveOptions::default())
            .await
            .unwrap();

        let err = f
            .engine
            .reserve_files(f.bravo, &pats(&["docs/x.md", "src/lib.rs"]), ReserveOptions::default())
            .await
            .unwrap_err();
        match err {
            MailroomError::ReservationConflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].pattern, "src/lib.rs");
                assert_eq!(conflicts[0].holder_agent_name.as_deref(), Some("Alpha"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let bravo = f
            .engine
            .list_reservations(f.project_id, Some(f.bravo), false)
            .await
            .unwrap();
        assert!(bravo.is_empty());
    }

    #[tokio::test]
    async fn shared_reservations_never_conflict() {
        let f = setup().await;
        f.engine
            .reserve_files(f.alpha, &pats(&["src/a.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        f.engine
            .reserve_files(f.bravo, &pats(&["src/a.rs"]), shared())
            .await
            .unwrap();

        // A shared holder does not block a later exclusive request either.
        let g = f.engine.reserve_files(f.alpha, &pats(&["lib/b.rs"]), shared()).await.unwrap();
        assert_eq!(g.len(), 1);
        f.engine
            .reserve_files(f.bravo, &pats(&["lib/b.rs"]), ReserveOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn own_reservations_do_not_conflict() {
        let f = setup().await;
        f.engine
            .reserve_files(f.alpha, &pats(&["src/a.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        f.engine
            .reserve_files(f.alpha, &pats(&["src/*.rs"]), ReserveOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_or_blank_patterns_are_rejected() {
        let f = setup().await;
        let err = f
            .engine
            .reserve_files(f.alpha, &[], ReserveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)));

        let err = f
            .engine
            .reserve_files(f.alpha, &pats(&["  "]), ReserveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found() {
        let f = setup().await;
        let err = f
            .engine
            .reserve_files(4040, &pats(&["a"]), ReserveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { entity: "agent", .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn broad_patterns_are_granted_with_a_warning() {
        let f = setup().await;
        let granted = f
            .engine
            .reserve_files(f.alpha, &pats(&["**/*"]), ReserveOptions::default())
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);
        assert!(logs_contain("broad or out-of-tree"));
    }

    #[tokio::test]
    async fn ttl_below_minimum_is_rejected() {
        let f = setup().await;
        let engine = LeaseEngine {
            config: ReservationConfig {
                min_ttl_seconds: 60,
                ..ReservationConfig::default()
            },
            ..f.engine.clone()
        };
        let err = engine
            .reserve_files(
                f.alpha,
                &pats(&["a.rs"]),
                ReserveOptions {
                    ttl_seconds: Some(10),
                    ..ReserveOptions::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)));
    }

    #[tokio::test]
    async fn huge_ttl_on_reserve_is_rejected_and_store_stays_usable() {
        let f = setup().await;
        let err = f
            .engine
            .reserve_files(
                f.alpha,
                &pats(&["src/a.rs"]),
                ReserveOptions {
                    ttl_seconds: Some(i64::MAX / 2),
                    ..ReserveOptions::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)), "{err}");

        let granted = f
            .engine
            .reserve_files(f.alpha, &pats(&["src/b.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);
    }

    #[tokio::test]
    async fn huge_ttl_on_renew_is_rejected_and_store_stays_usable() {
        let f = setup().await;
        let granted = f
            .engine
            .reserve_files(f.alpha, &pats(&["src/a.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        let err = f
            .engine
            .renew_reservations(&[granted[0].id], Some(i64::MAX / 2))
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)), "{err}");

        f.engine
            .reserve_files(f.bravo, &pats(&["docs/c.md"]), ReserveOptions::default())
            .await
            .unwrap();
        let kept = f.engine.get_reservation(granted[0].id).await.unwrap();
        assert_eq!(kept.expires_ts, granted[0].expires_ts);
    }

    #[tokio::test]
    async fn oversized_config_values_do_not_wrap() {
        let f = setup().await;
        let engine = LeaseEngine {
            config: ReservationConfig {
                default_ttl_seconds: u64::MAX,
                min_ttl_seconds: u64::MAX,
                max_ttl_seconds: u64::MAX,
                ..ReservationConfig::default()
            },
            ..f.engine.clone()
        };
        let err = engine
            .reserve_files(f.alpha, &pats(&["a.rs"]), ReserveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn concrete_path_checks_use_exact_matching() {
        let f = setup().await;
        f.engine
            .reserve_files(f.alpha, &pats(&["src/*.rs"]), ReserveOptions::default())
            .await
            .unwrap();

        assert!(f.engine.is_file_reserved(f.project_id, "src/main.rs", None).await.unwrap());
        assert!(!f.engine.is_file_reserved(f.project_id, "src/net/mod.rs", None).await.unwrap());
        assert!(
            !f.engine
                .is_file_reserved(f.project_id, "src/main.rs", Some(f.alpha))
                .await
                .unwrap()
        );

        let conflicts = f
            .engine
            .check_reservation_conflicts(f.project_id, &pats(&["src/main.rs", "README.md"]), Some(f.bravo))
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].pattern, "src/main.rs");
        assert_eq!(conflicts[0].holder_pattern, "src/*.rs");

        let heuristic = f
            .engine
            .check_conflicts(f.project_id, f.bravo, &pats(&["src/*.toml"]))
            .await
            .unwrap();
        assert_eq!(heuristic.len(), 1, "same directory plus wildcard is a conservative overlap");
    }

    #[tokio::test]
    async fn expired_reservations_stop_blocking() {
        let f = setup().await;
        f.engine
            .reserve_files(
                f.alpha,
                &pats(&["src/a.rs"]),
                ReserveOptions {
                    ttl_seconds: Some(0),
                    ..ReserveOptions::default()
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        f.engine
            .reserve_files(f.bravo, &pats(&["src/a.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        assert_eq!(f.engine.expire_stale_reservations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn release_renew_and_force_release() {
        let f = setup().await;
        let granted = f
            .engine
            .reserve_files(f.alpha, &pats(&["a.rs", "b.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        let ids: Vec<_> = granted.iter().map(|r| r.id).collect();

        assert_eq!(f.engine.renew_reservations(&ids, Some(7_200)).await.unwrap(), 2);
        let renewed = f.engine.get_reservation(ids[0]).await.unwrap();
        assert!(renewed.expires_ts > granted[0].expires_ts);

        assert_eq!(f.engine.release_reservations(&ids[..1]).await.unwrap(), 1);
        assert_eq!(f.engine.release_reservations(&ids[..1]).await.unwrap(), 0);
        assert_eq!(f.engine.renew_reservations(&ids[..1], None).await.unwrap(), 0);

        assert!(f.engine.force_release(ids[1]).await.unwrap());
        assert!(!f.engine.force_release(99_999).await.unwrap());
        assert_eq!(f.engine.release_all_for_agent(f.alpha).await.unwrap(), 0);

        let err = f.engine.get_reservation(99_999).await.unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { .. }));
    }

    #[tokio::test]
    async fn files_held_by_expands_patterns_against_a_tree() {
        let f = setup().await;
        let tree = tempdir().unwrap();
        std::fs::create_dir_all(tree.path().join("src")).unwrap();
        std::fs::write(tree.path().join("src/a.rs"), "").unwrap();
        std::fs::write(tree.path().join("src/b.rs"), "").unwrap();
        std::fs::write(tree.path().join("README.md"), "").unwrap();

        assert!(f.engine.files_held_by(f.alpha, tree.path()).await.unwrap().is_empty());

        f.engine
            .reserve_files(f.alpha, &pats(&["src/*.rs"]), ReserveOptions::default())
            .await
            .unwrap();
        let held = f.engine.files_held_by(f.alpha, tree.path()).await.unwrap();
        assert_eq!(held, vec!["src/a.rs", "src/b.rs"]);
    }

    #[test]
    fn suspicious_patterns() {
        for p in ["*", "**", "**/*", "/etc/passwd", "../outside.rs", "src/../../x"] {
            assert!(is_suspicious(p), "{p}");
        }
        for p in ["src/**", "src/main.rs", "docs/*.md"] {
            assert!(!is_suspicious(p), "{p}");
        }
    }
}
