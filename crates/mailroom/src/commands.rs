// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordinator-backed subcommands. Every command prints one JSON document.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;

use mailroom_coord::{Coordinator, ReserveOptions, SendMessageInput};
use mailroom_core::{AgentId, MailroomError, Project};
use mailroom_storage::{InboxQuery, NewAgent};

use crate::cli::{AgentCommand, Commands, LinkCommand, ProjectArg, ProjectCommand, SendArgs};

/// Pretty-print a value to stdout.
fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), MailroomError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| MailroomError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

async fn project(coord: &Coordinator, scope: &ProjectArg) -> Result<Project, MailroomError> {
    coord.project_by_slug(&scope.project).await
}

async fn agent_id(coord: &Coordinator, scope: &ProjectArg, name: &str) -> Result<AgentId, MailroomError> {
    let project = project(coord, scope).await?;
    Ok(coord.agent_by_name(project.id, name).await?.id)
}

async fn agent_ids(
    coord: &Coordinator,
    scope: &ProjectArg,
    names: &[String],
) -> Result<Vec<AgentId>, MailroomError> {
    let project = project(coord, scope).await?;
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(coord.agent_by_name(project.id, name).await?.id);
    }
    Ok(ids)
}

/// Run one subcommand against an open coordinator.
pub async fn execute(coord: &Coordinator, command: Commands) -> Result<(), MailroomError> {
    match command {
        Commands::Init => emit(&json!({
            "database": coord.config().storage.database_path,
            "status": "ready",
        })),
        Commands::Project(cmd) => project_command(coord, cmd).await,
        Commands::Agent(cmd) => agent_command(coord, cmd).await,
        Commands::Reserve {
            scope,
            agent,
            patterns,
            shared,
            ttl,
            reason,
        } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let options = ReserveOptions {
                exclusive: !shared,
                reason,
                ttl_seconds: ttl,
            };
            let granted = coord.lease().reserve_files(agent_id, &patterns, options).await?;
            emit(&granted)
        }
        Commands::Release { ids } => {
            let released = coord.lease().release_reservations(&ids).await?;
            emit(&json!({ "released": released }))
        }
        Commands::ReleaseAll { scope, agent } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let released = coord.lease().release_all_for_agent(agent_id).await?;
            emit(&json!({ "released": released }))
        }
        Commands::ForceRelease { id } => {
            let released = coord.lease().force_release(id).await?;
            emit(&json!({ "released": released }))
        }
        Commands::Renew { ids, ttl } => {
            let renewed = coord.lease().renew_reservations(&ids, ttl).await?;
            emit(&json!({ "renewed": renewed }))
        }
        Commands::Expire => {
            let expired = coord.lease().expire_stale_reservations().await?;
            emit(&json!({ "expired": expired }))
        }
        Commands::Reservations { scope, agent, all } => {
            let project = project(coord, &scope).await?;
            let agent_id = match agent {
                Some(name) => Some(coord.agent_by_name(project.id, &name).await?.id),
                None => None,
            };
            let rows = coord.lease().list_reservations(project.id, agent_id, !all).await?;
            emit(&rows)
        }
        Commands::Check {
            scope,
            paths,
            excluding,
        } => {
            let project = project(coord, &scope).await?;
            let excluding = match excluding {
                Some(name) => Some(coord.agent_by_name(project.id, &name).await?.id),
                None => None,
            };
            let conflicts = coord
                .lease()
                .check_reservation_conflicts(project.id, &paths, excluding)
                .await?;
            emit(&conflicts)
        }
        Commands::Held { scope, agent, root } => {
            let project = project(coord, &scope).await?;
            let agent_id = coord.agent_by_name(project.id, &agent).await?.id;
            let root = root.unwrap_or_else(|| PathBuf::from(&project.human_key));
            let files = coord.lease().files_held_by(agent_id, &root).await?;
            emit(&files)
        }
        Commands::Link(cmd) => link_command(coord, cmd).await,
        Commands::CanSend { scope, from, to } => {
            let sender = agent_id(coord, &scope, &from).await?;
            let recipient = agent_id(coord, &scope, &to).await?;
            let decision = coord.admission().can_send(sender, recipient).await?;
            emit(&decision)
        }
        Commands::Send(args) => send(coord, args).await,
        Commands::Reply {
            scope,
            from,
            message_id,
            body,
        } => {
            let sender = agent_id(coord, &scope, &from).await?;
            let reply = coord
                .dispatcher()
                .reply_message(message_id, sender, &body)
                .await?;
            emit(&reply)
        }
        Commands::Inbox {
            scope,
            agent,
            limit,
            unread,
        } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let query = InboxQuery {
                limit,
                unread_only: unread,
                since: None,
            };
            let entries = coord.dispatcher().fetch_inbox(agent_id, query).await?;
            emit(&entries)
        }
        Commands::Read {
            scope,
            agent,
            message_id,
        } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let changed = coord.dispatcher().mark_read(message_id, agent_id).await?;
            emit(&json!({ "updated": changed }))
        }
        Commands::Ack {
            scope,
            agent,
            message_id,
        } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let changed = coord.dispatcher().acknowledge(message_id, agent_id).await?;
            emit(&json!({ "updated": changed }))
        }
        Commands::Unread { scope, agent } => {
            let agent_id = agent_id(coord, &scope, &agent).await?;
            let unread = coord.dispatcher().count_unread(agent_id).await?;
            emit(&json!({ "unread": unread }))
        }
        Commands::Thread { thread_id } => {
            let messages = coord.dispatcher().fetch_thread(&thread_id).await?;
            emit(&messages)
        }
        Commands::Config
        | Commands::Doctor { .. }
        | Commands::Backup { .. }
        | Commands::Restore { .. } => Err(
            MailroomError::Internal("command does not run against an open coordinator".into()),
        ),
    }
}

async fn project_command(coord: &Coordinator, cmd: ProjectCommand) -> Result<(), MailroomError> {
    match cmd {
        ProjectCommand::Add { slug, human_key } => {
            let human_key = match human_key {
                Some(key) => key,
                None => std::env::current_dir()
                    .map_err(|e| MailroomError::Internal(format!("no current directory: {e}")))?
                    .display()
                    .to_string(),
            };
            emit(&coord.create_project(&slug, &human_key).await?)
        }
        ProjectCommand::List => emit(&coord.list_projects().await?),
    }
}

async fn agent_command(coord: &Coordinator, cmd: AgentCommand) -> Result<(), MailroomError> {
    match cmd {
        AgentCommand::Register {
            scope,
            name,
            program,
            model,
            policy,
        } => {
            let project = project(coord, &scope).await?;
            let agent = coord
                .register_agent(NewAgent {
                    project_id: project.id,
                    name,
                    program,
                    model,
                    contact_policy: policy,
                })
                .await?;
            emit(&agent)
        }
        AgentCommand::List { scope } => {
            let project = project(coord, &scope).await?;
            emit(&coord.list_agents(project.id).await?)
        }
        AgentCommand::Policy {
            scope,
            name,
            policy,
        } => {
            let id = agent_id(coord, &scope, &name).await?;
            emit(&coord.set_contact_policy(id, policy).await?)
        }
    }
}

async fn link_command(coord: &Coordinator, cmd: LinkCommand) -> Result<(), MailroomError> {
    let admission = coord.admission();
    match cmd {
        LinkCommand::Request { scope, from, to } => {
            let requester = agent_id(coord, &scope, &from).await?;
            let responder = agent_id(coord, &scope, &to).await?;
            emit(&admission.request_link(requester, responder).await?)
        }
        LinkCommand::Approve { id } => emit(&json!({ "updated": admission.approve_link(id).await? })),
        LinkCommand::Block { id } => emit(&json!({ "updated": admission.block_link(id).await? })),
        LinkCommand::Unblock { id } => emit(&json!({ "updated": admission.unblock_link(id).await? })),
        LinkCommand::Delete { id } => emit(&json!({ "deleted": admission.delete_link(id).await? })),
        LinkCommand::List { scope, agent } => {
            let id = agent_id(coord, &scope, &agent).await?;
            emit(&admission.list_links(id).await?)
        }
    }
}

async fn send(coord: &Coordinator, args: SendArgs) -> Result<(), MailroomError> {
    let sender_id = agent_id(coord, &args.scope, &args.from).await?;
    let input = SendMessageInput {
        sender_id,
        to: agent_ids(coord, &args.scope, &args.to).await?,
        cc: agent_ids(coord, &args.scope, &args.cc).await?,
        bcc: agent_ids(coord, &args.scope, &args.bcc).await?,
        subject: args.subject,
        body: args.body,
        importance: args.importance,
        ack_required: args.ack,
        thread_id: args.thread,
    };

    if args.enforce || coord.enforce_contact_policy() {
        let outcome = coord.dispatcher().send_message_with_policy_check(input).await?;
        emit(&outcome)
    } else {
        let envelope = coord.dispatcher().send_message(input, false).await?;
        emit(&envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mailroom_config::model::MailroomConfig;
    use mailroom_storage::Database;

    use crate::cli::Cli;

    async fn coordinator() -> Coordinator {
        let db = Database::open_in_memory().await.unwrap();
        Coordinator::with_database(MailroomConfig::default(), db).unwrap()
    }

    async fn run(coord: &Coordinator, args: &[&str]) -> Result<(), MailroomError> {
        let mut argv = vec!["mailroom"];
        argv.extend_from_slice(args);
        execute(coord, Cli::parse_from(argv).command).await
    }

    #[tokio::test]
    async fn project_agent_and_reserve_flow() {
        let coord = coordinator().await;
        run(&coord, &["project", "add", "demo", "--human-key", "/tmp/demo"]).await.unwrap();
        run(&coord, &["agent", "register", "-p", "demo", "BlueLake", "--program", "codex"])
            .await
            .unwrap();
        run(&coord, &["agent", "register", "-p", "demo", "RedFox", "--program", "codex"])
            .await
            .unwrap();
        run(&coord, &["reserve", "-p", "demo", "-a", "BlueLake", "src/**"]).await.unwrap();

        let err = run(&coord, &["reserve", "-p", "demo", "-a", "RedFox", "src/lib.rs"])
            .await
            .unwrap_err();
        assert!(matches!(err, MailroomError::ReservationConflict { .. }));

        run(&coord, &["reserve", "-p", "demo", "-a", "RedFox", "--shared", "src/lib.rs"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found() {
        let coord = coordinator().await;
        run(&coord, &["project", "add", "demo", "--human-key", "/tmp/demo"]).await.unwrap();
        let err = run(&coord, &["unread", "-p", "demo", "Nobody"]).await.unwrap_err();
        assert!(matches!(err, MailroomError::NotFound { entity: "agent", .. }));
    }

    #[tokio::test]
    async fn send_then_read_updates_unread_count() {
        let coord = coordinator().await;
        run(&coord, &["project", "add", "demo", "--human-key", "/tmp/demo"]).await.unwrap();
        for name in ["A", "B"] {
            run(&coord, &["agent", "register", "-p", "demo", name, "--program", "p1"])
                .await
                .unwrap();
        }
        run(
            &coord,
            &["send", "-p", "demo", "--from", "A", "--to", "B", "--subject", "s", "--body", "b"],
        )
        .await
        .unwrap();

        let project = coord.project_by_slug("demo").await.unwrap();
        let b = coord.agent_by_name(project.id, "B").await.unwrap();
        assert_eq!(coord.dispatcher().count_unread(b.id).await.unwrap(), 1);

        let inbox = coord
            .dispatcher()
            .fetch_inbox(b.id, InboxQuery::default())
            .await
            .unwrap();
        let id = inbox[0].message.id.to_string();
        run(&coord, &["read", "-p", "demo", "B", &id]).await.unwrap();
        assert_eq!(coord.dispatcher().count_unread(b.id).await.unwrap(), 0);
    }
}
