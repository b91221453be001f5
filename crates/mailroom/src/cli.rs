// SPDX-FileCopyrightText: 2026 Mailroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line surface.
//!
//! Agents are addressed by name within a project (`--project <slug>`);
//! reservations, links, and messages by their numeric ids.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mailroom_core::{ContactPolicy, Importance};

/// Mailroom - coordinate coding agents sharing one codebase.
#[derive(Parser, Debug)]
#[command(name = "mailroom", version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the standard hierarchy.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override `[storage].database_path`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Project scope shared by most agent-facing commands.
#[derive(Args, Debug, Clone)]
pub struct ProjectArg {
    /// Project slug.
    #[arg(long, short)]
    pub project: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply migrations.
    Init,
    /// Print the effective configuration as TOML.
    Config,
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage agents.
    #[command(subcommand)]
    Agent(AgentCommand),
    /// Reserve file patterns for an agent.
    Reserve {
        #[command(flatten)]
        scope: ProjectArg,
        /// Agent name.
        #[arg(long, short)]
        agent: String,
        /// Path patterns, relative to the project root.
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Take a shared (non-exclusive) reservation.
        #[arg(long)]
        shared: bool,
        /// Lifetime in seconds; defaults to `[reservations].default_ttl_seconds`.
        #[arg(long)]
        ttl: Option<i64>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Release reservations by id.
    Release {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Release every reservation an agent holds.
    ReleaseAll {
        #[command(flatten)]
        scope: ProjectArg,
        #[arg(long, short)]
        agent: String,
    },
    /// Release a reservation regardless of holder.
    ForceRelease { id: i64 },
    /// Extend reservations from now.
    Renew {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Mark every lapsed reservation as released.
    Expire,
    /// List reservations in a project.
    Reservations {
        #[command(flatten)]
        scope: ProjectArg,
        /// Only this agent's reservations.
        #[arg(long, short)]
        agent: Option<String>,
        /// Include released and expired reservations.
        #[arg(long)]
        all: bool,
    },
    /// Report active exclusive reservations covering the given paths.
    Check {
        #[command(flatten)]
        scope: ProjectArg,
        #[arg(required = true)]
        paths: Vec<String>,
        /// Ignore reservations held by this agent.
        #[arg(long)]
        excluding: Option<String>,
    },
    /// List files in the working tree covered by an agent's reservations.
    Held {
        #[command(flatten)]
        scope: ProjectArg,
        #[arg(long, short)]
        agent: String,
        /// Working tree root; defaults to the project's human key.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Manage contact links between agents.
    #[command(subcommand)]
    Link(LinkCommand),
    /// Ask whether one agent may message another.
    CanSend {
        #[command(flatten)]
        scope: ProjectArg,
        from: String,
        to: String,
    },
    /// Send a message.
    Send(SendArgs),
    /// Reply to a message.
    Reply {
        #[command(flatten)]
        scope: ProjectArg,
        /// Replying agent.
        #[arg(long)]
        from: String,
        message_id: i64,
        #[arg(long)]
        body: String,
    },
    /// List an agent's inbox, newest first.
    Inbox {
        #[command(flatten)]
        scope: ProjectArg,
        agent: String,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        unread: bool,
    },
    /// Mark a message read for an agent.
    Read {
        #[command(flatten)]
        scope: ProjectArg,
        agent: String,
        message_id: i64,
    },
    /// Acknowledge a message for an agent.
    Ack {
        #[command(flatten)]
        scope: ProjectArg,
        agent: String,
        message_id: i64,
    },
    /// Count an agent's unread messages.
    Unread {
        #[command(flatten)]
        scope: ProjectArg,
        agent: String,
    },
    /// Show every message in a thread, oldest first.
    Thread { thread_id: String },
    /// Run diagnostic checks.
    Doctor {
        /// Also run integrity checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Copy the database to a file.
    Backup { path: String },
    /// Replace the database with a backup.
    Restore { path: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project.
    Add {
        slug: String,
        /// Absolute path of the working tree; defaults to the current directory.
        #[arg(long)]
        human_key: Option<String>,
    },
    /// List projects.
    List,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    /// Register an agent in a project.
    Register {
        #[command(flatten)]
        scope: ProjectArg,
        name: String,
        /// Tooling family, e.g. `claude-code` or `codex`.
        #[arg(long)]
        program: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value_t = ContactPolicy::default())]
        policy: ContactPolicy,
    },
    /// List agents in a project.
    List {
        #[command(flatten)]
        scope: ProjectArg,
    },
    /// Change an agent's contact policy.
    Policy {
        #[command(flatten)]
        scope: ProjectArg,
        name: String,
        policy: ContactPolicy,
    },
}

#[derive(Subcommand, Debug)]
pub enum LinkCommand {
    /// Request contact from one agent to another.
    Request {
        #[command(flatten)]
        scope: ProjectArg,
        from: String,
        to: String,
    },
    /// Approve a pending link.
    Approve { id: i64 },
    /// Block a link.
    Block { id: i64 },
    /// Return a blocked link to pending.
    Unblock { id: i64 },
    /// Delete a link.
    Delete { id: i64 },
    /// List links touching an agent.
    List {
        #[command(flatten)]
        scope: ProjectArg,
        agent: String,
    },
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub scope: ProjectArg,
    /// Sending agent.
    #[arg(long)]
    pub from: String,
    /// Primary recipients, comma-separated agent names.
    #[arg(long, value_delimiter = ',')]
    pub to: Vec<String>,
    /// Copied recipients.
    #[arg(long, value_delimiter = ',')]
    pub cc: Vec<String>,
    /// Blind-copied recipients.
    #[arg(long, value_delimiter = ',')]
    pub bcc: Vec<String>,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub body: String,
    /// Defaults to `[messaging].default_importance`.
    #[arg(long)]
    pub importance: Option<Importance>,
    /// Ask recipients to acknowledge.
    #[arg(long)]
    pub ack: bool,
    /// Continue an existing thread.
    #[arg(long)]
    pub thread: Option<String>,
    /// Filter recipients through contact policy even when
    /// `[messaging].enforce_contact_policy` is off.
    #[arg(long)]
    pub enforce: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reserve_with_defaults() {
        let cli = Cli::parse_from([
            "mailroom", "reserve", "-p", "demo", "-a", "BlueLake", "src/**", "docs/*.md",
        ]);
        match cli.command {
            Commands::Reserve {
                scope,
                agent,
                patterns,
                shared,
                ttl,
                ..
            } => {
                assert_eq!(scope.project, "demo");
                assert_eq!(agent, "BlueLake");
                assert_eq!(patterns, vec!["src/**", "docs/*.md"]);
                assert!(!shared);
                assert!(ttl.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_comma_separated_recipients() {
        let cli = Cli::parse_from([
            "mailroom", "--db", "/tmp/x.db", "send", "-p", "demo", "--from", "A", "--to", "B,C",
            "--cc", "D", "--subject", "hi", "--body", "there", "--importance", "high",
        ]);
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/x.db")));
        let Commands::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.to, vec!["B", "C"]);
        assert_eq!(args.cc, vec!["D"]);
        assert_eq!(args.importance, Some(Importance::High));
        assert!(!args.enforce);
    }

    #[test]
    fn parses_contact_policy_names() {
        let cli = Cli::parse_from([
            "mailroom", "agent", "policy", "-p", "demo", "BlueLake", "contacts_only",
        ]);
        let Commands::Agent(AgentCommand::Policy { policy, .. }) = cli.command else {
            panic!("expected agent policy");
        };
        assert_eq!(policy, ContactPolicy::ContactsOnly);
    }

    #[test]
    fn rejects_unknown_policy() {
        let parsed = Cli::try_parse_from([
            "mailroom", "agent", "policy", "-p", "demo", "BlueLake", "whoever",
        ]);
        assert!(parsed.is_err());
    }
}
