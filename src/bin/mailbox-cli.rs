#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that replays a JSON mailbox scenario and prints folder contents

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailbox_router::{Mail, MailboxService, RouterConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailbox-cli")]
#[command(about = "Replay mailbox scenarios against an in-memory mailbox service")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run every step of a scenario and print the `show` steps
    Run {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },

    /// Run a scenario, then list the folders of one account
    Folders {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Account whose folders to list
        account: String,
    },
}

#[derive(Deserialize)]
struct Scenario {
    steps: Vec<Step>,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
enum Step {
    Register {
        name: String,
        email: String,
    },
    CreateFolder {
        account: String,
        path: String,
    },
    InstallRule {
        account: String,
        path: String,
        rule: String,
        priority: u8,
    },
    RemoveRule {
        account: String,
        path: String,
        rule: String,
        priority: u8,
    },
    Receive {
        account: String,
        metadata: String,
        content: String,
    },
    Send {
        account: String,
        metadata: String,
        content: String,
    },
    Show {
        account: String,
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = RouterConfig::from_env()?;
    let mut service = MailboxService::with_config(config)?;

    match &args.command {
        Command::Run { scenario } => {
            let shown = run_scenario(&mut service, scenario)?;
            cmd_run(&args, &shown)?;
        }
        Command::Folders { scenario, account } => {
            run_scenario(&mut service, scenario)?;
            cmd_folders(&service, &args, account)?;
        }
    }

    Ok(())
}

/// Folder listing captured by a `show` step.
struct Shown {
    account: String,
    path: String,
    mails: Vec<Mail>,
}

fn run_scenario(service: &mut MailboxService, path: &Path) -> anyhow::Result<Vec<Shown>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;

    let mut shown = Vec::new();
    for (index, step) in scenario.steps.into_iter().enumerate() {
        let number = index + 1;
        let outcome = match step {
            Step::Register { name, email } => {
                service.register_account(&name, &email).map(drop)
            }
            Step::CreateFolder { account, path } => service.create_folder(&account, &path),
            Step::InstallRule {
                account,
                path,
                rule,
                priority,
            } => service.install_rule(&account, &path, &rule, priority),
            Step::RemoveRule {
                account,
                path,
                rule,
                priority,
            } => service.remove_rule(&account, &path, &rule, priority).map(drop),
            Step::Receive {
                account,
                metadata,
                content,
            } => service.receive_mail(&account, &metadata, &content),
            Step::Send {
                account,
                metadata,
                content,
            } => service.send_mail(&account, &metadata, &content),
            Step::Show { account, path } => {
                service.get_mails_from_folder(&account, &path).map(|mails| {
                    shown.push(Shown {
                        account,
                        path,
                        mails: mails.into_iter().collect(),
                    });
                })
            }
        };
        outcome.with_context(|| format!("Step {number} failed"))?;
    }

    Ok(shown)
}

fn cmd_run(args: &Args, shown: &[Shown]) -> anyhow::Result<()> {
    if args.json {
        let listing: Vec<_> = shown
            .iter()
            .map(|s| {
                serde_json::json!({
                    "account": s.account,
                    "path": s.path,
                    "mails": s.mails,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for s in shown {
            println!("== {} {}", s.account, s.path);
            print_mail_table(&s.mails);
        }
    }

    Ok(())
}

fn cmd_folders(service: &MailboxService, args: &Args, account: &str) -> anyhow::Result<()> {
    let folders = service.folder_paths(account)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else {
        for folder in &folders {
            println!("{folder}");
        }
    }

    Ok(())
}

fn print_mail_table(mails: &[Mail]) {
    if mails.is_empty() {
        println!("No mail found.");
        return;
    }

    let header = format!("{:<17} {:<30} {}", "Received", "From", "Subject");
    println!("{header}");
    println!("{}", "-".repeat(80));

    for mail in mails {
        println!(
            "{:<17} {:<30} {}",
            mail.received_at().format("%Y-%m-%d %H:%M"),
            truncate(mail.sender().email_address(), 28),
            truncate(mail.subject(), 40),
        );
    }

    println!("\n{} mail(s)", mails.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
