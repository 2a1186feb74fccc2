//! In-memory mailbox routing core
//!
//! Keeps a set of accounts, each with a folder tree rooted at `inbox` and
//! `sent` and a priority-ordered table of routing rules. Incoming mail
//! lands in the root inbox and is filed into sub-folders by the first
//! matching rule.
//!
//! [`MailboxService`] is the entry point:
//!
//! ```
//! use mailbox_router::MailboxService;
//!
//! let mut service = MailboxService::new();
//! service.register_account("fmi", "fmi@uni-sofia.bg")?;
//! service.register_account("pesho", "pesho@gmail.com")?;
//! service.create_folder("pesho", "/inbox/docs")?;
//! service.install_rule(
//!     "pesho",
//!     "/inbox/docs",
//!     "subject-includes: Halls\nfrom: fmi@uni-sofia.bg",
//!     1,
//! )?;
//!
//! service.send_mail(
//!     "fmi",
//!     "subject: Available Halls?\nrecipients: pesho@gmail.com\nreceived: 2022-12-08 14:14",
//!     "Which halls are free on Friday?",
//! )?;
//!
//! assert_eq!(service.get_mails_from_folder("pesho", "/inbox/docs")?.len(), 1);
//! assert!(service.get_mails_from_folder("pesho", "/inbox")?.is_empty());
//! # Ok::<(), mailbox_router::Error>(())
//! ```

mod account;
mod config;
mod error;
mod folder;
mod mail;
mod parse;
mod routing;
mod rule;
mod rules;
mod service;

pub use account::{Account, AccountRegistry};
pub use config::{DEFAULT_MAX_RULE_PRIORITY, DEFAULT_RECEIVED_FORMAT, RouterConfig};
pub use error::{Error, Result};
pub use folder::{Folder, FolderId, FolderTree, INBOX, SENT};
pub use mail::Mail;
pub use parse::{MailMetadata, parse_rule_definition};
pub use routing::sweep;
pub use rule::{Rule, RuleCriteria};
pub use rules::RuleTable;
pub use service::MailboxService;
