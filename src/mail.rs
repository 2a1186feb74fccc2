//! Mail records

use crate::account::Account;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// An immutable mail record.
///
/// Mails compare by value: two mails with identical fields are the same
/// mail, so storing one twice in a folder keeps a single copy. Ordering
/// is chronological first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Mail {
    received_at: NaiveDateTime,
    sender: Account,
    subject: String,
    recipients: BTreeSet<String>,
    body: String,
}

impl Mail {
    #[must_use]
    pub const fn new(
        sender: Account,
        recipients: BTreeSet<String>,
        subject: String,
        body: String,
        received_at: NaiveDateTime,
    ) -> Self {
        Self {
            received_at,
            sender,
            subject,
            recipients,
            body,
        }
    }

    #[must_use]
    pub const fn sender(&self) -> &Account {
        &self.sender
    }

    #[must_use]
    pub const fn recipients(&self) -> &BTreeSet<String> {
        &self.recipients
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub const fn received_at(&self) -> NaiveDateTime {
        self.received_at
    }
}
