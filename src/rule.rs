//! Routing rules and the mail match predicate

use crate::error::{Error, Result};
use crate::mail::Mail;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// The match half of a rule, as read from a rule definition block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RuleCriteria {
    /// Every keyword must occur as a whole word in the subject.
    pub subject_includes: BTreeSet<String>,
    /// Every keyword must occur as a whole word in the subject or the body.
    pub subject_or_body_includes: BTreeSet<String>,
    /// At least one address must be among the recipients.
    pub recipients_includes: BTreeSet<String>,
    /// Must equal the sender's email address exactly.
    pub from: String,
}

/// A rule: criteria bound to the path of the folder matching mail goes to.
///
/// Two rules are equal when their criteria and destination are equal.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    criteria: RuleCriteria,
    destination: String,
    #[serde(skip)]
    matcher: Matcher,
}

impl Rule {
    /// Bind `criteria` to `destination`, compiling its keyword patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a keyword cannot be compiled
    /// into a pattern.
    pub fn new(criteria: RuleCriteria, destination: impl Into<String>) -> Result<Self> {
        let matcher = Matcher {
            subject: compile_all(&criteria.subject_includes)?,
            subject_or_body: compile_all(&criteria.subject_or_body_includes)?,
        };
        Ok(Self {
            criteria,
            destination: destination.into(),
            matcher,
        })
    }

    #[must_use]
    pub const fn criteria(&self) -> &RuleCriteria {
        &self.criteria
    }

    /// Full path of the destination folder.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Whether `mail` satisfies all four checks of this rule.
    #[must_use]
    pub fn matches(&self, mail: &Mail) -> bool {
        let subject = mail.subject();
        let body = mail.body();

        self.matcher.subject.iter().all(|word| word.is_match(subject))
            && self
                .matcher
                .subject_or_body
                .iter()
                .all(|word| word.is_match(subject) || word.is_match(body))
            && (self.criteria.recipients_includes.is_empty()
                || self
                    .criteria
                    .recipients_includes
                    .iter()
                    .any(|address| mail.recipients().contains(address)))
            && self.criteria.from == mail.sender().email_address()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.criteria == other.criteria && self.destination == other.destination
    }
}

impl Eq for Rule {}

#[derive(Debug, Clone, Default)]
struct Matcher {
    subject: Vec<Regex>,
    subject_or_body: Vec<Regex>,
}

/// Whole-word, case-sensitive pattern for a literal keyword.
fn word_pattern(keyword: &str) -> Result<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
        .map_err(|e| Error::InvalidArgument(format!("Invalid keyword '{keyword}': {e}")))
}

fn compile_all(keywords: &BTreeSet<String>) -> Result<Vec<Regex>> {
    keywords.iter().map(|keyword| word_pattern(keyword)).collect()
}
