//! Parsers for the plain-text mail metadata and rule definition blocks
//!
//! Both blocks are newline-separated `key: value` lines. Line order is not
//! significant, any key may be missing, and lines that are not recognised
//! are skipped.

use crate::error::{Error, Result};
use crate::rule::RuleCriteria;
use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::BTreeSet;
use std::fmt::Write;
use tracing::debug;

const SENDER: &str = "sender";
const SUBJECT: &str = "subject";
const RECIPIENTS: &str = "recipients";
const RECEIVED: &str = "received";

const SUBJECT_INCLUDES: &str = "subject-includes";
const SUBJECT_OR_BODY_INCLUDES: &str = "subject-or-body-includes";
const RECIPIENTS_INCLUDES: &str = "recipients-includes";
const FROM: &str = "from";

/// Values read from a mail metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMetadata {
    pub sender: String,
    pub recipients: BTreeSet<String>,
    pub subject: String,
    pub received_at: NaiveDateTime,
}

impl MailMetadata {
    /// Parse a metadata block, reading `received:` with `received_format`.
    ///
    /// A repeated key keeps its last value. Without a `received:` line the
    /// current local time, truncated to the minute, is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the `received:` value does not match
    /// `received_format`.
    pub fn parse(block: &str, received_format: &str) -> Result<Self> {
        let mut sender = String::new();
        let mut recipients = BTreeSet::new();
        let mut subject = String::new();
        let mut received_at = None;

        for (key, value) in entries(block) {
            match key {
                SENDER => value.clone_into(&mut sender),
                SUBJECT => value.clone_into(&mut subject),
                RECIPIENTS => recipients = split_recipients(value),
                RECEIVED => {
                    let parsed = NaiveDateTime::parse_from_str(value, received_format)
                        .map_err(|e| Error::Parse(format!("Invalid received '{value}': {e}")))?;
                    received_at = Some(parsed);
                }
                other => debug!("Ignoring metadata key '{}'", other),
            }
        }

        Ok(Self {
            sender,
            recipients,
            subject,
            received_at: received_at.unwrap_or_else(current_minute),
        })
    }

    /// Render back into block form; [`MailMetadata::parse`] with the same
    /// format reads it back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `received_format` cannot render a
    /// timestamp without a time zone.
    pub fn to_block(&self, received_format: &str) -> Result<String> {
        let recipients: Vec<&str> = self.recipients.iter().map(String::as_str).collect();
        let received = render_timestamp(self.received_at, received_format)?;
        Ok(format!(
            "{SENDER}: {}\n{SUBJECT}: {}\n{RECIPIENTS}: {}\n{RECEIVED}: {received}",
            self.sender,
            self.subject,
            recipients.join(", "),
        ))
    }
}

/// Format `at` with `format`, failing instead of panicking on specifiers
/// a naive timestamp cannot render (such as `%z`).
pub(crate) fn render_timestamp(at: NaiveDateTime, format: &str) -> Result<String> {
    let mut rendered = String::new();
    write!(rendered, "{}", at.format(format))
        .map_err(|_| Error::Config(format!("Invalid received format '{format}'")))?;
    Ok(rendered)
}

/// Parse a rule definition block into its matching criteria.
///
/// Keyword lists are space separated. A missing `from:` line leaves the
/// sender empty, which only matches mail whose sender email is empty.
///
/// # Errors
///
/// Returns [`Error::RuleAlreadyDefined`] if one of the rule keys appears
/// more than once.
pub fn parse_rule_definition(block: &str) -> Result<RuleCriteria> {
    let mut criteria = RuleCriteria::default();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for (key, value) in entries(block) {
        let field = match key {
            SUBJECT_INCLUDES | SUBJECT_OR_BODY_INCLUDES | RECIPIENTS_INCLUDES | FROM => key,
            other => {
                debug!("Ignoring rule key '{}'", other);
                continue;
            }
        };
        if !seen.insert(field) {
            return Err(Error::RuleAlreadyDefined(field.to_string()));
        }

        match field {
            SUBJECT_INCLUDES => criteria.subject_includes = split_keywords(value),
            SUBJECT_OR_BODY_INCLUDES => criteria.subject_or_body_includes = split_keywords(value),
            RECIPIENTS_INCLUDES => criteria.recipients_includes = split_keywords(value),
            _ => value.clone_into(&mut criteria.from),
        }
    }

    Ok(criteria)
}

/// Trimmed `(key, value)` pairs of every line that has a colon.
fn entries(block: &str) -> impl Iterator<Item = (&str, &str)> {
    block
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
}

fn split_keywords(value: &str) -> BTreeSet<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn split_recipients(value: &str) -> BTreeSet<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

fn current_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RECEIVED_FORMAT;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 12, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn metadata_full_block() {
        let block = "sender: fmi@uni-sofia.bg\n\
                     subject: Hello, MJT!\n\
                     recipients: pesho@gmail.com, gosho@gmail.com,\n\
                     received: 2022-12-20 14:14";
        let meta = MailMetadata::parse(block, DEFAULT_RECEIVED_FORMAT).unwrap();

        assert_eq!(meta.sender, "fmi@uni-sofia.bg");
        assert_eq!(meta.subject, "Hello, MJT!");
        assert_eq!(
            meta.recipients,
            BTreeSet::from(["gosho@gmail.com".to_string(), "pesho@gmail.com".to_string()])
        );
        assert_eq!(meta.received_at, at(14, 14));
    }

    #[test]
    fn metadata_order_and_unknown_lines() {
        let block = "received: 2022-12-20 09:05\n\
                     x-priority: high\n\
                     no colon here\n\
                     recipients: a@x.bg b@x.bg\n\
                     sender: z@x.bg";
        let meta = MailMetadata::parse(block, DEFAULT_RECEIVED_FORMAT).unwrap();

        assert_eq!(meta.sender, "z@x.bg");
        assert_eq!(meta.subject, "");
        assert_eq!(meta.recipients.len(), 2);
        assert_eq!(meta.received_at, at(9, 5));
    }

    #[test]
    fn metadata_bad_timestamp() {
        let err = MailMetadata::parse("received: yesterday", DEFAULT_RECEIVED_FORMAT).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn metadata_missing_timestamp_is_whole_minute() {
        let meta = MailMetadata::parse("subject: hi", DEFAULT_RECEIVED_FORMAT).unwrap();
        assert_eq!(meta.received_at.second(), 0);
        assert_eq!(meta.received_at.nanosecond(), 0);
    }

    #[test]
    fn metadata_block_rendering_reparses() {
        let meta = MailMetadata {
            sender: "a@x.bg".into(),
            recipients: BTreeSet::from(["b@x.bg".to_string(), "c@x.bg".to_string()]),
            subject: "Notes: week 3".into(),
            received_at: at(8, 30),
        };
        let block = meta.to_block(DEFAULT_RECEIVED_FORMAT).unwrap();
        assert_eq!(MailMetadata::parse(&block, DEFAULT_RECEIVED_FORMAT).unwrap(), meta);
    }

    #[test]
    fn metadata_block_with_offset_format_is_an_error() {
        let meta = MailMetadata {
            sender: "a@x.bg".into(),
            recipients: BTreeSet::new(),
            subject: "hi".into(),
            received_at: at(8, 30),
        };
        assert!(matches!(
            meta.to_block("%Y-%m-%d %H:%M %z"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rule_definition_fields() {
        let block = "subject-includes: mjt izpit 2022\n\
                     subject-or-body-includes: izpit\n\
                     recipients-includes: pesho@gmail.com gosho@gmail.com\n\
                     from: stoyo@fmi.bg";
        let criteria = parse_rule_definition(block).unwrap();

        assert_eq!(
            criteria.subject_includes,
            BTreeSet::from(["2022".to_string(), "izpit".to_string(), "mjt".to_string()])
        );
        assert_eq!(criteria.subject_or_body_includes.len(), 1);
        assert_eq!(criteria.recipients_includes.len(), 2);
        assert_eq!(criteria.from, "stoyo@fmi.bg");
    }

    #[test]
    fn rule_definition_without_from() {
        let criteria = parse_rule_definition("subject-includes: Halls").unwrap();
        assert_eq!(criteria.from, "");
    }

    #[test]
    fn rule_definition_repeated_key() {
        let block = "subject-includes: a\nfrom: x@y.z\nsubject-includes: b";
        assert_eq!(
            parse_rule_definition(block).unwrap_err(),
            Error::RuleAlreadyDefined("subject-includes".into())
        );
    }
}
