//! Routing sweeps over the root inbox
//!
//! Rules are applied one at a time in the order given. Each rule sees the
//! inbox as left by the rules before it, so a mail moved by a higher
//! priority rule is never reconsidered by a lower priority one. Only the
//! root `inbox` is scanned; mail already filed into sub-folders stays put.

use crate::folder::FolderTree;
use crate::rule::Rule;
use tracing::{debug, warn};

/// Move every inbox mail matching a rule into that rule's destination.
///
/// Returns the number of mails moved.
pub fn sweep<'a>(rules: impl IntoIterator<Item = &'a Rule>, tree: &mut FolderTree) -> usize {
    let inbox = tree.inbox_id();
    let mut moved = 0;

    for rule in rules {
        let destination = match tree.locate(rule.destination()) {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping rule for {}: {}", rule.destination(), e);
                continue;
            }
        };
        if destination == inbox {
            continue;
        }

        let matching: Vec<_> = tree
            .inbox()
            .mails()
            .iter()
            .filter(|mail| rule.matches(mail))
            .cloned()
            .collect();

        for mail in matching {
            tree.remove_mail(inbox, &mail);
            debug!("Routing '{}' to {}", mail.subject(), rule.destination());
            tree.add_mail(destination, mail);
            moved += 1;
        }
    }

    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::mail::Mail;
    use crate::rule::RuleCriteria;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn mail(from: &str, subject: &str, minute: u32) -> Mail {
        Mail::new(
            Account::unregistered(from),
            BTreeSet::new(),
            subject.to_string(),
            String::new(),
            NaiveDate::from_ymd_opt(2022, 12, 20)
                .unwrap()
                .and_hms_opt(10, minute, 0)
                .unwrap(),
        )
    }

    fn rule(keyword: &str, destination: &str) -> Rule {
        let criteria = RuleCriteria {
            subject_includes: BTreeSet::from([keyword.to_string()]),
            from: "fmi@uni-sofia.bg".to_string(),
            ..RuleCriteria::default()
        };
        Rule::new(criteria, destination).unwrap()
    }

    fn tree_with(paths: &[&str]) -> FolderTree {
        let mut tree = FolderTree::new();
        for path in paths {
            tree.create_path(path).unwrap();
        }
        tree
    }

    #[test]
    fn matching_mail_leaves_inbox() {
        let mut tree = tree_with(&["/inbox/docs"]);
        let inbox = tree.inbox_id();
        tree.add_mail(inbox, mail("fmi@uni-sofia.bg", "Available Halls?", 0));
        tree.add_mail(inbox, mail("fmi@uni-sofia.bg", "Lunch", 1));

        let moved = sweep([&rule("Halls", "/inbox/docs")], &mut tree);

        assert_eq!(moved, 1);
        assert_eq!(tree.inbox().mails().len(), 1);
        let docs = tree.folder_by_path("/inbox/docs").unwrap();
        assert_eq!(docs.mails().len(), 1);
        assert_eq!(docs.mails().first().unwrap().subject(), "Available Halls?");
    }

    #[test]
    fn first_rule_wins() {
        let mut tree = tree_with(&["/inbox/first", "/inbox/second"]);
        let inbox = tree.inbox_id();
        tree.add_mail(inbox, mail("fmi@uni-sofia.bg", "exam results", 0));

        let rules = [rule("exam", "/inbox/first"), rule("results", "/inbox/second")];
        let moved = sweep(&rules, &mut tree);

        assert_eq!(moved, 1);
        assert_eq!(tree.folder_by_path("/inbox/first").unwrap().mails().len(), 1);
        assert!(tree.folder_by_path("/inbox/second").unwrap().mails().is_empty());
    }

    #[test]
    fn sub_folders_are_not_rescanned() {
        let mut tree = tree_with(&["/inbox/old", "/inbox/new"]);
        let old = tree.locate("/inbox/old").unwrap();
        tree.add_mail(old, mail("fmi@uni-sofia.bg", "exam", 0));

        assert_eq!(sweep([&rule("exam", "/inbox/new")], &mut tree), 0);
        assert_eq!(tree.folder(old).unwrap().mails().len(), 1);
    }

    #[test]
    fn unknown_destination_is_skipped() {
        let mut tree = FolderTree::new();
        let inbox = tree.inbox_id();
        tree.add_mail(inbox, mail("fmi@uni-sofia.bg", "exam", 0));

        assert_eq!(sweep([&rule("exam", "/inbox/gone")], &mut tree), 0);
        assert_eq!(tree.inbox().mails().len(), 1);
    }
}
