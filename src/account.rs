//! Accounts and the account registry
//!
//! An [`Account`] is identified by its name alone: two accounts with the
//! same name and different email addresses compare equal. The registry
//! enforces that at most one account exists per name.

use crate::error::{Error, Result, require_non_blank};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use tracing::info;

/// A registered mail identity.
///
/// Equality, ordering and hashing only look at [`Account::name`].
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    email_address: String,
    name: String,
}

impl Account {
    pub(crate) fn new(name: impl Into<String>, email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            name: name.into(),
        }
    }

    /// Stand-in for a sender that has no registered account; the email
    /// doubles as the name so distinct senders stay distinct.
    pub(crate) fn unregistered(email_address: &str) -> Self {
        Self::new(email_address, email_address)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email_address(&self) -> &str {
        &self.email_address
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Account {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Account {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// Set of registered accounts, keyed by name.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, Account>,
}

impl AccountRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` or `email` is blank and
    /// [`Error::AccountAlreadyExists`] if the name is taken, whatever the
    /// email of the existing account.
    pub fn register(&mut self, name: &str, email: &str) -> Result<Account> {
        require_non_blank("account name", name)?;
        require_non_blank("email address", email)?;

        if self.accounts.contains_key(name) {
            return Err(Error::AccountAlreadyExists(name.to_string()));
        }

        let account = Account::new(name, email);
        self.accounts.insert(name.to_string(), account.clone());
        info!("Registered account {} <{}>", name, email);
        Ok(account)
    }

    /// Look up an account by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if no account has that name.
    pub fn resolve(&self, name: &str) -> Result<&Account> {
        self.accounts
            .get(name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }

    /// First account (in name order) whose email is exactly `email`.
    ///
    /// Several accounts may share an address; use
    /// [`find_all_by_email`](Self::find_all_by_email) to reach all of them.
    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.find_all_by_email(email).next()
    }

    /// Every account whose email is exactly `email`, in name order.
    pub fn find_all_by_email<'a, 'e>(&'a self, email: &'e str) -> impl Iterator<Item = &'a Account> {
        self.accounts
            .values()
            .filter(move |account| account.email_address == email)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_resolve() {
        let mut registry = AccountRegistry::new();
        let account = registry.register("alice", "alice@example.com").unwrap();

        assert_eq!(account.name(), "alice");
        assert_eq!(account.email_address(), "alice@example.com");
        assert_eq!(registry.resolve("alice").unwrap(), &account);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_rejected_regardless_of_email() {
        let mut registry = AccountRegistry::new();
        registry.register("alice", "alice@example.com").unwrap();

        let err = registry.register("alice", "other@example.com").unwrap_err();
        assert_eq!(err, Error::AccountAlreadyExists("alice".into()));
        assert_eq!(
            registry.resolve("alice").unwrap().email_address(),
            "alice@example.com"
        );
    }

    #[test]
    fn blank_inputs_rejected() {
        let mut registry = AccountRegistry::new();
        assert!(matches!(
            registry.register(" ", "a@b.c"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.register("alice", ""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_account() {
        let registry = AccountRegistry::new();
        assert_eq!(
            registry.resolve("ghost").unwrap_err(),
            Error::AccountNotFound("ghost".into())
        );
    }

    #[test]
    fn equality_is_by_name_only() {
        let a = Account::new("alice", "one@example.com");
        let b = Account::new("alice", "two@example.com");
        let c = Account::new("bob", "one@example.com");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn find_by_email() {
        let mut registry = AccountRegistry::new();
        registry.register("alice", "alice@example.com").unwrap();
        registry.register("bob", "bob@example.com").unwrap();

        assert_eq!(
            registry.find_by_email("bob@example.com").map(Account::name),
            Some("bob")
        );
        assert!(registry.find_by_email("carol@example.com").is_none());
    }

    #[test]
    fn shared_email_finds_every_account() {
        let mut registry = AccountRegistry::new();
        registry.register("bob", "team@example.com").unwrap();
        registry.register("alice", "team@example.com").unwrap();
        registry.register("carol", "carol@example.com").unwrap();

        let names: Vec<&str> = registry
            .find_all_by_email("team@example.com")
            .map(Account::name)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(
            registry.find_by_email("team@example.com").map(Account::name),
            Some("alice")
        );
    }
}
