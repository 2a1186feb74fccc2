//! Error types for mailbox-router

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Folder already exists: {0}")]
    FolderAlreadyExists(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Rule already defined: {0}")]
    RuleAlreadyDefined(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject blank input, naming the offending argument.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} must not be blank")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            require_non_blank("name", "  \t"),
            Err(Error::InvalidArgument("name must not be blank".into()))
        );
        assert!(require_non_blank("name", "x").is_ok());
    }

    #[test]
    fn display_includes_context() {
        let err = Error::AccountNotFound("bob".into());
        assert_eq!(err.to_string(), "Account not found: bob");
    }
}
