//! Mailbox service: accounts, folders, rules and mail delivery

use crate::account::{Account, AccountRegistry};
use crate::config::RouterConfig;
use crate::error::{Error, Result, require_non_blank};
use crate::folder::{FolderTree, INBOX};
use crate::mail::Mail;
use crate::parse::{MailMetadata, parse_rule_definition};
use crate::routing;
use crate::rule::Rule;
use crate::rules::RuleTable;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Folder tree and rule table of one account, created on first use.
#[derive(Debug, Default)]
struct AccountMailbox {
    folders: FolderTree,
    rules: RuleTable,
}

/// Entry point owning every account and its mailbox state.
///
/// All operations either succeed completely or leave the state as it was.
#[derive(Debug, Default)]
pub struct MailboxService {
    config: RouterConfig,
    accounts: AccountRegistry,
    mailboxes: HashMap<String, AccountMailbox>,
}

impl MailboxService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A service using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails
    /// [`RouterConfig::validate`].
    pub fn with_config(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name or email and
    /// [`Error::AccountAlreadyExists`] if the name is taken.
    pub fn register_account(&mut self, name: &str, email: &str) -> Result<Account> {
        self.accounts.register(name, email)
    }

    /// Look up a registered account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if there is no such account.
    pub fn account(&self, name: &str) -> Result<Account> {
        self.accounts.resolve(name).cloned()
    }

    /// Create a folder under the account's inbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for blank input,
    /// [`Error::AccountNotFound`], [`Error::InvalidPath`] or
    /// [`Error::FolderAlreadyExists`].
    pub fn create_folder(&mut self, account_name: &str, path: &str) -> Result<()> {
        require_non_blank("account name", account_name)?;
        require_non_blank("folder path", path)?;
        self.accounts.resolve(account_name)?;

        self.mailbox_mut(account_name).folders.create_path(path)?;
        Ok(())
    }

    /// Install a rule filing matching inbox mail into `folder_path`.
    ///
    /// Any rule already at `priority` is replaced. The new rule is applied
    /// once to the current inbox before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for blank input or a priority
    /// outside `1..=max_rule_priority`, [`Error::AccountNotFound`],
    /// [`Error::FolderNotFound`] and [`Error::RuleAlreadyDefined`] if the
    /// definition repeats a key.
    pub fn install_rule(
        &mut self,
        account_name: &str,
        folder_path: &str,
        rule_definition: &str,
        priority: u8,
    ) -> Result<()> {
        let rule = self.prepare_rule(account_name, folder_path, rule_definition, priority)?;

        let mailbox = self.mailbox_mut(account_name);
        if mailbox.rules.install(rule.clone(), priority).is_some() {
            debug!("Replaced rule at priority {} for {}", priority, account_name);
        }
        let moved = routing::sweep([&rule], &mut mailbox.folders);
        info!(
            "Installed rule for {} at priority {} -> {} ({} mail(s) moved)",
            account_name, priority, folder_path, moved
        );
        Ok(())
    }

    /// Remove the rule at `priority` if it has the given definition.
    ///
    /// Returns whether a rule was removed. Mail it already filed stays
    /// where it is.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxService::install_rule`].
    pub fn remove_rule(
        &mut self,
        account_name: &str,
        folder_path: &str,
        rule_definition: &str,
        priority: u8,
    ) -> Result<bool> {
        let rule = self.prepare_rule(account_name, folder_path, rule_definition, priority)?;

        let removed = self.mailbox_mut(account_name).rules.erase(&rule, priority);
        if removed {
            info!("Removed rule for {} at priority {}", account_name, priority);
        }
        Ok(removed)
    }

    /// Deliver a mail into the account's inbox, then apply all of its
    /// rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for blank input,
    /// [`Error::AccountNotFound`] and [`Error::Parse`] for a malformed
    /// `received:` value.
    pub fn receive_mail(
        &mut self,
        account_name: &str,
        mail_metadata: &str,
        mail_content: &str,
    ) -> Result<()> {
        require_mail_input(account_name, mail_metadata, mail_content)?;
        self.accounts.resolve(account_name)?;

        let metadata = MailMetadata::parse(mail_metadata, &self.config.received_format)?;
        let mail = self.build_mail(metadata, mail_content);

        let AccountMailbox { folders, rules } = self.mailbox_mut(account_name);
        let inbox = folders.inbox_id();
        folders.add_mail(inbox, mail);
        let moved = routing::sweep(rules.iter().map(|(_, rule)| rule), folders);
        debug!("Delivered mail to {} ({} routed)", account_name, moved);
        Ok(())
    }

    /// Send a mail from the account.
    ///
    /// The sender is always the account's own address. A copy goes to the
    /// account's `sent` folder, and every account registered under a
    /// recipient address receives it; other recipients are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxService::receive_mail`].
    pub fn send_mail(
        &mut self,
        account_name: &str,
        mail_metadata: &str,
        mail_content: &str,
    ) -> Result<()> {
        require_mail_input(account_name, mail_metadata, mail_content)?;
        let sender = self.accounts.resolve(account_name)?.clone();

        let mut metadata = MailMetadata::parse(mail_metadata, &self.config.received_format)?;
        sender.email_address().clone_into(&mut metadata.sender);

        let block = metadata.to_block(&self.config.received_format)?;
        let copy = Mail::new(
            sender.clone(),
            metadata.recipients.clone(),
            metadata.subject.clone(),
            mail_content.to_string(),
            metadata.received_at,
        );
        let folders = &mut self.mailbox_mut(account_name).folders;
        let sent = folders.sent_id();
        folders.add_mail(sent, copy);

        for address in &metadata.recipients {
            let recipients: Vec<String> = self
                .accounts
                .find_all_by_email(address)
                .map(|account| account.name().to_string())
                .collect();
            if recipients.is_empty() {
                warn!("Skipping unknown recipient {}", address);
            }
            for recipient in &recipients {
                self.receive_mail(recipient, &block, mail_content)?;
            }
        }

        info!(
            "{} sent '{}' to {} recipient(s)",
            sender.name(),
            metadata.subject,
            metadata.recipients.len()
        );
        Ok(())
    }

    /// Mail currently stored in the folder at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for blank input,
    /// [`Error::AccountNotFound`] and [`Error::FolderNotFound`] if `path`
    /// does not name a folder.
    pub fn get_mails_from_folder(&self, account_name: &str, path: &str) -> Result<BTreeSet<Mail>> {
        require_non_blank("account name", account_name)?;
        require_non_blank("folder path", path)?;
        self.accounts.resolve(account_name)?;

        let folders = self.folders(account_name);
        let id = folders
            .locate(path)
            .map_err(|_| Error::FolderNotFound(path.to_string()))?;
        Ok(folders
            .folder(id)
            .map(|folder| folder.mails().clone())
            .unwrap_or_default())
    }

    /// Every folder path of the account, roots first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if there is no such account.
    pub fn folder_paths(&self, account_name: &str) -> Result<Vec<String>> {
        self.accounts.resolve(account_name)?;
        Ok(self
            .folders(account_name)
            .paths()
            .map(str::to_string)
            .collect())
    }

    /// Installed rules in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if there is no such account.
    pub fn rules(&self, account_name: &str) -> Result<Vec<(u8, Rule)>> {
        self.accounts.resolve(account_name)?;
        Ok(self
            .mailboxes
            .get(account_name)
            .map(|mailbox| {
                mailbox
                    .rules
                    .iter()
                    .map(|(priority, rule)| (priority, rule.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    // -- private helpers --

    fn mailbox_mut(&mut self, account_name: &str) -> &mut AccountMailbox {
        self.mailboxes.entry(account_name.to_string()).or_default()
    }

    /// The account's folders, or a fresh tree if it has none yet.
    fn folders(&self, account_name: &str) -> Cow<'_, FolderTree> {
        self.mailboxes.get(account_name).map_or_else(
            || Cow::Owned(FolderTree::new()),
            |mailbox| Cow::Borrowed(&mailbox.folders),
        )
    }

    fn prepare_rule(
        &self,
        account_name: &str,
        folder_path: &str,
        rule_definition: &str,
        priority: u8,
    ) -> Result<Rule> {
        require_non_blank("account name", account_name)?;
        require_non_blank("folder path", folder_path)?;
        require_non_blank("rule definition", rule_definition)?;
        if !self.config.accepts_priority(priority) {
            return Err(Error::InvalidArgument(format!(
                "priority {priority} outside 1..={}",
                self.config.max_rule_priority
            )));
        }
        self.accounts.resolve(account_name)?;

        let folders = self.folders(account_name);
        if !folders.resolve_path(folder_path) {
            return Err(Error::FolderNotFound(folder_path.to_string()));
        }
        if !folders.is_in_inbox(folder_path) {
            return Err(Error::InvalidPath(format!(
                "{folder_path}: rules file mail under /{INBOX}"
            )));
        }

        let criteria = parse_rule_definition(rule_definition)?;
        Rule::new(criteria, folder_path)
    }

    fn build_mail(&self, metadata: MailMetadata, content: &str) -> Mail {
        let sender = self
            .accounts
            .find_by_email(&metadata.sender)
            .cloned()
            .unwrap_or_else(|| Account::unregistered(&metadata.sender));
        Mail::new(
            sender,
            metadata.recipients,
            metadata.subject,
            content.to_string(),
            metadata.received_at,
        )
    }
}

fn require_mail_input(account_name: &str, metadata: &str, content: &str) -> Result<()> {
    require_non_blank("account name", account_name)?;
    require_non_blank("mail metadata", metadata)?;
    require_non_blank("mail content", content)
}
