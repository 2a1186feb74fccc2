//! Per-account folder tree
//!
//! Folders live in an arena and are addressed by [`FolderId`]. Each folder
//! knows its parent and its ordered children, and an index maps every full
//! path (`/inbox/uni/exams`) to its id. Two roots always exist: `inbox`,
//! where mail is received, and `sent`, which keeps the sender's copies.
//!
//! Names only need to be unique among siblings; folders under different
//! parents may share a name.

use crate::error::{Error, Result};
use crate::mail::Mail;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Name of the receiving root folder.
pub const INBOX: &str = "inbox";

/// Name of the root folder holding sent copies.
pub const SENT: &str = "sent";

/// Index of a folder within its [`FolderTree`].
pub type FolderId = usize;

/// A named container of mail.
#[derive(Debug, Clone)]
pub struct Folder {
    name: String,
    path: String,
    parent: Option<FolderId>,
    children: Vec<FolderId>,
    mails: BTreeSet<Mail>,
}

impl Folder {
    fn new(name: &str, path: String, parent: Option<FolderId>) -> Self {
        Self {
            name: name.to_string(),
            path,
            parent,
            children: Vec::new(),
            mails: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full slash-delimited path, e.g. `/inbox/uni`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    /// Immediate children, in creation order.
    #[must_use]
    pub fn children(&self) -> &[FolderId] {
        &self.children
    }

    #[must_use]
    pub const fn mails(&self) -> &BTreeSet<Mail> {
        &self.mails
    }
}

/// The folders of one account.
#[derive(Debug, Clone)]
pub struct FolderTree {
    folders: Vec<Folder>,
    by_path: HashMap<String, FolderId>,
    inbox: FolderId,
    sent: FolderId,
}

impl Default for FolderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTree {
    /// A tree holding only the empty `inbox` and `sent` roots.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            folders: Vec::new(),
            by_path: HashMap::new(),
            inbox: 0,
            sent: 0,
        };
        tree.inbox = tree.push(INBOX, None);
        tree.sent = tree.push(SENT, None);
        tree
    }

    /// Create the folder named by the last segment of `path`.
    ///
    /// `path` must start with `/inbox/` and every segment between `inbox`
    /// and the new folder must already exist under its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the path does not start at
    /// `/inbox/`, has an empty segment, or names a missing intermediate
    /// folder; [`Error::FolderAlreadyExists`] if the folder is already
    /// there.
    pub fn create_path(&mut self, path: &str) -> Result<FolderId> {
        let segments = split_path(path)?;
        let (name, parents) = match segments.split_last() {
            Some((name, parents)) if parents.first() == Some(&INBOX) => (*name, parents),
            _ => {
                return Err(Error::InvalidPath(format!(
                    "{path}: folders are created under /{INBOX}/"
                )));
            }
        };

        let parent = self.walk(path, parents)?;
        if self.child(parent, name).is_some() {
            return Err(Error::FolderAlreadyExists(path.to_string()));
        }

        let id = self.push(name, Some(parent));
        self.folders[parent].children.push(id);
        info!("Created folder {}", self.folders[id].path);
        Ok(id)
    }

    /// Whether `path` names an existing folder.
    ///
    /// Accepts `/inbox`, `/sent` and any folder below either root.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> bool {
        self.locate(path).is_ok()
    }

    /// Id of the folder at `path`, walking segment by segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for a malformed path or a missing
    /// intermediate folder and [`Error::FolderNotFound`] if only the last
    /// segment is missing.
    pub fn locate(&self, path: &str) -> Result<FolderId> {
        let segments = split_path(path)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(Error::InvalidPath(path.to_string()));
        };

        if parents.is_empty() {
            return self
                .root(name)
                .ok_or_else(|| Error::InvalidPath(format!("{path}: unknown root folder")));
        }

        let parent = self.walk(path, parents)?;
        self.child(parent, name)
            .ok_or_else(|| Error::FolderNotFound(path.to_string()))
    }

    /// Whether `path` is the inbox or a folder below it.
    #[must_use]
    pub fn is_in_inbox(&self, path: &str) -> bool {
        let Ok(mut id) = self.locate(path) else {
            return false;
        };
        while let Some(parent) = self.folders[id].parent {
            id = parent;
        }
        id == self.inbox
    }

    /// Folder at the exact full path, via the path index.
    #[must_use]
    pub fn folder_by_path(&self, path: &str) -> Option<&Folder> {
        self.by_path.get(path).map(|id| &self.folders[*id])
    }

    /// First folder, in creation order, with the given name.
    #[must_use]
    pub fn folder_by_name(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.name == name)
    }

    #[must_use]
    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id)
    }

    #[must_use]
    pub fn inbox(&self) -> &Folder {
        &self.folders[self.inbox]
    }

    #[must_use]
    pub const fn inbox_id(&self) -> FolderId {
        self.inbox
    }

    #[must_use]
    pub const fn sent_id(&self) -> FolderId {
        self.sent
    }

    /// Insert `mail` into folder `id`. Returns `false` if the folder
    /// already held an equal mail or `id` is unknown.
    pub fn add_mail(&mut self, id: FolderId, mail: Mail) -> bool {
        self.folders
            .get_mut(id)
            .is_some_and(|folder| folder.mails.insert(mail))
    }

    /// Remove `mail` from folder `id`, returning whether it was there.
    pub fn remove_mail(&mut self, id: FolderId, mail: &Mail) -> bool {
        self.folders
            .get_mut(id)
            .is_some_and(|folder| folder.mails.remove(mail))
    }

    /// Every folder path, roots first, then in creation order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().map(Folder::path)
    }

    // -- private helpers --

    fn push(&mut self, name: &str, parent: Option<FolderId>) -> FolderId {
        let path = match parent {
            Some(parent) => format!("{}/{name}", self.folders[parent].path),
            None => format!("/{name}"),
        };
        let id = self.folders.len();
        self.by_path.insert(path.clone(), id);
        self.folders.push(Folder::new(name, path, parent));
        id
    }

    fn root(&self, name: &str) -> Option<FolderId> {
        match name {
            INBOX => Some(self.inbox),
            SENT => Some(self.sent),
            _ => None,
        }
    }

    fn child(&self, parent: FolderId, name: &str) -> Option<FolderId> {
        self.folders[parent]
            .children
            .iter()
            .copied()
            .find(|id| self.folders[*id].name == name)
    }

    /// Follow `segments` from a root; each must be a child of the one
    /// before it.
    fn walk(&self, path: &str, segments: &[&str]) -> Result<FolderId> {
        let missing = |segment: &str| Error::InvalidPath(format!("{path}: no folder '{segment}'"));

        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| Error::InvalidPath(path.to_string()))?;
        let mut current = self.root(first).ok_or_else(|| missing(*first))?;

        for segment in rest {
            current = self.child(current, segment).ok_or_else(|| missing(*segment))?;
        }
        Ok(current)
    }
}

/// Split `/a/b/c` into `["a", "b", "c"]`, rejecting empty segments.
fn split_path(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path
        .strip_prefix('/')
        .ok_or_else(|| Error::InvalidPath(format!("{path}: must start with '/'")))?
        .split('/')
        .collect();

    if segments.iter().any(|segment| segment.trim().is_empty()) {
        return Err(Error::InvalidPath(format!("{path}: empty folder name")));
    }
    Ok(segments)
}
