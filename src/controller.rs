//! Authoritative state for the single screen: the sorted list of children,
//! the current UI mode and the dirty flag. Every intent goes through
//! `&mut self`, so mutations and the saves they trigger run strictly in call
//! order and a stale snapshot can never overwrite a newer one.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::models::{clamp_rating, Child};
use crate::storage::{Storage, StorageError};

/// Short confirmations shown at the bottom of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnackbarMessage {
    /// The list was saved and "sent".
    Sent,
    /// A child with that name is already on the list.
    Duplicate,
    /// The submitted name was empty after trimming.
    BlankName,
}

impl SnackbarMessage {
    pub fn text(self) -> &'static str {
        match self {
            SnackbarMessage::Sent => "Report sent to Santa!",
            SnackbarMessage::Duplicate => "That name is already on the list.",
            SnackbarMessage::BlankName => "A name is required.",
        }
    }
}

/// Mutually exclusive screen modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Normal,
    AddDialogOpen,
    EditMode,
    ShowingSnackbar(SnackbarMessage),
}

pub struct StateController<S: Storage> {
    storage: S,
    children: Vec<Child>,
    mode: UiMode,
    dirty: bool,
    subscribers: Vec<Sender<UiMode>>,
}

impl<S: Storage> StateController<S> {
    /// Take ownership of the storage adapter and load the persisted list.
    pub fn new(storage: S) -> Result<Self, StorageError> {
        let mut controller = Self {
            storage,
            children: Vec::new(),
            mode: UiMode::Normal,
            dirty: false,
            subscribers: Vec::new(),
        };
        controller.load_initial()?;
        Ok(controller)
    }

    /// Replace the in-memory list with whatever the storage holds. When the
    /// store carries the same name twice, the first record in load order is
    /// kept.
    pub fn load_initial(&mut self) -> Result<(), StorageError> {
        self.children = self.storage.load()?;
        self.sort();
        self.children.dedup_by(|later, kept| {
            let repeated = later.name == kept.name;
            if repeated {
                warn!(name = %later.name, rating = later.rating, "dropping repeated stored name");
            }
            repeated
        });
        self.dirty = false;
        info!(count = self.children.len(), "loaded children");
        Ok(())
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    /// True while rating changes are waiting for a send.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Receive every mode transition emitted from now on. Earlier transitions
    /// are not replayed.
    pub fn subscribe(&mut self) -> Receiver<UiMode> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn open_add_dialog(&mut self) {
        self.transition(UiMode::AddDialogOpen);
    }

    pub fn dismiss_add_dialog(&mut self) {
        self.transition(UiMode::Normal);
    }

    /// Add a child with the default rating. Blank and duplicate names leave
    /// the list untouched and show a snackbar instead.
    pub fn request_add(&mut self, name: &str) -> Result<(), StorageError> {
        let name = name.trim();
        debug!(name, "request_add");
        if name.is_empty() {
            self.transition(UiMode::ShowingSnackbar(SnackbarMessage::BlankName));
            return Ok(());
        }
        if self.contains(name) {
            self.transition(UiMode::ShowingSnackbar(SnackbarMessage::Duplicate));
            return Ok(());
        }

        let previous = self.children.clone();
        self.children.push(Child::new(name));
        self.sort();
        self.persist_or_restore(previous)?;
        self.transition(UiMode::Normal);
        Ok(())
    }

    /// Set the rating of `name`. The change stays in memory until `send` or
    /// `teardown`.
    pub fn update_rating(&mut self, name: &str, rating: f64) {
        let Some(child) = self.children.iter_mut().find(|child| child.name == name) else {
            warn!(name, "update_rating for unknown child");
            return;
        };
        child.rating = clamp_rating(rating);
        debug!(name, rating = child.rating, "update_rating");
        self.sort();
        self.dirty = true;
    }

    pub fn send(&mut self) -> Result<(), StorageError> {
        info!(count = self.children.len(), "sending report");
        self.persist()?;
        self.dirty = false;
        self.transition(UiMode::ShowingSnackbar(SnackbarMessage::Sent));
        Ok(())
    }

    /// Switch to edit mode. Ignored while the list is empty since there is
    /// nothing to edit.
    pub fn enter_edit(&mut self) {
        if self.children.is_empty() {
            debug!("enter_edit ignored on empty list");
            return;
        }
        self.transition(UiMode::EditMode);
    }

    pub fn exit_edit(&mut self) {
        self.transition(UiMode::Normal);
    }

    /// Rename `old_name` keeping its rating.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), StorageError> {
        let new_name = new_name.trim();
        if new_name == old_name {
            return Ok(());
        }
        if new_name.is_empty() {
            self.transition(UiMode::ShowingSnackbar(SnackbarMessage::BlankName));
            return Ok(());
        }
        if self.contains(new_name) {
            self.transition(UiMode::ShowingSnackbar(SnackbarMessage::Duplicate));
            return Ok(());
        }

        let previous = self.children.clone();
        let Some(child) = self
            .children
            .iter_mut()
            .find(|child| child.name == old_name)
        else {
            warn!(old_name, "rename for unknown child");
            self.transition(UiMode::Normal);
            return Ok(());
        };
        child.name = new_name.to_string();
        debug!(old_name, new_name, "renamed child");
        self.sort();
        self.persist_or_restore(previous)?;
        self.transition(UiMode::Normal);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        let previous = self.children.clone();
        self.children.retain(|child| child.name != name);
        if self.children.len() == previous.len() {
            warn!(name, "remove for unknown child");
        } else {
            debug!(name, "removed child");
            self.persist_or_restore(previous)?;
        }
        self.transition(UiMode::Normal);
        Ok(())
    }

    pub fn dismiss_snackbar(&mut self) {
        self.transition(UiMode::Normal);
    }

    /// Final save when the screen goes away, regardless of the dirty flag.
    pub fn teardown(&mut self) -> Result<(), StorageError> {
        info!(dirty = self.dirty, "teardown");
        self.persist()
    }

    fn contains(&self, name: &str) -> bool {
        self.children.iter().any(|child| child.name == name)
    }

    fn sort(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.storage.save(&self.children)
    }

    /// Save the list; if that fails, put `previous` back so a retry starts
    /// from the state the store still holds.
    fn persist_or_restore(&mut self, previous: Vec<Child>) -> Result<(), StorageError> {
        if let Err(err) = self.persist() {
            warn!(error = %err, "save failed, reverting list");
            self.children = previous;
            return Err(err);
        }
        Ok(())
    }

    fn transition(&mut self, mode: UiMode) {
        debug!(from = ?self.mode, to = ?mode, "mode transition");
        self.mode = mode;
        self.subscribers.retain(|tx| tx.send(mode).is_ok());
    }
}

#[cfg(test)]
mod tests;
