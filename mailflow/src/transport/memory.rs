//! In-memory store and sender for tests and dry runs.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::{
    FolderMode, MailFolder, MailSender, MailSession, MailStore, MessageFlag, SendEnvelope,
    StoreConnection,
};
use crate::errors::TransportError;
use crate::mime::{write_message, MimeMessage, WriteOptions};

/// A message held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Unique id.
    pub uid: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Flags set so far.
    pub flags: Vec<MessageFlag>,
}

#[derive(Debug, Default)]
struct StoreState {
    folders: IndexMap<String, Vec<StoredMessage>>,
    journal: Vec<String>,
}

/// A single-account store kept in memory.
///
/// Clones share state. Every connect, open and close is recorded in a
/// journal so callers can check the order resources were released in.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    user: String,
    password: String,
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// A store accepting one login, with an empty `INBOX`.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        let mut state = StoreState::default();
        state.folders.insert("INBOX".to_string(), Vec::new());
        Self {
            user: user.into(),
            password: password.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Adds a message, creating the folder if needed.
    #[must_use]
    pub fn with_message(self, folder: &str, uid: &str, bytes: Vec<u8>) -> Self {
        self.add_message(folder, uid, bytes);
        self
    }

    /// Adds a message, creating the folder if needed.
    pub fn add_message(&self, folder: &str, uid: &str, bytes: Vec<u8>) {
        self.state
            .lock()
            .folders
            .entry(folder.to_string())
            .or_default()
            .push(StoredMessage {
                uid: uid.to_string(),
                bytes,
                flags: Vec::new(),
            });
    }

    /// Uids in a folder.
    #[must_use]
    pub fn uids(&self, folder: &str) -> Vec<String> {
        self.state
            .lock()
            .folders
            .get(folder)
            .map(|msgs| msgs.iter().map(|m| m.uid.clone()).collect())
            .unwrap_or_default()
    }

    /// Flags of one message.
    #[must_use]
    pub fn flags(&self, folder: &str, uid: &str) -> Vec<MessageFlag> {
        self.state
            .lock()
            .folders
            .get(folder)
            .and_then(|msgs| msgs.iter().find(|m| m.uid == uid))
            .map(|m| m.flags.clone())
            .unwrap_or_default()
    }

    /// Connect, open and close events in order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }
}

impl MailStore for InMemoryStore {
    fn connect(
        &self,
        _session: &MailSession,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn StoreConnection>, TransportError> {
        if user != self.user || password != self.password {
            return Err(TransportError::Authentication(format!(
                "login rejected for '{user}'"
            )));
        }
        self.state.lock().journal.push(format!("connect {user}"));
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryConnection {
    state: Arc<Mutex<StoreState>>,
}

impl StoreConnection for MemoryConnection {
    fn open_folder(&mut self, name: &str, mode: FolderMode) -> Result<Box<dyn MailFolder>, TransportError> {
        let mut state = self.state.lock();
        if !state.folders.contains_key(name) {
            return Err(TransportError::Protocol(format!("folder '{name}' not found")));
        }
        state.journal.push(format!("open {name} {mode:?}"));
        Ok(Box::new(MemoryFolder {
            state: Arc::clone(&self.state),
            name: name.to_string(),
            mode,
            open: true,
        }))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.state.lock().journal.push("close store".to_string());
        Ok(())
    }
}

struct MemoryFolder {
    state: Arc<Mutex<StoreState>>,
    name: String,
    mode: FolderMode,
    open: bool,
}

impl MemoryFolder {
    fn with_messages<T>(
        &self,
        f: impl FnOnce(&mut Vec<StoredMessage>) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        if !self.open {
            return Err(TransportError::Protocol(format!("folder '{}' is closed", self.name)));
        }
        let mut state = self.state.lock();
        let messages = state
            .folders
            .get_mut(&self.name)
            .ok_or_else(|| TransportError::Protocol(format!("folder '{}' vanished", self.name)))?;
        f(messages)
    }
}

impl MailFolder for MemoryFolder {
    fn uids(&mut self) -> Result<Vec<String>, TransportError> {
        self.with_messages(|msgs| Ok(msgs.iter().map(|m| m.uid.clone()).collect()))
    }

    fn fetch(&mut self, uid: &str) -> Result<Vec<u8>, TransportError> {
        self.with_messages(|msgs| {
            msgs.iter()
                .find(|m| m.uid == uid)
                .map(|m| m.bytes.clone())
                .ok_or_else(|| TransportError::Protocol(format!("no message with uid '{uid}'")))
        })
    }

    fn set_flag(&mut self, uid: &str, flag: MessageFlag) -> Result<(), TransportError> {
        if self.mode == FolderMode::ReadOnly {
            return Err(TransportError::Protocol(format!(
                "folder '{}' is read-only",
                self.name
            )));
        }
        self.with_messages(|msgs| {
            let msg = msgs
                .iter_mut()
                .find(|m| m.uid == uid)
                .ok_or_else(|| TransportError::Protocol(format!("no message with uid '{uid}'")))?;
            if !msg.flags.contains(&flag) {
                msg.flags.push(flag);
            }
            Ok(())
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self, expunge: bool) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.journal.push(format!("close folder expunge={expunge}"));
        if expunge && self.mode == FolderMode::ReadWrite {
            if let Some(msgs) = state.folders.get_mut(&self.name) {
                let before = msgs.len();
                msgs.retain(|m| !m.flags.contains(&MessageFlag::Deleted));
                debug!(folder = %self.name, removed = before - msgs.len(), "Expunged folder");
            }
        }
        self.open = false;
        Ok(())
    }
}

/// A message handed to [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Serialized message as it would go on the wire.
    pub bytes: Vec<u8>,
    /// Envelope it was sent with.
    pub envelope: SendEnvelope,
}

/// A sender that records messages instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    reject: Option<String>,
}

impl RecordingSender {
    /// A sender that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender that rejects every message with `reason`.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            reject: Some(reason.into()),
        }
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }
}

impl MailSender for RecordingSender {
    fn send(&self, message: &MimeMessage, envelope: &SendEnvelope) -> Result<(), TransportError> {
        if let Some(reason) = &self.reject {
            return Err(TransportError::Rejected(reason.clone()));
        }
        self.sent.lock().push(SentMessage {
            bytes: write_message(message, &WriteOptions::for_submission()),
            envelope: envelope.clone(),
        });
        Ok(())
    }
}
