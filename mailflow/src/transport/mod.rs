//! Message stores and submission.
//!
//! Operations receive these collaborators as `Arc<dyn MailStore>` and
//! `Arc<dyn MailSender>`. Store access is scoped by [`FolderSession`],
//! which closes the folder and then the store when dropped.

mod guard;
mod info;
mod memory;
mod session;
#[cfg(feature = "smtp")]
mod smtp;

pub use guard::FolderSession;
pub use info::MessageHeadInfo;
pub use memory::{InMemoryStore, RecordingSender, SentMessage, StoredMessage};
pub use session::{MailSession, SMTP_HOST, SMTP_PORT, SMTP_STARTTLS, STORE_PROTOCOL};
#[cfg(feature = "smtp")]
pub use smtp::SmtpSender;

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;
use crate::mime::{Address, MimeMessage};

/// How a folder is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderMode {
    /// Messages can be read but not flagged.
    ReadOnly,
    /// Messages can be flagged and expunged.
    ReadWrite,
}

/// Flags that can be set on stored messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFlag {
    /// Read.
    Seen,
    /// Marked for removal on expunge.
    Deleted,
    /// Flagged for attention.
    Flagged,
    /// Replied to.
    Answered,
    /// Unfinished.
    Draft,
}

/// A message store such as a POP3 server.
pub trait MailStore: Send + Sync {
    /// Connects and authenticates.
    fn connect(
        &self,
        session: &MailSession,
        user: &str,
        password: &str,
    ) -> Result<Box<dyn StoreConnection>, TransportError>;
}

/// An authenticated store connection.
pub trait StoreConnection: Send {
    /// Opens a folder.
    fn open_folder(&mut self, name: &str, mode: FolderMode) -> Result<Box<dyn MailFolder>, TransportError>;

    /// Closes the connection.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// An open folder.
pub trait MailFolder: Send {
    /// Unique ids of the messages, in store order.
    fn uids(&mut self) -> Result<Vec<String>, TransportError>;

    /// Raw RFC 5322 bytes of one message.
    fn fetch(&mut self, uid: &str) -> Result<Vec<u8>, TransportError>;

    /// Sets a flag on one message.
    fn set_flag(&mut self, uid: &str, flag: MessageFlag) -> Result<(), TransportError>;

    /// True until [`close`](Self::close) succeeds.
    fn is_open(&self) -> bool;

    /// Closes the folder, removing `Deleted` messages when `expunge` is set.
    fn close(&mut self, expunge: bool) -> Result<(), TransportError>;
}

/// Login for submission.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Who a message is submitted to and how to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEnvelope {
    /// Envelope sender, usually the first `From` address.
    pub sender: Option<Address>,
    /// Envelope recipients.
    pub recipients: Vec<Address>,
    /// Login, or `None` for unauthenticated submission.
    pub credentials: Option<Credentials>,
}

/// Submits messages.
#[cfg_attr(test, mockall::automock)]
pub trait MailSender: Send + Sync {
    /// Sends `message` to the envelope recipients.
    fn send(&self, message: &MimeMessage, envelope: &SendEnvelope) -> Result<(), TransportError>;
}
