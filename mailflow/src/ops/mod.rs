//! Concrete mail operations.
//!
//! Each operation reads its inputs from and writes its outputs to the
//! [`ExecutionContext`](crate::context::ExecutionContext) under the names in
//! [`keys`](crate::context::keys). Store and sender operations take their
//! transport as an `Arc` at construction.

mod addresses;
mod headers;
mod message;
mod parts;
mod pop3;
mod send;

pub use addresses::{GetFrom, GetRecipients, ReplaceRecipients, SetAddRecipients, SetFrom};
pub use headers::{AddHeader, GetHeader, GetMessageId, GetSubject, SetHeader, SetSubject};
pub use message::{GetMimeMessage, GetSession};
pub use parts::{
    AddMimeBodyParts, GetMimeBodyParts, ModTextBody, RemoveMimeBodyParts, SaveAttachmentFiles,
};
pub use pop3::{Pop3DeleteMessages, Pop3FetchMessageInfo, Pop3GetMessages};
pub use send::SendMessage;
