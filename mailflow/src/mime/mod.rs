//! The MIME tree, its codec, and the algorithms that edit it.

mod address;
mod body_text;
mod codec;
pub mod encoding;
mod flatten;
mod header;
mod header_match;
pub mod html;
mod message;
mod part;
mod recipients;
mod remove;
mod writer;

pub use address::{format_list, Address, RecipientType};
pub use body_text::{modify_text_body, TextEdit, TextEditReport};
pub use codec::{clean_content_type, parse_message, FALLBACK_CONTENT_TYPE};
pub use flatten::{flatten_parts, PartFilter};
pub use header::{Header, HeaderList};
pub use header_match::{header_pattern, match_headers};
pub use message::MimeMessage;
pub use part::{essence, new_boundary, BodyPart, MimeNode, PartId, PartSource, TextMode, DEFAULT_CONTENT_TYPE};
pub use recipients::{replace_recipients, set_add_recipients};
pub use remove::remove_parts;
pub use writer::{write_message, WriteOptions};
