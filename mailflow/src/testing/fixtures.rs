//! Sample messages.

use crate::context::{keys, ExecutionContext};
use crate::mime::MimeMessage;
use crate::transport::MailSession;

/// A single-part plain text message.
pub const SIMPLE_TEXT: &str = "From: Sender <sender@example.com>\r\n\
To: a@x.com\r\n\
Subject: Hello\r\n\
Message-ID: <simple-1@example.com>\r\n\
Date: Tue, 1 Jul 2003 10:52:37 +0200\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello";

/// RFC 2047 subject and a quoted-printable Latin-1 body.
pub const ENCODED_TEXT: &str = "From: a@x.com\r\n\
To: b@y.com\r\n\
Subject: =?UTF-8?Q?Gr=C3=BC=C3=9Fe_aus_Berlin?=\r\n\
Content-Type: text/plain; charset=ISO-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Gr=FC=DFe";

/// `multipart/mixed` holding a `multipart/alternative` and a PDF
/// attachment.
pub const NESTED_MULTIPART: &str = "From: Sender <sender@example.com>\r\n\
To: a@x.com, b@y.com\r\n\
Cc: c@z.com\r\n\
Subject: Report\r\n\
Message-ID: <nested-1@example.com>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><p>Hello</p></body></html>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQgZmFrZQ==\r\n\
--outer--\r\n";

/// Parses a fixture with an empty session.
///
/// # Panics
///
/// If `raw` does not parse.
#[allow(clippy::expect_used)]
#[must_use]
pub fn message(raw: &str) -> MimeMessage {
    MimeMessage::parse(raw.as_bytes(), MailSession::default()).expect("fixture parses")
}

/// A context holding the parsed fixture under the message key.
///
/// # Panics
///
/// If `raw` does not parse.
#[must_use]
pub fn context_with_message(raw: &str) -> ExecutionContext {
    ExecutionContext::new().with(keys::MIMEMESSAGE, message(raw))
}
