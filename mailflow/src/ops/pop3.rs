//! Store operations: fetching, listing and deleting messages.

use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::Result;
use crate::mime::MimeMessage;
use crate::pipeline::Operation;
use crate::transport::{FolderMode, FolderSession, MailSession, MailStore, MessageFlag, MessageHeadInfo};

const DEFAULT_FOLDER: &str = "INBOX";

/// Connects with the context's session and login and opens the folder.
fn open_folder(
    store: &dyn MailStore,
    ctx: &ExecutionContext,
    mode: FolderMode,
    expunge: bool,
) -> Result<FolderSession> {
    let session = ctx.get::<MailSession>(keys::SESSION)?;
    let user = ctx.get::<String>(keys::GETMESSAGES_USER)?;
    let password = ctx.get::<String>(keys::GETMESSAGES_PASSWORD)?;
    let folder = ctx
        .get_opt::<String>(keys::GETMESSAGES_FOLDER)?
        .map_or(DEFAULT_FOLDER, String::as_str);
    Ok(FolderSession::open(store, session, user, password, folder, mode, expunge)?)
}

/// Keeps the requested uids that exist, in store order. An empty request
/// selects everything.
fn select_uids(available: Vec<String>, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available;
    }
    for uid in requested.iter().filter(|uid| !available.contains(uid)) {
        warn!(uid = %uid, "Requested message not in folder");
    }
    available
        .into_iter()
        .filter(|uid| requested.contains(uid))
        .collect()
}

fn login_contract() -> Contract {
    Contract::new()
        .require(keys::SESSION, ValueKind::Session)
        .require(keys::GETMESSAGES_USER, ValueKind::Text)
        .require(keys::GETMESSAGES_PASSWORD, ValueKind::Text)
        .optional(keys::GETMESSAGES_FOLDER, ValueKind::Text, DEFAULT_FOLDER)
}

static POP3_GET_MESSAGES: LazyLock<Contract> = LazyLock::new(|| {
    login_contract()
        .optional(keys::GETMESSAGES_FOLDERMODE, ValueKind::FolderMode, "ReadWrite")
        .optional(keys::GETMESSAGES_EXPUNGE, ValueKind::Bool, "true")
        .optional(keys::GETMESSAGES_FLAGS, ValueKind::Flags, "[]")
        .optional(keys::GETMESSAGES_POP3IDS, ValueKind::TextList, "[] (all)")
        .output(keys::GETMESSAGES, ValueKind::Messages)
});

/// Fetches and parses messages from the store into `mail.getmessages`,
/// setting the requested flags on each one first.
#[derive(Clone)]
pub struct Pop3GetMessages {
    store: Arc<dyn MailStore>,
}

impl Pop3GetMessages {
    /// Creates the operation over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MailStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for Pop3GetMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pop3GetMessages").finish_non_exhaustive()
    }
}

impl Operation for Pop3GetMessages {
    fn name(&self) -> &str {
        "pop3_get_messages"
    }

    fn contract(&self) -> &Contract {
        &POP3_GET_MESSAGES
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let mode = ctx
            .get_opt::<FolderMode>(keys::GETMESSAGES_FOLDERMODE)?
            .copied()
            .unwrap_or(FolderMode::ReadWrite);
        let expunge = ctx.get_opt::<bool>(keys::GETMESSAGES_EXPUNGE)?.copied().unwrap_or(true);
        let flags = ctx
            .get_opt::<Vec<MessageFlag>>(keys::GETMESSAGES_FLAGS)?
            .cloned()
            .unwrap_or_default();
        let requested = ctx
            .get_opt::<Vec<String>>(keys::GETMESSAGES_POP3IDS)?
            .cloned()
            .unwrap_or_default();
        let session = ctx.get::<MailSession>(keys::SESSION)?.clone();

        let mut guard = open_folder(self.store.as_ref(), ctx, mode, expunge)?;
        let folder = guard.folder();
        let uids = select_uids(folder.uids()?, &requested);

        let mut messages = Vec::with_capacity(uids.len());
        for uid in &uids {
            for flag in &flags {
                folder.set_flag(uid, *flag)?;
            }
            let bytes = folder.fetch(uid)?;
            debug!(uid = %uid, size = bytes.len(), "Fetched message");
            messages.push(MimeMessage::parse(&bytes, session.clone())?);
        }
        drop(guard);

        info!(count = messages.len(), "Retrieved messages");
        ctx.insert(keys::GETMESSAGES, messages);
        Ok(())
    }
}

static POP3_FETCH_MESSAGE_INFO: LazyLock<Contract> =
    LazyLock::new(|| login_contract().output(keys::POP3FETCHMSGINFO, ValueKind::MessageInfos));

/// Lists a summary of every message in the folder into
/// `mail.pop3fetchmsginfo`. The folder is opened read-only.
#[derive(Clone)]
pub struct Pop3FetchMessageInfo {
    store: Arc<dyn MailStore>,
}

impl Pop3FetchMessageInfo {
    /// Creates the operation over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MailStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for Pop3FetchMessageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pop3FetchMessageInfo").finish_non_exhaustive()
    }
}

impl Operation for Pop3FetchMessageInfo {
    fn name(&self) -> &str {
        "pop3_fetch_message_info"
    }

    fn contract(&self) -> &Contract {
        &POP3_FETCH_MESSAGE_INFO
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let session = ctx.get::<MailSession>(keys::SESSION)?.clone();
        let mut guard = open_folder(self.store.as_ref(), ctx, FolderMode::ReadOnly, false)?;
        let folder = guard.folder();

        let mut infos = Vec::new();
        for uid in folder.uids()? {
            let bytes = folder.fetch(&uid)?;
            let message = MimeMessage::parse(&bytes, session.clone())?;
            infos.push(MessageHeadInfo::from_message(uid, bytes.len(), &message));
        }
        drop(guard);

        info!(count = infos.len(), "Listed messages");
        ctx.insert(keys::POP3FETCHMSGINFO, infos);
        Ok(())
    }
}

static POP3_DELETE_MESSAGES: LazyLock<Contract> = LazyLock::new(|| {
    login_contract()
        .require(keys::POP3DELETEMESSAGES, ValueKind::TextList)
        .output(keys::POP3DELETEMESSAGES_DELCOUNT, ValueKind::Int)
});

/// Deletes the messages whose uids are listed in `mail.pop3deletemessages`.
///
/// The folder is always expunged on close. Uids not in the folder are
/// skipped and not counted.
#[derive(Clone)]
pub struct Pop3DeleteMessages {
    store: Arc<dyn MailStore>,
}

impl Pop3DeleteMessages {
    /// Creates the operation over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MailStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for Pop3DeleteMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pop3DeleteMessages").finish_non_exhaustive()
    }
}

impl Operation for Pop3DeleteMessages {
    fn name(&self) -> &str {
        "pop3_delete_messages"
    }

    fn contract(&self) -> &Contract {
        &POP3_DELETE_MESSAGES
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let requested = ctx.get::<Vec<String>>(keys::POP3DELETEMESSAGES)?.clone();
        if requested.is_empty() {
            ctx.insert(keys::POP3DELETEMESSAGES_DELCOUNT, 0_i64);
            return Ok(());
        }

        let mut guard = open_folder(self.store.as_ref(), ctx, FolderMode::ReadWrite, true)?;
        let folder = guard.folder();
        let uids = select_uids(folder.uids()?, &requested);
        for uid in &uids {
            folder.set_flag(uid, MessageFlag::Deleted)?;
        }
        drop(guard);

        info!(count = uids.len(), "Deleted messages");
        ctx.insert(
            keys::POP3DELETEMESSAGES_DELCOUNT,
            i64::try_from(uids.len()).unwrap_or(i64::MAX),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{MailflowError, TransportError};
    use crate::testing::{assert_missing, fixtures};
    use crate::transport::InMemoryStore;
    use pretty_assertions::assert_eq;

    fn store() -> InMemoryStore {
        InMemoryStore::new("user", "secret")
            .with_message("INBOX", "uid-1", fixtures::SIMPLE_TEXT.as_bytes().to_vec())
            .with_message("INBOX", "uid-2", fixtures::NESTED_MULTIPART.as_bytes().to_vec())
    }

    fn login() -> ExecutionContext {
        ExecutionContext::new()
            .with(keys::SESSION, MailSession::default())
            .with(keys::GETMESSAGES_USER, "user")
            .with(keys::GETMESSAGES_PASSWORD, "secret")
    }

    fn messages(ctx: &ExecutionContext) -> &Vec<MimeMessage> {
        ctx.get::<Vec<MimeMessage>>(keys::GETMESSAGES).unwrap()
    }

    #[test]
    fn test_get_all_messages() {
        let store = store();
        let mut ctx = login();
        Pop3GetMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        let subjects: Vec<_> = messages(&ctx).iter().map(MimeMessage::subject).collect();
        assert_eq!(subjects, vec![Some("Hello"), Some("Report")]);
        assert_eq!(
            store.journal(),
            vec![
                "connect user",
                "open INBOX ReadWrite",
                "close folder expunge=true",
                "close store",
            ]
        );
    }

    #[test]
    fn test_get_selected_with_flags() {
        let store = store();
        let mut ctx = login()
            .with(keys::GETMESSAGES_POP3IDS, vec!["uid-2".to_string(), "missing".to_string()])
            .with(keys::GETMESSAGES_FLAGS, vec![MessageFlag::Seen]);
        Pop3GetMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        assert_eq!(messages(&ctx).len(), 1);
        assert_eq!(messages(&ctx)[0].subject(), Some("Report"));
        assert_eq!(store.flags("INBOX", "uid-2"), vec![MessageFlag::Seen]);
        assert!(store.flags("INBOX", "uid-1").is_empty());
    }

    #[test]
    fn test_get_deleted_flag_expunges_on_close() {
        let store = store();
        let mut ctx = login().with(keys::GETMESSAGES_FLAGS, vec![MessageFlag::Deleted]);
        Pop3GetMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        assert_eq!(messages(&ctx).len(), 2);
        assert!(store.uids("INBOX").is_empty());
    }

    #[test]
    fn test_get_flags_on_read_only_fails_and_closes() {
        let store = store();
        let mut ctx = login()
            .with(keys::GETMESSAGES_FOLDERMODE, FolderMode::ReadOnly)
            .with(keys::GETMESSAGES_FLAGS, vec![MessageFlag::Seen]);

        let err = Pop3GetMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap_err();
        assert!(matches!(err, MailflowError::Transport(TransportError::Protocol(_))));
        assert!(!ctx.contains(keys::GETMESSAGES));
        assert_eq!(store.journal().last().map(String::as_str), Some("close store"));
    }

    #[test]
    fn test_get_bad_login() {
        let mut ctx = login().with(keys::GETMESSAGES_PASSWORD, "wrong");
        let err = Pop3GetMessages::new(Arc::new(store())).execute(&mut ctx).unwrap_err();
        assert!(matches!(err, MailflowError::Transport(TransportError::Authentication(_))));
    }

    #[test]
    fn test_get_requires_login() {
        let mut ctx = ExecutionContext::new().with(keys::SESSION, MailSession::default());
        let err = Pop3GetMessages::new(Arc::new(store())).execute(&mut ctx).unwrap_err();
        assert_missing(&err, keys::GETMESSAGES_USER);
    }

    #[test]
    fn test_fetch_message_info() {
        let store = store();
        let mut ctx = login();
        Pop3FetchMessageInfo::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        let infos = ctx.get::<Vec<MessageHeadInfo>>(keys::POP3FETCHMSGINFO).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].uid, "uid-1");
        assert_eq!(infos[0].subject.as_deref(), Some("Hello"));
        assert_eq!(infos[0].size, fixtures::SIMPLE_TEXT.len());
        assert_eq!(infos[1].cc, vec!["c@z.com"]);
        assert_eq!(store.journal()[1], "open INBOX ReadOnly");
        assert_eq!(store.journal()[2], "close folder expunge=false");
    }

    #[test]
    fn test_fetch_info_other_folder() {
        let store = store().with_message("Archive", "a-1", fixtures::SIMPLE_TEXT.as_bytes().to_vec());
        let mut ctx = login().with(keys::GETMESSAGES_FOLDER, "Archive");
        Pop3FetchMessageInfo::new(Arc::new(store)).execute(&mut ctx).unwrap();

        let infos = ctx.get::<Vec<MessageHeadInfo>>(keys::POP3FETCHMSGINFO).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].uid, "a-1");
    }

    #[test]
    fn test_delete_messages() {
        let store = store();
        let mut ctx = login().with(
            keys::POP3DELETEMESSAGES,
            vec!["uid-1".to_string(), "gone".to_string()],
        );
        Pop3DeleteMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        assert_eq!(ctx.get::<i64>(keys::POP3DELETEMESSAGES_DELCOUNT).unwrap(), &1);
        assert_eq!(store.uids("INBOX"), vec!["uid-2"]);
        assert!(store.journal().contains(&"close folder expunge=true".to_string()));
    }

    #[test]
    fn test_delete_nothing_skips_connect() {
        let store = store();
        let mut ctx = login().with(keys::POP3DELETEMESSAGES, Vec::<String>::new());
        Pop3DeleteMessages::new(Arc::new(store.clone())).execute(&mut ctx).unwrap();

        assert_eq!(ctx.get::<i64>(keys::POP3DELETEMESSAGES_DELCOUNT).unwrap(), &0);
        assert!(store.journal().is_empty());
    }
}
