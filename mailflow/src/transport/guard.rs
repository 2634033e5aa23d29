//! Scoped store and folder access.

use tracing::{debug, error, info};

use super::{FolderMode, MailFolder, MailSession, MailStore, StoreConnection};
use crate::errors::TransportError;

/// An open folder on a connected store.
///
/// Dropping the session closes the folder (expunging if requested) and then
/// the store, on success and error paths alike. Close failures are logged.
pub struct FolderSession {
    folder: Box<dyn MailFolder>,
    connection: Box<dyn StoreConnection>,
    expunge: bool,
}

impl FolderSession {
    /// Connects to `store` and opens `folder`.
    ///
    /// # Errors
    ///
    /// The store's [`TransportError`] if connecting or opening fails. A
    /// connection made before the failure is closed.
    pub fn open(
        store: &dyn MailStore,
        session: &MailSession,
        user: &str,
        password: &str,
        folder: &str,
        mode: FolderMode,
        expunge: bool,
    ) -> Result<Self, TransportError> {
        let mut connection = store.connect(session, user, password)?;
        info!(
            protocol = session.store_protocol(),
            user,
            folder,
            mode = ?mode,
            "Connected to mail store"
        );

        match connection.open_folder(folder, mode) {
            Ok(folder) => Ok(Self {
                folder,
                connection,
                expunge,
            }),
            Err(e) => {
                if let Err(close_err) = connection.close() {
                    error!(error = %close_err, "Error closing store");
                }
                Err(e)
            }
        }
    }

    /// The open folder.
    pub fn folder(&mut self) -> &mut dyn MailFolder {
        self.folder.as_mut()
    }
}

impl Drop for FolderSession {
    fn drop(&mut self) {
        if self.folder.is_open() {
            if let Err(e) = self.folder.close(self.expunge) {
                error!(error = %e, "Error closing folder");
            }
        }
        if let Err(e) = self.connection.close() {
            error!(error = %e, "Error closing store");
        }
        debug!(expunge = self.expunge, "Released mail store");
    }
}

impl std::fmt::Debug for FolderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderSession")
            .field("open", &self.folder.is_open())
            .field("expunge", &self.expunge)
            .finish_non_exhaustive()
    }
}
