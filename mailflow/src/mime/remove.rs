//! Removing body parts by identity.

use std::collections::HashSet;
use tracing::debug;

use super::message::MimeMessage;
use super::part::PartId;

/// Removes the direct children of a multipart body whose id is listed.
///
/// Returns how many parts were removed. Unknown ids and non-multipart
/// messages are left alone.
pub fn remove_parts(message: &mut MimeMessage, ids: &[PartId]) -> usize {
    let Some(children) = message.parts_mut() else {
        debug!("Message is not multipart; nothing to remove");
        return 0;
    };
    let ids: HashSet<PartId> = ids.iter().copied().collect();
    let before = children.len();
    children.retain(|part| !ids.contains(&part.id()));
    let removed = before - children.len();
    debug!(requested = ids.len(), removed, "Removed body parts");
    removed
}
