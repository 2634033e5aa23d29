//! Find/replace and set/add editing of recipient headers.

use indexmap::IndexMap;
use tracing::debug;

use super::address::{Address, RecipientType};
use super::message::MimeMessage;
use crate::errors::FormatError;

/// Replaces recipients whose address contains a search string.
///
/// For each type, pairs apply in mapping order and each pair re-reads the
/// list the previous pair wrote, so replacements may cascade. Matching is a
/// case-insensitive substring test on the rendered address. Types whose
/// header is absent are skipped. Returns the total number of replacements.
///
/// # Errors
///
/// [`FormatError`] if an existing header does not parse, or a replacement
/// does not parse when its search string first matches. Lists written for
/// earlier types or pairs stay written.
pub fn replace_recipients(
    message: &mut MimeMessage,
    types: &[RecipientType],
    mapping: &IndexMap<String, String>,
) -> Result<usize, FormatError> {
    let mut pairs: Vec<(String, &String, Option<Address>)> = mapping
        .iter()
        .map(|(find, replace)| (find.to_lowercase(), replace, None))
        .collect();

    let mut count = 0;
    for &kind in types {
        if message.recipients(kind)?.is_none() {
            continue;
        }
        for (find, replace, parsed) in &mut pairs {
            let Some(mut list) = message.recipients(kind)? else {
                break;
            };
            let mut matched = 0;
            for address in &mut list {
                if !address.to_string().to_lowercase().contains(find.as_str()) {
                    continue;
                }
                if parsed.is_none() {
                    *parsed = Some(Address::parse(replace.as_str())?);
                }
                if let Some(replacement) = parsed.as_ref() {
                    *address = replacement.clone();
                    matched += 1;
                }
            }
            if matched > 0 {
                message.set_recipients(kind, &list);
                count += matched;
            }
        }
        debug!(kind = %kind, count, "Replaced recipients");
    }
    Ok(count)
}

/// Sets or appends recipients from comma-separated address lists.
///
/// With `add` the parsed addresses are appended to the existing header,
/// otherwise they replace it. An empty list with `add == false` removes the
/// header.
///
/// # Errors
///
/// [`FormatError`] if any list does not parse. Nothing is changed then.
pub fn set_add_recipients(
    message: &mut MimeMessage,
    mapping: &IndexMap<RecipientType, String>,
    add: bool,
) -> Result<(), FormatError> {
    let parsed = mapping
        .iter()
        .map(|(kind, list)| Ok((*kind, Address::parse_list(list)?)))
        .collect::<Result<Vec<_>, FormatError>>()?;

    for (kind, addresses) in parsed {
        if add {
            message.add_recipients(kind, &addresses)?;
        } else {
            message.set_recipients(kind, &addresses);
        }
        debug!(kind = %kind, count = addresses.len(), add, "Updated recipients");
    }
    Ok(())
}
