//! Context key namespace.
//!
//! Every operation reads and writes its values under these dotted names.

/// Parsed message (`Message`).
pub const MIMEMESSAGE: &str = "mail.mimemessage";
/// Message id (`Text`).
pub const MESSAGEID: &str = "mail.messageid";
/// Generate a message id when absent (`Bool`).
pub const MESSAGEID_CREATE_IF_NOT_EXISTS: &str = "mail.messageid.createifnotexists";
/// Subject (`Text`).
pub const SUBJECT: &str = "mail.subject";
/// Path of an RFC 5322 file (`Path`).
pub const FILE: &str = "mail.file";
/// Raw message bytes (`Bytes`).
pub const STREAM: &str = "mail.stream";
/// Header entries (`Headers` for get/set, `TextMap` for add).
pub const HEADER: &str = "mail.header";
/// Header name patterns (`TextList`).
pub const HEADER_NAMES: &str = "mail.header.names";
/// Sender addresses (`TextList` on read, `Text` on write).
pub const FROM: &str = "mail.from";
/// Recipient addresses (`TextList`).
pub const RECIPIENTS: &str = "mail.recipients";
/// Recipient types to scan (`RecipientTypes`).
pub const RECIPIENTS_TYPES: &str = "mail.recipients.types";

/// Fetched messages (`Messages`).
pub const GETMESSAGES: &str = "mail.getmessages";
/// Store user (`Text`).
pub const GETMESSAGES_USER: &str = "mail.getmessages.user";
/// Store password (`Text`).
pub const GETMESSAGES_PASSWORD: &str = "mail.getmessages.password";
/// Folder name (`Text`).
pub const GETMESSAGES_FOLDER: &str = "mail.getmessages.folder";
/// Folder open mode (`FolderMode`).
pub const GETMESSAGES_FOLDERMODE: &str = "mail.getmessages.foldermode";
/// Expunge deleted messages on close (`Bool`).
pub const GETMESSAGES_EXPUNGE: &str = "mail.getmessages.expunge";
/// Flags to set on fetched messages (`Flags`).
pub const GETMESSAGES_FLAGS: &str = "mail.getmessages.flags";
/// Restrict fetching to these uids (`TextList`).
pub const GETMESSAGES_POP3IDS: &str = "mail.getmessages.pop3ids";

/// Mail session (`Session`).
pub const SESSION: &str = "mail.session";
/// Session properties (`TextMap`).
pub const SESSION_PROPS: &str = "mail.session.props";

/// Submission user (`Text`).
pub const SENDMESSAGE_USER: &str = "mail.sendmessage.user";
/// Submission password (`Text`).
pub const SENDMESSAGE_PASSWORD: &str = "mail.sendmessage.password";
/// Explicit envelope recipients (`Addresses`).
pub const SENDMESSAGE_ADDRESSES: &str = "mail.sendmessage.addresses";

/// Find/replace mapping (`TextMap`).
pub const REPLACERECIPIENTS: &str = "mail.replacerecipients";
/// Number of replaced addresses (`Int`).
pub const REPLACERECIPIENTS_COUNT: &str = "mail.replacerecipients.count";

/// Body parts (`Parts`).
pub const MIMEBODYPARTS: &str = "mail.mimebodyparts";
/// Sources for new body parts (`PartSources`).
pub const ADDMIMEBODYPARTS: &str = "mail.addmimebodyparts";
/// Size floor in kB (`Int`).
pub const GETMIMEBODYPARTS_FILTER_SIZEGREATERTHEN: &str =
    "mail.getmimebodyparts.filter.sizegreaterthen";
/// Disposition filter (`Text`).
pub const GETMIMEBODYPARTS_FILTER_DISPO: &str = "mail.getmimebodyparts.filter.dispo";

/// Recipients to set or add (`RecipientMap`).
pub const SETADDRECIPIENTS: &str = "mail.setaddrecipients";
/// Append instead of replace (`Bool`).
pub const SETADDRECIPIENTS_ADD: &str = "mail.setaddrecipients.add";

/// Target directory for attachments (`Text`).
pub const SAVEATTACHMENTFILE_BASEDIR: &str = "mail.saveattachmentfile.basedir";
/// Written file paths (`TextList`).
pub const SAVEATTACHMENTFILE_SAVEDFILES: &str = "mail.saveattachmentfile.savedfiles";

/// Plain text override (`Text`).
pub const MODTEXTBODY_PLAIN: &str = "mail.modtextbody.plain";
/// HTML override (`Text`).
pub const MODTEXTBODY_HTML: &str = "mail.modtextbody.html";
/// Edit mode (`TextMode`).
pub const MODTEXTBODY_TYPE: &str = "mail.modtextbody.type";

/// Message summaries (`MessageInfos`).
pub const POP3FETCHMSGINFO: &str = "mail.pop3fetchmsginfo";
/// Uids to delete (`TextList`).
pub const POP3DELETEMESSAGES: &str = "mail.pop3deletemessages";
/// Number of messages flagged deleted (`Int`).
pub const POP3DELETEMESSAGES_DELCOUNT: &str = "mail.pop3deletemessages.delcount";
