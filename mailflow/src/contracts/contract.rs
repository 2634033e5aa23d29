//! Declared inputs and outputs of an operation.

use serde::{Deserialize, Serialize};

use crate::context::{ExecutionContext, ValueKind};
use crate::errors::{ContractViolation, MailflowError};

/// One declared key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Context key.
    pub key: String,
    /// Expected kind.
    pub kind: ValueKind,
    /// Documented default for optional keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// For outputs: whether the key is always written on success.
    #[serde(default)]
    pub guaranteed: bool,
}

impl KeySpec {
    fn new(key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            kind,
            default: None,
            guaranteed: false,
        }
    }
}

/// Required, optional and output keys of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Keys that must be present with the given kind.
    #[serde(default)]
    pub required: Vec<KeySpec>,
    /// Keys that may be present; if so they must have the given kind.
    #[serde(default)]
    pub optional: Vec<KeySpec>,
    /// Keys the operation writes.
    #[serde(default)]
    pub outputs: Vec<KeySpec>,
}

impl Contract {
    /// Creates an empty contract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required key.
    #[must_use]
    pub fn require(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.required.push(KeySpec::new(key, kind));
        self
    }

    /// Declares an optional key and its default.
    #[must_use]
    pub fn optional(
        mut self,
        key: impl Into<String>,
        kind: ValueKind,
        default: impl Into<String>,
    ) -> Self {
        let mut spec = KeySpec::new(key, kind);
        spec.default = Some(default.into());
        self.optional.push(spec);
        self
    }

    /// Declares an output written on every successful run.
    #[must_use]
    pub fn output(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        let mut spec = KeySpec::new(key, kind);
        spec.guaranteed = true;
        self.outputs.push(spec);
        self
    }

    /// Declares an output written only when there is something to write.
    #[must_use]
    pub fn output_if_present(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.outputs.push(KeySpec::new(key, kind));
        self
    }

    /// Keys guaranteed present after a successful run.
    pub fn guaranteed_outputs(&self) -> impl Iterator<Item = &KeySpec> {
        self.outputs.iter().filter(|s| s.guaranteed)
    }

    /// Checks required presence and kinds, then optional kinds.
    ///
    /// # Errors
    ///
    /// The first violation found, in declaration order.
    pub fn validate(&self, ctx: &ExecutionContext) -> Result<(), ContractViolation> {
        for spec in &self.required {
            match ctx.kind_of(&spec.key) {
                None => return Err(ContractViolation::missing(&spec.key)),
                Some(actual) if actual != spec.kind => {
                    return Err(ContractViolation::wrong_type(&spec.key, spec.kind, actual))
                }
                Some(_) => {}
            }
        }
        for spec in &self.optional {
            if let Some(actual) = ctx.kind_of(&spec.key) {
                if actual != spec.kind {
                    return Err(ContractViolation::wrong_type(&spec.key, spec.kind, actual));
                }
            }
        }
        Ok(())
    }

    /// Verifies that every guaranteed output was written.
    ///
    /// # Errors
    ///
    /// [`MailflowError::Internal`] naming the first missing or mistyped key.
    pub fn verify_outputs(&self, operation: &str, ctx: &ExecutionContext) -> Result<(), MailflowError> {
        for spec in self.guaranteed_outputs() {
            match ctx.kind_of(&spec.key) {
                Some(kind) if kind == spec.kind => {}
                Some(kind) => {
                    return Err(MailflowError::Internal(format!(
                        "{operation} wrote {} as {kind}, declared {}",
                        spec.key, spec.kind
                    )))
                }
                None => {
                    return Err(MailflowError::Internal(format!(
                        "{operation} did not write guaranteed output {}",
                        spec.key
                    )))
                }
            }
        }
        Ok(())
    }

    /// JSON rendering for documentation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::keys;

    fn subject_contract() -> Contract {
        Contract::new()
            .require(keys::MIMEMESSAGE, ValueKind::Message)
            .require(keys::SUBJECT, ValueKind::Text)
            .optional(keys::MESSAGEID_CREATE_IF_NOT_EXISTS, ValueKind::Bool, "false")
            .output(keys::MESSAGEID, ValueKind::Text)
    }

    #[test]
    fn test_validate_reports_first_missing_key() {
        let ctx = ExecutionContext::new().with(keys::SUBJECT, "x");
        let err = subject_contract().validate(&ctx).unwrap_err();

        assert!(err.is_missing());
        assert_eq!(err.key, keys::MIMEMESSAGE);
    }

    #[test]
    fn test_validate_optional_wrong_kind() {
        let ctx = ExecutionContext::new()
            .with(keys::MESSAGEID_CREATE_IF_NOT_EXISTS, "yes");
        let contract = Contract::new().optional(keys::MESSAGEID_CREATE_IF_NOT_EXISTS, ValueKind::Bool, "false");

        let err = contract.validate(&ctx).unwrap_err();
        assert!(err.is_wrong_type());
    }

    #[test]
    fn test_validate_passes_without_optional() {
        let contract = Contract::new().optional(keys::GETMESSAGES_FOLDER, ValueKind::Text, "INBOX");
        assert!(contract.validate(&ExecutionContext::new()).is_ok());
    }

    #[test]
    fn test_verify_outputs() {
        let contract = subject_contract();
        let ctx = ExecutionContext::new();

        let err = contract.verify_outputs("get_message_id", &ctx).unwrap_err();
        assert!(matches!(err, MailflowError::Internal(_)));

        let ctx = ctx.with(keys::MESSAGEID, "<id@host>");
        assert!(contract.verify_outputs("get_message_id", &ctx).is_ok());
    }

    #[test]
    fn test_conditional_outputs_not_verified() {
        let contract = Contract::new().output_if_present(keys::SUBJECT, ValueKind::Text);
        assert!(contract.verify_outputs("get_subject", &ExecutionContext::new()).is_ok());
        assert_eq!(contract.guaranteed_outputs().count(), 0);
    }

    #[test]
    fn test_to_json() {
        let json = subject_contract().to_json();
        assert_eq!(json["required"][1]["key"], keys::SUBJECT);
        assert_eq!(json["required"][1]["kind"], "text");
        assert_eq!(json["optional"][0]["default"], "false");
    }
}
