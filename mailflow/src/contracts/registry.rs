//! Registry of operation contracts, rendered as JSON for documentation.

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Contract;
use crate::pipeline::Operation;

/// Contracts keyed by operation name, in registration order.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    entries: RwLock<IndexMap<String, Contract>>,
}

impl ContractRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the contract an operation declares. Registering a name again
    /// replaces its contract and keeps its position.
    pub fn register(&self, operation: &dyn Operation) {
        self.entries
            .write()
            .insert(operation.name().to_string(), operation.contract().clone());
    }

    /// The contract registered under `operation`.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<Contract> {
        self.entries.read().get(operation).cloned()
    }

    /// Registered operation names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Renders every contract as a JSON object keyed by operation name.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let entries = self.entries.read();
        let map = entries
            .iter()
            .map(|(name, contract)| {
                let value = serde_json::to_value(contract).unwrap_or(serde_json::Value::Null);
                (name.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// Returns the number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
