//! The mutable execution context passed through a pipeline.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::value::{ContextType, ContextValue, ValueKind};
use crate::errors::ContractViolation;
use crate::events::{EventSink, NoOpEventSink};

/// String-keyed store of tagged values for one pipeline run.
///
/// The caller owns the context exclusively; operations borrow it mutably
/// and hand the same reference back. A key either holds a value of its
/// documented kind or is absent.
#[derive(Clone)]
pub struct ExecutionContext {
    run_id: Uuid,
    values: IndexMap<String, ContextValue>,
    event_sink: Arc<dyn EventSink>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("run_id", &self.run_id)
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Creates an empty context with a fresh run id and a no-op event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            values: IndexMap::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Inserts a value, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Stores a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.values.shift_remove(key)
    }

    /// Returns true if the key holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the raw value under a key.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Returns the kind of the value under a key.
    #[must_use]
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        self.values.get(key).map(ContextValue::kind)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed read of a required key.
    ///
    /// # Errors
    ///
    /// `missing` when absent, `wrong_type` when the stored kind differs.
    pub fn get<T: ContextType>(&self, key: &str) -> Result<&T, ContractViolation> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ContractViolation::missing(key))?;
        T::from_value(value).ok_or_else(|| ContractViolation::wrong_type(key, T::KIND, value.kind()))
    }

    /// Typed read of an optional key.
    ///
    /// # Errors
    ///
    /// `wrong_type` when the key is present with another kind.
    pub fn get_opt<T: ContextType>(&self, key: &str) -> Result<Option<&T>, ContractViolation> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .ok_or_else(|| ContractViolation::wrong_type(key, T::KIND, value.kind())),
        }
    }

    /// Typed mutable access to a required key.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<T: ContextType>(&mut self, key: &str) -> Result<&mut T, ContractViolation> {
        let value = self
            .values
            .get_mut(key)
            .ok_or_else(|| ContractViolation::missing(key))?;
        let actual = value.kind();
        T::from_value_mut(value).ok_or_else(|| ContractViolation::wrong_type(key, T::KIND, actual))
    }

    /// Emits an event tagged with the run id.
    pub fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));
        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert("run_id".to_string(), serde_json::json!(self.run_id.to_string()));
        }
        self.event_sink.try_emit(event_type, Some(enriched));
    }

    /// Short JSON view of every key, for logs.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.summary()))
            .collect();
        serde_json::Value::Object(map)
    }
}
