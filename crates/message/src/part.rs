//! Part - the single message unit
//!
//! A part is an opaque byte payload plus a metadata map and an advisory
//! error tag. Cloning a part is cheap: the payload is a reference-counted
//! `Bytes` and the metadata map is shared until the first write.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::response::ResponseStore;
use crate::SharedError;

#[cfg(test)]
#[path = "part_test.rs"]
mod tests;

/// Metadata mapping carried by a part.
pub type Metadata = HashMap<String, Value>;

/// A single message flowing through the pipeline.
///
/// # Copy-on-write metadata
///
/// `Clone` produces a shallow copy: the payload buffer and the metadata map
/// are shared. The first metadata write on either copy detaches its map, so
/// writes on one copy are never visible through the other.
///
/// # Error tag
///
/// The error tag marks a part as failed without removing it from the
/// stream. Downstream components may branch on it; it is how processors
/// signal "this message failed but continue".
#[derive(Clone, Debug, Default)]
pub struct Part {
    payload: Bytes,
    metadata: Option<Arc<Metadata>>,
    error: Option<SharedError>,
    response: Option<Arc<ResponseStore>>,
}

impl Part {
    /// Create a part from a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            metadata: None,
            error: None,
            response: None,
        }
    }

    /// Get the payload bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload buffer.
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Replace the payload.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
    }

    /// Payload size in bytes. Metadata is not counted.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.payload.len()
    }

    /// Look up a metadata value.
    pub fn meta_get(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Set a metadata value.
    ///
    /// Detaches the metadata map if it is shared with another copy.
    pub fn meta_set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let map = self
            .metadata
            .get_or_insert_with(|| Arc::new(Metadata::new()));
        Arc::make_mut(map).insert(key.into(), value.into());
    }

    /// Remove a metadata value. A missing key is a no-op.
    pub fn meta_delete(&mut self, key: &str) {
        if let Some(map) = self.metadata.as_mut() {
            if map.contains_key(key) {
                Arc::make_mut(map).remove(key);
            }
        }
    }

    /// Iterate over metadata entries.
    pub fn meta_iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.metadata
            .iter()
            .flat_map(|m| m.iter())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Number of metadata entries.
    pub fn meta_len(&self) -> usize {
        self.metadata.as_ref().map_or(0, |m| m.len())
    }

    /// Get the advisory error tag.
    #[inline]
    pub fn error(&self) -> Option<&SharedError> {
        self.error.as_ref()
    }

    /// Whether the part carries an error tag.
    #[inline]
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// Tag the part with an error.
    pub fn set_error<E>(&mut self, err: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(err));
    }

    /// Tag the part with an already-shared error.
    pub fn set_error_shared(&mut self, err: SharedError) {
        self.error = Some(err);
    }

    /// Clear the error tag.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The synchronous-response store attached by the input, if any.
    #[inline]
    pub fn response_store(&self) -> Option<&Arc<ResponseStore>> {
        self.response.as_ref()
    }

    /// Attach a synchronous-response store.
    ///
    /// Request/response capable inputs attach one store to every part of a
    /// request batch before dispatch.
    pub fn attach_response_store(&mut self, store: Arc<ResponseStore>) {
        self.response = Some(store);
    }
}

impl From<&str> for Part {
    fn from(s: &str) -> Self {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Part {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}
