//! Deep copies of the state.

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How the store produces independent copies of its state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CloneStrategy {
    /// Use the state's `Clone` implementation.
    ///
    /// Derived `Clone` on owned data is a full deep copy. State types holding
    /// shared handles (`Arc`, `Rc`) should use a round-trip strategy instead.
    #[default]
    Derive,
    /// Serialize to MessagePack and decode into a fresh value.
    MessagePack,
    /// Serialize to JSON and decode into a fresh value.
    Json,
}

/// Produce an independent copy of `state`.
///
/// The round-trip strategies require every reachable field to survive
/// serialization; fields skipped by serde come back as their defaults, and
/// unsupported types fail with [`StoreError::CloneFailed`].
pub fn deep_clone<S>(state: &S, strategy: CloneStrategy) -> Result<S>
where
    S: Clone + Serialize + DeserializeOwned,
{
    match strategy {
        CloneStrategy::Derive => Ok(state.clone()),
        CloneStrategy::MessagePack => {
            let bytes = rmp_serde::to_vec_named(state)?;
            Ok(rmp_serde::from_slice(&bytes)?)
        }
        CloneStrategy::Json => {
            let bytes =
                serde_json::to_vec(state).map_err(|e| StoreError::CloneFailed(e.to_string()))?;
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CloneFailed(e.to_string()))
        }
    }
}

/// JSON document form of the state, used for path resolution and diffing.
///
/// A state that cannot be represented as JSON fails with
/// [`StoreError::CloneFailed`].
pub fn to_document<S: Serialize>(state: &S) -> Result<serde_json::Value> {
    serde_json::to_value(state).map_err(|e| StoreError::CloneFailed(e.to_string()))
}
