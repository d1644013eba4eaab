//! Listener handle and notification types.

use crate::error::{Result, StoreError};
use crate::path::ResolveError;
use crate::types::Timestamp;
use crossbeam_channel::Receiver;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Which side of a change a listener failed to resolve its path in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateSide {
    /// The snapshot taken before the mutation.
    Old,
    /// The state after the mutation.
    New,
}

impl fmt::Display for StateSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateSide::Old => write!(f, "old"),
            StateSide::New => write!(f, "new"),
        }
    }
}

/// Error delivered to a listener instead of a value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("path '{path}' not found in {side} state: {source}")]
    Unresolved {
        path: String,
        side: StateSide,
        #[source]
        source: ResolveError,
    },

    #[error("state for path '{path}' could not be compared: {reason}")]
    Unrepresentable { path: String, reason: String },
}

impl ListenerError {
    /// The listener path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            ListenerError::Unresolved { path, .. }
            | ListenerError::Unrepresentable { path, .. } => path,
        }
    }
}

/// A change observed at a listener's path.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// When the change was detected.
    pub timestamp: Timestamp,
    /// The listener's path.
    pub path: String,
    /// New value at the path. `None` for error notifications.
    pub data: Option<Value>,
    /// Set when the path could not be evaluated.
    pub error: Option<ListenerError>,
}

impl Notification {
    pub(crate) fn changed(path: String, data: Value) -> Self {
        Self {
            timestamp: Timestamp::now(),
            path,
            data: Some(data),
            error: None,
        }
    }

    pub(crate) fn failed(error: ListenerError) -> Self {
        Self {
            timestamp: Timestamp::now(),
            path: error.path().to_string(),
            data: None,
            error: Some(error),
        }
    }

    /// Whether this notification carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Decode the new value into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(error) = &self.error {
            return Err(StoreError::invalid_path(&self.path, error.to_string()));
        }
        let data = self.data.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }
}

/// Receiving end of a path subscription.
///
/// Handles for the same path share one channel; notifications are split
/// between them rather than duplicated.
#[derive(Clone, Debug)]
pub struct Listener {
    pub(crate) path: String,
    pub(crate) receiver: Receiver<Notification>,
}

impl Listener {
    /// The subscribed path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Receive the next notification (blocking).
    ///
    /// Fails once the listener has been removed and the channel drained.
    pub fn recv(&self) -> std::result::Result<Notification, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notification (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<Notification, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> std::result::Result<Notification, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator that ends when the listener is removed.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Notification> {
        self.receiver.iter()
    }

    /// The underlying channel, for use with `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<Notification> {
        &self.receiver
    }
}
