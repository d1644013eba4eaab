//! Listener registry and change fan-out.

use crate::error::{Result, StoreError};
use crate::path::Path;
use crate::snapshot::Differ;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::thread;

use super::types::{Listener, ListenerError, Notification, StateSide};

/// Result of evaluating one listener after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Unchanged,
    Delivered,
    Dropped,
}

/// Counts of a single fan-out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub delivered: usize,
    pub dropped: usize,
    pub unchanged: usize,
}

impl FanOut {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Delivered => self.delivered += 1,
            Outcome::Dropped => self.dropped += 1,
        }
    }
}

/// One registered path with its channel.
struct Entry {
    path: Path,
    label: String,
    sender: Sender<Notification>,
    /// Kept so re-registration can hand out the same channel.
    receiver: Receiver<Notification>,
}

impl Entry {
    /// Compare the addressed part of both documents and notify on change.
    fn evaluate(&self, old: &Value, new: &Value, differ: Differ) -> Outcome {
        let (before, after) = if self.path.is_root() {
            (Cow::Borrowed(old), Cow::Borrowed(new))
        } else {
            let before = match self.path.resolve(old) {
                Ok(v) => v,
                Err(source) => return self.fail(StateSide::Old, source),
            };
            let after = match self.path.resolve(new) {
                Ok(v) => v,
                Err(source) => return self.fail(StateSide::New, source),
            };
            (Cow::Owned(before), Cow::Owned(after))
        };

        if !differ.has_changes(&before, &after) {
            return Outcome::Unchanged;
        }
        self.offer(Notification::changed(self.label.clone(), after.into_owned()))
    }

    fn fail(&self, side: StateSide, source: crate::path::ResolveError) -> Outcome {
        self.offer(Notification::failed(ListenerError::Unresolved {
            path: self.label.clone(),
            side,
            source,
        }))
    }

    fn unrepresentable(&self, reason: &str) -> Outcome {
        self.offer(Notification::failed(ListenerError::Unrepresentable {
            path: self.label.clone(),
            reason: reason.to_string(),
        }))
    }

    /// Non-blocking send. A full channel drops the notification.
    fn offer(&self, notification: Notification) -> Outcome {
        match self.sender.try_send(notification) {
            Ok(()) => Outcome::Delivered,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                tracing::trace!(path = %self.label, "listener not ready, notification dropped");
                Outcome::Dropped
            }
        }
    }
}

/// Path-keyed listener channels.
///
/// Not internally synchronized: the store mutates it under its write lock,
/// which also spans every fan-out, so a listener can never be removed while
/// a notification to it is in flight.
pub(crate) struct ListenerRegistry {
    entries: HashMap<Path, Entry>,
    buffer_size: usize,
}

impl ListenerRegistry {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            buffer_size,
        }
    }

    /// Register a path, or return the existing channel for it.
    pub fn add(&mut self, raw: &str) -> Result<Listener> {
        let path = Path::parse(raw)?;
        let buffer_size = self.buffer_size;
        let entry = self.entries.entry(path.clone()).or_insert_with(|| {
            let (sender, receiver) = bounded(buffer_size);
            tracing::debug!(path = %path, "listener registered");
            Entry {
                label: path.to_string(),
                path,
                sender,
                receiver,
            }
        });

        Ok(Listener {
            path: entry.label.clone(),
            receiver: entry.receiver.clone(),
        })
    }

    /// Deregister a path, closing its channel.
    pub fn remove(&mut self, raw: &str) -> Result<()> {
        let path = Path::parse(raw).map_err(|_| StoreError::NotRegistered(raw.to_string()))?;
        match self.entries.remove(&path) {
            // Dropping the entry drops the only sender; receivers see a
            // disconnect once they drain what is buffered.
            Some(_) => {
                tracing::debug!(path = %path, "listener removed");
                Ok(())
            }
            None => Err(StoreError::NotRegistered(raw.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered paths in display form, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.entries.values().map(|e| e.label.clone()).collect();
        paths.sort();
        paths
    }

    /// Evaluate every listener against the two documents.
    ///
    /// Each listener runs on its own scoped thread; this returns only after
    /// all of them have finished.
    pub fn notify(&self, old: &Value, new: &Value, differ: Differ) -> FanOut {
        let mut fan_out = FanOut::default();

        if self.entries.len() <= 1 {
            for entry in self.entries.values() {
                fan_out.record(entry.evaluate(old, new, differ));
            }
            return fan_out;
        }

        thread::scope(|scope| {
            let handles: Vec<_> = self
                .entries
                .values()
                .map(|entry| scope.spawn(move || entry.evaluate(old, new, differ)))
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(outcome) => fan_out.record(outcome),
                    Err(_) => {
                        tracing::warn!("listener evaluation panicked");
                        fan_out.record(Outcome::Dropped);
                    }
                }
            }
        });

        fan_out
    }

    /// Send every listener an error notification when the mutated state
    /// could not be turned into a comparable document.
    pub fn notify_unrepresentable(&self, reason: &str) -> FanOut {
        let mut fan_out = FanOut::default();
        for entry in self.entries.values() {
            fan_out.record(entry.unrepresentable(reason));
        }
        fan_out
    }
}
