//! Main Store struct tying all components together.

use crate::error::{ModifierError, Result, StoreError};
use crate::listeners::{Listener, ListenerRegistry};
use crate::modifiers::{Modifier, ModifierRegistry};
use crate::path::{kind_of, Path};
use crate::snapshot::{deep_clone, to_document, CloneStrategy, Differ};
use crate::types::Action;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bounds a type must satisfy to be held by a [`Store`].
pub trait State: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Capacity of each listener channel. 0 delivers only to a receiver that
    /// is blocked in `recv` at the moment of the change.
    pub listener_buffer: usize,

    /// How snapshots of the state are produced.
    pub clone_strategy: CloneStrategy,

    /// Restore the pre-dispatch state when a modifier reports failure.
    pub rollback_on_failure: bool,

    /// Whether element order inside sequences counts as a change.
    pub ordered_sequences: bool,

    /// Number of parsed read paths kept for reuse.
    pub path_cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            listener_buffer: 1,
            clone_strategy: CloneStrategy::Derive,
            rollback_on_failure: true,
            ordered_sequences: true,
            path_cache_size: 128,
        }
    }
}

/// Everything guarded by the store lock.
struct Inner<S> {
    state: S,
    modifiers: ModifierRegistry<S>,
    listeners: ListenerRegistry,
}

/// Memoized read snapshot. Invalidated by every mutation.
struct CachedSnapshot<S> {
    state: Arc<S>,
    document: Option<Arc<Value>>,
}

impl<S: Serialize> CachedSnapshot<S> {
    fn document(&mut self) -> Result<Arc<Value>> {
        if let Some(doc) = &self.document {
            return Ok(Arc::clone(doc));
        }
        let doc = Arc::new(to_document(&*self.state)?);
        self.document = Some(Arc::clone(&doc));
        Ok(doc)
    }
}

/// A shared application state mutated through named modifiers.
///
/// Provides:
/// - Dispatching actions to registered modifiers
/// - Direct assignment at a path with [`Store::patch`]
/// - Cached, isolated read snapshots
/// - Path-scoped change listeners
///
/// The store is `Send + Sync`; share it with `Arc<Store<S>>`.
pub struct Store<S> {
    config: StoreConfig,

    differ: Differ,

    /// Live state and registries. Mutations hold the write lock end-to-end,
    /// including listener fan-out.
    inner: RwLock<Inner<S>>,

    /// Read snapshot. Always locked after `inner`.
    cache: Mutex<Option<CachedSnapshot<S>>>,

    /// Parsed read paths.
    paths: Mutex<LruCache<String, Arc<Path>>>,
}

impl<S: State> Store<S> {
    /// Create a store with the default configuration.
    pub fn new(initial: S) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    /// Create a store with a custom configuration.
    pub fn with_config(initial: S, config: StoreConfig) -> Self {
        let path_cache_size =
            NonZeroUsize::new(config.path_cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            differ: Differ::new().ordered_sequences(config.ordered_sequences),
            inner: RwLock::new(Inner {
                state: initial,
                modifiers: ModifierRegistry::new(),
                listeners: ListenerRegistry::new(config.listener_buffer),
            }),
            cache: Mutex::new(None),
            paths: Mutex::new(LruCache::new(path_cache_size)),
            config,
        }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- Modifiers ---

    /// Register a modifier that takes a payload.
    ///
    /// The action payload is decoded into `P` at dispatch time.
    ///
    /// ```
    /// use statehub::{Action, ModifierResult, Store};
    ///
    /// let store = Store::new(40u32);
    /// store
    ///     .add_modifier("ADD", |age: &mut u32, n: u32| -> ModifierResult {
    ///         *age += n;
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// store.dispatch(Action::with_payload("ADD", 10)).unwrap();
    /// assert_eq!(*store.get_state().unwrap(), 50);
    /// ```
    pub fn add_modifier<P, F, E>(&self, action: &str, modifier: F) -> Result<()>
    where
        P: DeserializeOwned + 'static,
        F: Fn(&mut S, P) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<ModifierError>,
    {
        self.inner
            .write()
            .modifiers
            .register(action, Modifier::with_payload(modifier))
    }

    /// Register a modifier that takes no payload.
    pub fn add_unit_modifier<F, E>(&self, action: &str, modifier: F) -> Result<()>
    where
        F: Fn(&mut S) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<ModifierError>,
    {
        self.inner
            .write()
            .modifiers
            .register(action, Modifier::unit(modifier))
    }

    /// Whether a modifier is registered for the action.
    pub fn has_modifier(&self, action: &str) -> bool {
        self.inner.read().modifiers.contains(action)
    }

    /// Number of registered modifiers.
    pub fn modifier_count(&self) -> usize {
        self.inner.read().modifiers.len()
    }

    // --- Listeners ---

    /// Subscribe to changes at a path.
    ///
    /// Returns a handle on the existing channel if the path is already
    /// subscribed. The path is not checked against the current state; a path
    /// that does not resolve produces error notifications instead.
    pub fn add_listener(&self, path: &str) -> Result<Listener> {
        self.inner.write().listeners.add(path)
    }

    /// Remove the listener for a path and close its channel.
    pub fn remove_listener(&self, path: &str) -> Result<()> {
        self.inner.write().listeners.remove(path)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.read().listeners.len()
    }

    /// Registered listener paths, sorted.
    pub fn listener_paths(&self) -> Vec<String> {
        self.inner.read().listeners.paths()
    }

    // --- Mutation ---

    /// Apply an action through its registered modifier.
    ///
    /// Runs under the exclusive lock. Listeners are evaluated before this
    /// returns. A modifier failure is returned as
    /// [`StoreError::ModifierFailed`]; depending on
    /// [`StoreConfig::rollback_on_failure`] the state is restored first or
    /// keeps whatever the modifier changed before failing.
    ///
    /// When listeners are registered the mutated state must also convert to
    /// a JSON document for comparison. If it does not, the state is restored
    /// and [`StoreError::CloneFailed`] returned; without rollback the change
    /// is kept and every listener receives an error notification instead.
    pub fn dispatch(&self, action: Action) -> Result<()> {
        let Action { name, payload } = action;

        let mut guard = self.inner.write();
        let Inner {
            state,
            modifiers,
            listeners,
        } = &mut *guard;

        let modifier = modifiers
            .get(&name)
            .ok_or_else(|| StoreError::ActionNotFound(name.clone()))?;
        let call = modifier.prepare(&name, payload)?;

        let mut checkpoint = if self.config.rollback_on_failure {
            Some(deep_clone(&*state, self.config.clone_strategy)?)
        } else {
            None
        };
        let before = if listeners.is_empty() {
            None
        } else {
            Some(to_document(&*state)?)
        };

        let outcome = match call(state) {
            Ok(()) => Ok(()),
            Err(source) => {
                if let Some(checkpoint) = checkpoint.take() {
                    tracing::warn!(action = %name, error = %source, "modifier failed, state restored");
                    *state = checkpoint;
                } else {
                    tracing::warn!(action = %name, error = %source, "modifier failed, partial changes kept");
                }
                Err(StoreError::ModifierFailed {
                    action: name.clone(),
                    source,
                })
            }
        };

        self.invalidate_cache();

        let Some(before) = before else {
            tracing::debug!(action = %name, "dispatched");
            return outcome;
        };

        match to_document(&*state) {
            Ok(after) => {
                self.trace_changes(&before, &after);
                let fan_out = listeners.notify(&before, &after, self.differ);
                tracing::debug!(
                    action = %name,
                    delivered = fan_out.delivered,
                    dropped = fan_out.dropped,
                    unchanged = fan_out.unchanged,
                    "dispatched"
                );
                outcome
            }
            Err(err) => match checkpoint {
                Some(checkpoint) => {
                    tracing::warn!(action = %name, error = %err, "mutated state not representable, state restored");
                    *state = checkpoint;
                    Err(err)
                }
                None => {
                    let fan_out = listeners.notify_unrepresentable(&err.to_string());
                    tracing::warn!(
                        action = %name,
                        error = %err,
                        delivered = fan_out.delivered,
                        "mutated state not representable, listeners told"
                    );
                    outcome
                }
            },
        }
    }

    /// Assign a JSON value at a path, bypassing modifiers.
    ///
    /// The path must address exactly one existing field below the root. The
    /// value must have the same JSON kind as the current one (null on either
    /// side is accepted) and the resulting document must still decode into
    /// `S`.
    pub fn patch(&self, path: &str, value: Value) -> Result<()> {
        let parsed = self.parse_path(path)?;
        if parsed.is_root() {
            return Err(StoreError::invalid_path(path, "the root is not patchable"));
        }

        let mut guard = self.inner.write();
        let Inner {
            state, listeners, ..
        } = &mut *guard;

        let before = to_document(&*state)?;
        let mut after = before.clone();

        let slot = parsed
            .lookup_mut(&mut after)
            .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
        if !slot.is_null() && !value.is_null() && kind_of(slot) != kind_of(&value) {
            return Err(StoreError::TypeMismatch {
                path: path.to_string(),
                expected: kind_of(slot).to_string(),
                got: kind_of(&value).to_string(),
            });
        }
        let expected = kind_of(slot);
        *slot = value;

        let patched: S =
            serde_json::from_value(after.clone()).map_err(|e| StoreError::TypeMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
                got: e.to_string(),
            })?;
        *state = patched;

        self.invalidate_cache();

        self.trace_changes(&before, &after);
        let fan_out = listeners.notify(&before, &after, self.differ);
        tracing::debug!(
            path,
            delivered = fan_out.delivered,
            dropped = fan_out.dropped,
            "patched"
        );
        Ok(())
    }

    /// Serialize a value and assign it at a path. See [`Store::patch`].
    pub fn patch_with<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
        self.patch(path, serde_json::to_value(value)?)
    }

    // --- Reads ---

    /// Snapshot of the current state.
    ///
    /// The snapshot is shared and immutable; repeated reads between
    /// mutations return the same allocation.
    pub fn get_state(&self) -> Result<Arc<S>> {
        self.with_snapshot(|snapshot| Ok(Arc::clone(&snapshot.state)))
    }

    /// Value at a path of the current state.
    pub fn get_state_by_path(&self, path: &str) -> Result<Value> {
        let parsed = self.parse_path(path)?;
        self.with_snapshot(|snapshot| {
            let doc = snapshot.document()?;
            parsed
                .resolve(&doc)
                .map_err(|e| StoreError::invalid_path(path, e.to_string()))
        })
    }

    /// Value at a path, decoded into `T`.
    pub fn get_state_at<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get_state_by_path(path)?)?)
    }

    // --- Internal ---

    /// Run `f` against the cached snapshot, building it first if needed.
    fn with_snapshot<R>(
        &self,
        f: impl FnOnce(&mut CachedSnapshot<S>) -> Result<R>,
    ) -> Result<R> {
        let inner = self.inner.read();
        let mut cache = self.cache.lock();

        if let Some(snapshot) = cache.as_mut() {
            return f(snapshot);
        }

        let state = Arc::new(deep_clone(&inner.state, self.config.clone_strategy)?);
        tracing::trace!("read snapshot rebuilt");
        f(cache.insert(CachedSnapshot {
            state,
            document: None,
        }))
    }

    /// Log the changed locations of a mutation. Only computed when trace
    /// output is enabled.
    fn trace_changes(&self, before: &Value, after: &Value) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let changes = self.differ.diff(before, after);
        let paths: Vec<String> = changes.iter().map(|c| c.path.join(".")).collect();
        tracing::trace!(count = changes.len(), paths = ?paths, "state changed");
    }

    fn invalidate_cache(&self) {
        *self.cache.lock() = None;
    }

    fn parse_path(&self, raw: &str) -> Result<Arc<Path>> {
        let mut paths = self.paths.lock();
        if let Some(path) = paths.get(raw) {
            return Ok(Arc::clone(path));
        }
        let path = Arc::new(Path::parse(raw)?);
        paths.put(raw.to_string(), Arc::clone(&path));
        Ok(path)
    }
}
