//! Named modifiers and the registry that dispatch resolves them from.

use crate::error::{ModifierError, Result, StoreError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Return type expected from modifier closures.
pub type ModifierResult = std::result::Result<(), ModifierError>;

type UnitFn<S> = Box<dyn Fn(&mut S) -> ModifierResult + Send + Sync>;
type PayloadFn<S> = Box<dyn Fn(Value) -> serde_json::Result<Prepared<'static, S>> + Send + Sync>;

/// A modifier bound to its payload, ready to run against the live state.
pub(crate) type Prepared<'a, S> = Box<dyn FnOnce(&mut S) -> ModifierResult + 'a>;

/// A registered mutation. The variant fixes the arity at registration time.
pub(crate) enum Modifier<S> {
    Unit(UnitFn<S>),
    WithPayload(PayloadFn<S>),
}

impl<S: 'static> Modifier<S> {
    pub fn unit<F, E>(f: F) -> Self
    where
        F: Fn(&mut S) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<ModifierError>,
    {
        Modifier::Unit(Box::new(move |state: &mut S| f(state).map_err(Into::into)))
    }

    pub fn with_payload<P, F, E>(f: F) -> Self
    where
        P: DeserializeOwned + 'static,
        F: Fn(&mut S, P) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<ModifierError>,
    {
        let f = Arc::new(f);
        Modifier::WithPayload(Box::new(
            move |payload: Value| -> serde_json::Result<Prepared<'static, S>> {
                let payload: P = serde_json::from_value(payload)?;
                let f = Arc::clone(&f);
                Ok(Box::new(move |state: &mut S| {
                    (*f)(state, payload).map_err(Into::into)
                }))
            },
        ))
    }

    /// Number of payload arguments this modifier takes.
    pub fn arity(&self) -> usize {
        match self {
            Modifier::Unit(_) => 0,
            Modifier::WithPayload(_) => 1,
        }
    }

    /// Check arity and decode the payload without touching any state.
    pub fn prepare(&self, action: &str, payload: Option<Value>) -> Result<Prepared<'_, S>> {
        match (self, payload) {
            (Modifier::Unit(f), None) => Ok(Box::new(move |state: &mut S| f(state))),
            (Modifier::WithPayload(decode), Some(payload)) => {
                let call: Prepared<'_, S> =
                    decode(payload).map_err(|e| StoreError::PayloadTypeMismatch {
                        action: action.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(call)
            }
            (modifier, payload) => Err(StoreError::PayloadArityMismatch {
                action: action.to_string(),
                expected: modifier.arity(),
                got: usize::from(payload.is_some()),
            }),
        }
    }
}

/// At most one modifier per action name.
pub(crate) struct ModifierRegistry<S> {
    modifiers: HashMap<String, Modifier<S>>,
}

impl<S: 'static> ModifierRegistry<S> {
    pub fn new() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    pub fn register(&mut self, action: &str, modifier: Modifier<S>) -> Result<()> {
        if action.trim().is_empty() {
            return Err(StoreError::InvalidModifier {
                action: action.to_string(),
                reason: "action name must not be empty".to_string(),
            });
        }
        if self.modifiers.contains_key(action) {
            return Err(StoreError::DuplicateAction(action.to_string()));
        }
        tracing::debug!(action, arity = modifier.arity(), "modifier registered");
        self.modifiers.insert(action.to_string(), modifier);
        Ok(())
    }

    pub fn get(&self, action: &str) -> Option<&Modifier<S>> {
        self.modifiers.get(action)
    }

    pub fn contains(&self, action: &str) -> bool {
        self.modifiers.contains_key(action)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        value: i64,
    }

    fn registry() -> ModifierRegistry<Counter> {
        let mut registry = ModifierRegistry::new();
        registry
            .register(
                "ADD",
                Modifier::with_payload(|c: &mut Counter, n: i64| -> ModifierResult {
                    c.value += n;
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .register(
                "RESET",
                Modifier::unit(|c: &mut Counter| -> ModifierResult {
                    c.value = 0;
                    Ok(())
                }),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_prepare_and_run() {
        let registry = registry();
        let mut counter = Counter::default();

        let call = registry.get("ADD").unwrap().prepare("ADD", Some(json!(5))).unwrap();
        call(&mut counter).unwrap();
        assert_eq!(counter.value, 5);

        let call = registry.get("RESET").unwrap().prepare("RESET", None).unwrap();
        call(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry();
        let noop = Modifier::unit(|_: &mut Counter| -> ModifierResult { Ok(()) });
        let result = registry.register("ADD", noop);
        assert!(matches!(result, Err(StoreError::DuplicateAction(name)) if name == "ADD"));
        assert_eq!(registry.get("ADD").unwrap().arity(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = registry();
        let noop = Modifier::unit(|_: &mut Counter| -> ModifierResult { Ok(()) });
        let result = registry.register("  ", noop);
        assert!(matches!(result, Err(StoreError::InvalidModifier { .. })));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_arity_mismatch() {
        let registry = registry();
        let err = registry.get("ADD").unwrap().prepare("ADD", None).err().unwrap();
        assert!(matches!(
            err,
            StoreError::PayloadArityMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));

        let err = registry
            .get("RESET")
            .unwrap()
            .prepare("RESET", Some(json!(1)))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StoreError::PayloadArityMismatch {
                expected: 0,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_payload_type_mismatch() {
        let registry = registry();
        let err = registry
            .get("ADD")
            .unwrap()
            .prepare("ADD", Some(json!("ten")))
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::PayloadTypeMismatch { .. }));
    }

    #[test]
    fn test_failure_is_reported() {
        let mut registry = ModifierRegistry::new();
        registry
            .register(
                "FAIL",
                Modifier::unit(|c: &mut Counter| {
                    c.value = -1;
                    Err("refused")
                }),
            )
            .unwrap();
        let mut counter = Counter::default();
        let call = registry.get("FAIL").unwrap().prepare("FAIL", None).unwrap();
        let err = call(&mut counter).unwrap_err();
        assert_eq!(err.to_string(), "refused");
        assert_eq!(counter.value, -1);
    }
}
