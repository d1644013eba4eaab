//! Core types for the state store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock timestamp in microseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A named request to mutate the state.
///
/// The payload travels as JSON and is decoded into the registered modifier's
/// payload type at dispatch time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, matched against registered modifiers.
    pub name: String,
    /// Optional payload.
    pub payload: Option<serde_json::Value>,
}

impl Action {
    /// Action without a payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Action carrying a JSON payload.
    ///
    /// ```
    /// use statehub::Action;
    ///
    /// let action = Action::with_payload("ADD_AGE", 10);
    /// assert_eq!(action.payload, Some(serde_json::json!(10)));
    /// ```
    pub fn with_payload(name: impl Into<String>, payload: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload.into()),
        }
    }

    /// Action carrying any serializable payload.
    pub fn try_with_payload<T: Serialize>(
        name: impl Into<String>,
        payload: &T,
    ) -> crate::Result<Self> {
        Ok(Self {
            name: name.into(),
            payload: Some(serde_json::to_value(payload)?),
        })
    }

    /// Number of payload arguments this action carries (0 or 1).
    pub fn arity(&self) -> usize {
        usize::from(self.payload.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Move {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_action_arity() {
        assert_eq!(Action::new("RESET").arity(), 0);
        assert_eq!(Action::with_payload("ADD", 1).arity(), 1);
    }

    #[test]
    fn test_try_with_payload() {
        let action = Action::try_with_payload("MOVE", &Move { x: 1, y: -2 }).unwrap();
        assert_eq!(action.payload, Some(json!({"x": 1, "y": -2})));
    }

    #[test]
    fn test_timestamp_monotonic_enough() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(b >= a);
        assert!(a.0 > 0);
    }
}
