//! Structural diff of JSON documents.

use serde_json::{Map, Value};

/// Kind of a single structural change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Present only in the new document.
    Create,
    /// Present in both with different values.
    Update,
    /// Present only in the old document.
    Delete,
}

/// One difference between two documents.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    /// Location relative to the compared roots.
    pub path: Vec<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
}

/// Structural comparison with a configurable sequence-order policy.
///
/// With ordered sequences (the default) `["a", "b"]` and `["b", "a"]` differ.
/// Unordered comparison treats sequences as multisets.
#[derive(Clone, Copy, Debug)]
pub struct Differ {
    ordered_sequences: bool,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new()
    }
}

impl Differ {
    /// Order-sensitive differ.
    pub fn new() -> Self {
        Self {
            ordered_sequences: true,
        }
    }

    /// Set whether element order inside sequences matters.
    pub fn ordered_sequences(mut self, ordered: bool) -> Self {
        self.ordered_sequences = ordered;
        self
    }

    /// Whether any difference exists. Short-circuits on the first one.
    pub fn has_changes(&self, old: &Value, new: &Value) -> bool {
        !self.equivalent(old, new)
    }

    /// Full list of differences.
    pub fn diff(&self, old: &Value, new: &Value) -> Vec<Change> {
        let mut changes = Vec::new();
        let mut path = Vec::new();
        self.diff_into(old, new, &mut path, &mut changes);
        changes
    }

    fn equivalent(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Array(xs), Value::Array(ys)) if !self.ordered_sequences => {
                self.same_multiset(xs, ys)
            }
            (Value::Array(xs), Value::Array(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.equivalent(x, y))
            }
            (Value::Object(xs), Value::Object(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, x)| ys.get(k).is_some_and(|y| self.equivalent(x, y)))
            }
            _ => a == b,
        }
    }

    fn same_multiset(&self, xs: &[Value], ys: &[Value]) -> bool {
        if xs.len() != ys.len() {
            return false;
        }
        let mut used = vec![false; ys.len()];
        xs.iter().all(|x| match self.find_unused(x, ys, &used) {
            Some(j) => {
                used[j] = true;
                true
            }
            None => false,
        })
    }

    fn find_unused(&self, x: &Value, ys: &[Value], used: &[bool]) -> Option<usize> {
        ys.iter()
            .enumerate()
            .find(|(j, y)| !used[*j] && self.equivalent(x, y))
            .map(|(j, _)| j)
    }

    fn diff_into(
        &self,
        old: &Value,
        new: &Value,
        path: &mut Vec<String>,
        changes: &mut Vec<Change>,
    ) {
        match (old, new) {
            (Value::Object(a), Value::Object(b)) => self.diff_objects(a, b, path, changes),
            (Value::Array(a), Value::Array(b)) if self.ordered_sequences => {
                self.diff_ordered(a, b, path, changes)
            }
            (Value::Array(a), Value::Array(b)) => self.diff_unordered(a, b, path, changes),
            _ if old == new => {}
            _ => changes.push(Change {
                kind: ChangeKind::Update,
                path: path.clone(),
                from: Some(old.clone()),
                to: Some(new.clone()),
            }),
        }
    }

    fn diff_objects(
        &self,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
        path: &mut Vec<String>,
        changes: &mut Vec<Change>,
    ) {
        for (key, old) in a {
            path.push(key.clone());
            match b.get(key) {
                Some(new) => self.diff_into(old, new, path, changes),
                None => changes.push(deleted(path, old)),
            }
            path.pop();
        }
        for (key, new) in b {
            if !a.contains_key(key) {
                path.push(key.clone());
                changes.push(created(path, new));
                path.pop();
            }
        }
    }

    fn diff_ordered(
        &self,
        a: &[Value],
        b: &[Value],
        path: &mut Vec<String>,
        changes: &mut Vec<Change>,
    ) {
        for i in 0..a.len().max(b.len()) {
            path.push(i.to_string());
            match (a.get(i), b.get(i)) {
                (Some(old), Some(new)) => self.diff_into(old, new, path, changes),
                (Some(old), None) => changes.push(deleted(path, old)),
                (None, Some(new)) => changes.push(created(path, new)),
                (None, None) => {}
            }
            path.pop();
        }
    }

    fn diff_unordered(
        &self,
        a: &[Value],
        b: &[Value],
        path: &mut Vec<String>,
        changes: &mut Vec<Change>,
    ) {
        let mut used = vec![false; b.len()];
        for (i, old) in a.iter().enumerate() {
            match self.find_unused(old, b, &used) {
                Some(j) => used[j] = true,
                None => {
                    path.push(i.to_string());
                    changes.push(deleted(path, old));
                    path.pop();
                }
            }
        }
        for (j, new) in b.iter().enumerate() {
            if !used[j] {
                path.push(j.to_string());
                changes.push(created(path, new));
                path.pop();
            }
        }
    }
}

fn created(path: &[String], value: &Value) -> Change {
    Change {
        kind: ChangeKind::Create,
        path: path.to_vec(),
        from: None,
        to: Some(value.clone()),
    }
}

fn deleted(path: &[String], value: &Value) -> Change {
    Change {
        kind: ChangeKind::Delete,
        path: path.to_vec(),
        from: Some(value.clone()),
        to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents() {
        let doc = json!({"a": 1, "b": [1, 2, {"c": null}]});
        let differ = Differ::new();
        assert!(!differ.has_changes(&doc, &doc.clone()));
        assert!(differ.diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_scalar_update() {
        let changes = Differ::new().diff(&json!({"Age": 40}), &json!({"Age": 50}));
        assert_eq!(
            changes,
            vec![Change {
                kind: ChangeKind::Update,
                path: vec!["Age".into()],
                from: Some(json!(40)),
                to: Some(json!(50)),
            }]
        );
    }

    #[test]
    fn test_order_sensitive_by_default() {
        let old = json!(["a", "b"]);
        let new = json!(["b", "a"]);
        assert!(Differ::new().has_changes(&old, &new));
        assert_eq!(Differ::new().diff(&old, &new).len(), 2);
    }

    #[test]
    fn test_unordered_sequences() {
        let differ = Differ::new().ordered_sequences(false);
        assert!(!differ.has_changes(&json!(["a", "b", "a"]), &json!(["a", "a", "b"])));
        assert!(differ.has_changes(&json!(["a", "b", "a"]), &json!(["a", "b", "b"])));

        let changes = differ.diff(&json!([1, 2, 3]), &json!([3, 4, 1]));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Delete);
        assert_eq!(changes[0].from, Some(json!(2)));
        assert_eq!(changes[1].kind, ChangeKind::Create);
        assert_eq!(changes[1].to, Some(json!(4)));
    }

    #[test]
    fn test_created_and_deleted_keys() {
        let changes = Differ::new().diff(&json!({"a": 1, "b": 2}), &json!({"b": 2, "c": 3}));
        assert_eq!(changes.len(), 2);
        assert!(changes
            .iter()
            .any(|c| c.kind == ChangeKind::Delete && c.path == vec!["a".to_string()]));
        assert!(changes
            .iter()
            .any(|c| c.kind == ChangeKind::Create && c.path == vec!["c".to_string()]));
    }

    #[test]
    fn test_nested_path_reported() {
        let changes = Differ::new().diff(
            &json!({"Address": {"City": "New York"}, "Tags": ["dev"]}),
            &json!({"Address": {"City": "Boston"}, "Tags": ["dev", "linux"]}),
        );
        let paths: Vec<_> = changes.iter().map(|c| c.path.join(".")).collect();
        assert_eq!(paths, vec!["Address.City", "Tags.1"]);
    }

    #[test]
    fn test_kind_change_is_update() {
        let changes = Differ::new().diff(&json!({"x": null}), &json!({"x": {"y": 1}}));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Update);
    }
}
