//! JSON object wrapper passed between nodes during a run.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// A string-keyed map of JSON values.
///
/// `Vars` is the data unit flowing through a run: the trigger's synthetic
/// payload seeds the chain, and every node extends the map it received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vars(Map<String, Value>);

impl Vars {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Set a key to any serializable value.
    pub fn set<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) {
        if let Ok(v) = serde_json::to_value(value) {
            self.0.insert(key.into(), v);
        }
    }

    /// Get a key, deserialized into `T`. Returns `None` when the key is
    /// absent or the value does not convert.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Shallow merge: keys from `other` overwrite keys already present,
    /// everything else persists.
    pub fn extend(
        &mut self,
        other: &Vars,
    ) {
        for (k, v) in other.0.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0)
    }
}

impl std::fmt::Display for Vars {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Vars;

    #[test]
    fn extend_is_shallow_and_new_keys_win() {
        let mut base = Vars::new();
        base.set("kept", "old");
        base.set("replaced", json!({"a": 1}));

        let mut update = Vars::new();
        update.set("replaced", json!({"b": 2}));
        update.set("added", true);

        base.extend(&update);

        assert_eq!(base.get::<String>("kept").unwrap(), "old");
        // replaced wholesale, not deep-merged
        assert_eq!(base.get::<serde_json::Value>("replaced").unwrap(), json!({"b": 2}));
        assert_eq!(base.get::<bool>("added").unwrap(), true);
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn value_round_trip() {
        let mut vars = Vars::new();
        vars.set("n", 3);
        let value: serde_json::Value = vars.clone().into();
        assert_eq!(Vars::from(value), vars);
    }
}
