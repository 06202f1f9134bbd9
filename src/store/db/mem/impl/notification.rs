use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::{
    Result,
    store::{data::Notification, db::mem::DbDocument},
};

impl DbDocument for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        let mut map = HashMap::new();
        map.insert("id".to_string(), json!(self.id.clone()));
        map.insert("oid".to_string(), json!(self.oid.clone()));
        map.insert("kind".to_string(), json!(self.kind.clone()));
        map.insert("severity".to_string(), json!(self.severity.clone()));
        map.insert("message".to_string(), json!(self.message.clone()));
        map.insert("read_time".to_string(), json!(self.read_time));
        map.insert("timestamp".to_string(), json!(self.timestamp));
        Ok(map)
    }
}
