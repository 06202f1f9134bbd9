use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};

use crate::{
    Result,
    store::{data::Run, db::mem::DbDocument},
};

impl DbDocument for Run {
    fn id(&self) -> &str {
        &self.id
    }

    fn doc(&self) -> Result<HashMap<String, JsonValue>> {
        let mut map = HashMap::new();
        map.insert("id".to_string(), json!(self.id.clone()));
        map.insert("wid".to_string(), json!(self.wid.clone()));
        map.insert("oid".to_string(), json!(self.oid.clone()));
        map.insert("uid".to_string(), json!(self.uid.clone()));
        map.insert("state".to_string(), json!(self.state.clone()));
        map.insert("category".to_string(), json!(self.category.clone()));
        map.insert("duration".to_string(), json!(self.duration));
        map.insert("cost".to_string(), json!(self.cost));
        map.insert("err".to_string(), json!(self.err.clone()));
        map.insert("start_time".to_string(), json!(self.start_time));
        map.insert("end_time".to_string(), json!(self.end_time));
        map.insert("timestamp".to_string(), json!(self.timestamp));
        Ok(map)
    }
}
