//! In-memory collection with document-level query evaluation.

use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value as JsonValue;

use crate::{
    FlowletError, Result, ShareLock,
    store::{
        DbCollection, PageData,
        query::{Filter, Query},
    },
};

use super::DbDocument;

/// A HashMap-backed collection implementing the same `DbCollection`
/// contract as the SQL backend, including filtered queries.
#[derive(Debug)]
pub struct Collect<T> {
    name: String,
    rows: ShareLock<HashMap<String, T>>,
}

impl<T> Collect<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: ShareLock::new(HashMap::new().into()),
        }
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument + Clone + Send + Sync,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let rows = self.rows.read().unwrap();
        Ok(rows.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        let rows = self.rows.read().unwrap();
        rows.get(id).cloned().ok_or(FlowletError::Store(format!("{}: record {} not found", self.name, id)))
    }

    fn query(
        &self,
        q: &Query,
    ) -> Result<PageData<Self::Item>> {
        let rows = self.rows.read().unwrap();

        let mut matched: Vec<(HashMap<String, JsonValue>, T)> = Vec::new();
        for row in rows.values() {
            let doc = row.doc()?;
            if q.filters().iter().all(|f| eval(f, &doc)) {
                matched.push((doc, row.clone()));
            }
        }

        for (column, rev) in q.order_by().iter().rev() {
            matched.sort_by(|(a, _), (b, _)| {
                let ord = json_cmp(a.get(column), b.get(column));
                if *rev { ord.reverse() } else { ord }
            });
        }

        let count = matched.len();
        let page_count = count.div_ceil(q.limit());
        let page_num = q.offset() / q.limit() + 1;
        let data = PageData {
            count,
            page_size: q.limit(),
            page_num,
            page_count,
            rows: matched.into_iter().skip(q.offset()).take(q.limit()).map(|(_, row)| row).collect(),
        };
        Ok(data)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        if rows.contains_key(data.id()) {
            return Err(FlowletError::Store(format!("{}: record {} already exists", self.name, data.id())));
        }
        rows.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        if !rows.contains_key(data.id()) {
            return Ok(false);
        }
        rows.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        let mut rows = self.rows.write().unwrap();
        Ok(rows.remove(id).is_some())
    }
}

fn eval(
    filter: &Filter,
    doc: &HashMap<String, JsonValue>,
) -> bool {
    match filter {
        Filter::Eq(column, value) => doc.get(column) == Some(value),
        Filter::Gt(column, value) => json_cmp(doc.get(column), Some(value)) == Ordering::Greater,
        Filter::Lt(column, value) => json_cmp(doc.get(column), Some(value)) == Ordering::Less,
    }
}

/// Total order over the JSON scalars the documents use. Mixed or
/// non-scalar kinds compare equal, which makes them filter-neutral.
fn json_cmp(
    a: Option<&JsonValue>,
    b: Option<&JsonValue>,
) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            x.as_f64().unwrap_or(0.0).partial_cmp(&y.as_f64().unwrap_or(0.0)).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::store::{
        DbCollection,
        data::Run,
        query::{Filter, Query},
    };

    use super::Collect;

    fn run(
        id: &str,
        wid: &str,
        state: &str,
        start_time: i64,
    ) -> Run {
        Run {
            id: id.to_string(),
            wid: wid.to_string(),
            oid: "org_1".to_string(),
            uid: "user_1".to_string(),
            state: state.to_string(),
            category: "automation".to_string(),
            duration: 0,
            cost: None,
            err: None,
            start_time,
            end_time: 0,
            timestamp: start_time,
        }
    }

    #[test]
    fn create_find_update_delete() {
        let collect: Collect<Run> = Collect::new("runs");
        collect.create(&run("r1", "w1", "running", 100)).unwrap();

        assert!(collect.exists("r1").unwrap());
        assert!(collect.create(&run("r1", "w1", "running", 100)).is_err());

        let mut row = collect.find("r1").unwrap();
        row.state = "success".to_string();
        assert!(collect.update(&row).unwrap());
        assert_eq!(collect.find("r1").unwrap().state, "success");

        assert!(collect.delete("r1").unwrap());
        assert!(!collect.exists("r1").unwrap());
        assert!(!collect.delete("r1").unwrap());
    }

    #[test]
    fn query_filters_and_counts() {
        let collect: Collect<Run> = Collect::new("runs");
        collect.create(&run("r1", "w1", "failed", 100)).unwrap();
        collect.create(&run("r2", "w1", "failed", 200)).unwrap();
        collect.create(&run("r3", "w1", "success", 300)).unwrap();
        collect.create(&run("r4", "w2", "failed", 400)).unwrap();

        let q = Query::new()
            .filter(Filter::Eq("wid".to_string(), json!("w1")))
            .filter(Filter::Eq("state".to_string(), json!("failed")))
            .filter(Filter::Gt("start_time".to_string(), json!(50)));
        let page = collect.query(&q).unwrap();
        assert_eq!(page.count, 2);

        let q = Query::new().filter(Filter::Gt("start_time".to_string(), json!(150)));
        assert_eq!(collect.query(&q).unwrap().count, 3);

        let q = Query::new().filter(Filter::Lt("start_time".to_string(), json!(150)));
        assert_eq!(collect.query(&q).unwrap().count, 1);
    }

    #[test]
    fn query_orders_and_paginates() {
        let collect: Collect<Run> = Collect::new("runs");
        for (id, start) in [("r1", 300), ("r2", 100), ("r3", 200)] {
            collect.create(&run(id, "w1", "success", start)).unwrap();
        }

        let q = Query::new().order("start_time", false).set_limit(2);
        let page = collect.query(&q).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.page_count, 2);
        let ids: Vec<&str> = page.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3"]);

        let q = Query::new().order("start_time", true).set_limit(2);
        let ids: Vec<String> = collect.query(&q).unwrap().rows.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }
}
