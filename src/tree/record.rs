//! Flat department records
//!
//! A record is what the store (or a client) hands over: its own id, the id of
//! its parent and a display name. Anything else travels along in `attrs`
//! without being looked at by the tree code.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Department identifier
pub type DeptId = i64;

/// Parent id meaning "top-level department"
pub const ROOT_PARENT: DeptId = 0;

/// One department as received from the backend
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRecord {
    pub id: DeptId,

    /// Declared parent; [`ROOT_PARENT`] for top-level departments
    pub parent_id: DeptId,

    pub name: String,

    /// Sibling sort key, ascending
    pub order: i32,

    /// Opaque payload (status, createdAt, ...)
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl DepartmentRecord {
    pub fn new(id: DeptId, parent_id: DeptId, name: impl Into<String>, order: i32) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            order,
            attrs: Map::new(),
        }
    }

    /// Attach an opaque attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Whether the record declares itself top-level
    pub fn declares_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }
}

/// A record as a client sent it
///
/// Decoding never fails on a field's shape: a missing or unparseable id is
/// `None`, a bad parent id means root, a missing or non-text name is empty and
/// a non-integer order is 0. The builder decides what to do with id-less
/// records.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDepartment {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<DeptId>,

    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: DeptId,

    #[serde(default, deserialize_with = "deserialize_name")]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_order")]
    pub order: i32,

    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl RawDepartment {
    /// The record under `id`, which replaces whatever id was sent
    pub fn into_record(self, id: DeptId) -> DepartmentRecord {
        DepartmentRecord {
            id,
            parent_id: self.parent_id,
            name: self.name,
            order: self.order,
            attrs: self.attrs,
        }
    }
}

impl From<DepartmentRecord> for RawDepartment {
    fn from(record: DepartmentRecord) -> Self {
        Self {
            id: Some(record.id),
            parent_id: record.parent_id,
            name: record.name,
            order: record.order,
            attrs: record.attrs,
        }
    }
}

/// Integer or numeric string
fn parse_id(value: &Value) -> Option<DeptId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<DeptId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_id(&Value::deserialize(deserializer)?))
}

fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<DeptId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_id(&Value::deserialize(deserializer)?).unwrap_or(ROOT_PARENT))
}

fn deserialize_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    Ok(name)
}

fn deserialize_order<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let order = parse_id(&Value::deserialize(deserializer)?)
        .and_then(|order| i32::try_from(order).ok())
        .unwrap_or(0);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDepartment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parent_sentinels() {
        let samples = [
            json!({"id": 1, "name": "a"}),
            json!({"id": 1, "name": "a", "parentId": null}),
            json!({"id": 1, "name": "a", "parentId": 0}),
            json!({"id": 1, "name": "a", "parentId": "0"}),
            json!({"id": 1, "name": "a", "parentId": ""}),
            json!({"id": 1, "name": "a", "parentId": "HQ"}),
        ];
        for sample in samples {
            assert!(raw(sample).into_record(1).declares_root());
        }
    }

    #[test]
    fn test_string_ids() {
        let record = raw(json!({"id": "12", "parentId": "3", "name": "Ops", "order": "2"}));
        assert_eq!(record.id, Some(12));
        assert_eq!(record.parent_id, 3);
        assert_eq!(record.order, 2);
    }

    #[test]
    fn test_missing_or_bad_id_decodes_as_none() {
        for sample in [
            json!({"name": "x"}),
            json!({"id": null, "name": "x"}),
            json!({"id": "abc", "name": "x"}),
            json!({"id": 1.5, "name": "x"}),
        ] {
            assert_eq!(raw(sample).id, None);
        }
    }

    #[test]
    fn test_bad_fields_degrade() {
        let record = raw(json!({"id": 3, "order": "first"}));
        assert_eq!(record.name, "");
        assert_eq!(record.order, 0);

        let record = raw(json!({"id": 3, "name": null, "order": 1e12}));
        assert_eq!(record.name, "");
        assert_eq!(record.order, 0);
    }

    #[test]
    fn test_attrs_pass_through() {
        let value = json!({"id": 5, "parentId": 1, "name": "Eng", "order": 1, "status": 1, "createdAt": 1700000000});
        let record = raw(value.clone()).into_record(5);
        assert_eq!(record.attrs.get("status"), Some(&json!(1)));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }
}
