//! Department entity
//!
//! Table: org_department

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::tree::DepartmentRecord;

pub const STATUS_DISABLED: i32 = 0;
pub const STATUS_ENABLED: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "org_department")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// Parent department id (0 for top level)
    pub parent_id: i64,

    /// Display path of the parent (denormalised)
    #[sea_orm(column_type = "Text")]
    pub parent_name: String,

    /// Sibling order, ascending
    pub sort_order: i32,

    pub status: i32,

    /// Unix seconds
    pub created_at: i64,

    /// Unix seconds
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Self reference (parent_id) is resolved in memory by the tree module

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DepartmentRecord {
    fn from(model: Model) -> Self {
        DepartmentRecord::new(model.id, model.parent_id, model.name, model.sort_order)
            .with_attr("parentName", model.parent_name)
            .with_attr("status", model.status)
            .with_attr("createdAt", model.created_at)
            .with_attr("updatedAt", model.updated_at)
    }
}

impl Model {
    /// Summary used in operation log descriptions
    pub fn describe(&self) -> String {
        json!({
            "id": self.id,
            "name": self.name,
            "parentId": self.parent_id,
            "order": self.sort_order,
            "status": self.status,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        Model {
            id: 4,
            name: "Platform".to_string(),
            parent_id: 2,
            parent_name: "HQ / Eng".to_string(),
            sort_order: 3,
            status: STATUS_ENABLED,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_100,
        }
    }

    #[test]
    fn test_into_record() {
        let record = DepartmentRecord::from(model());
        assert_eq!(record.id, 4);
        assert_eq!(record.parent_id, 2);
        assert_eq!(record.order, 3);
        assert_eq!(record.attrs["parentName"], "HQ / Eng");
        assert_eq!(record.attrs["status"], 1);
        assert_eq!(record.attrs["createdAt"], 1_700_000_000_i64);
    }

    #[test]
    fn test_describe() {
        let summary: serde_json::Value = serde_json::from_str(&model().describe()).unwrap();
        assert_eq!(summary["name"], "Platform");
        assert_eq!(summary["status"], STATUS_ENABLED);
    }
}
