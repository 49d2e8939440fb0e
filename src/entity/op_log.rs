//! OpLog entity - operation audit trail
//!
//! Table: org_op_log

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operation types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpType {
    CreateDept,
    UpdateDept,
    DeleteDept,
    QueryDept,
}

impl OpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::CreateDept => "create department",
            OpType::UpdateDept => "update department",
            OpType::DeleteDept => "delete department",
            OpType::QueryDept => "query department",
        }
    }
}

/// Operation result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpResult {
    Success,
    Failed,
}

impl OpResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpResult::Success => "success",
            OpResult::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "org_op_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Unix seconds
    pub op_time: i64,

    #[sea_orm(column_type = "String(Some(64))")]
    pub operator: String,

    #[sea_orm(column_type = "String(Some(32))")]
    pub op_type: String,

    #[sea_orm(column_type = "Text")]
    pub op_desc: String,

    /// Value before a modification
    #[sea_orm(column_type = "Text", nullable)]
    pub old_value: Option<String>,

    #[sea_orm(column_type = "String(Some(16))")]
    pub result: String,

    #[sea_orm(column_type = "String(Some(64))", nullable)]
    pub ip: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
