//! Entity module - SeaORM models

pub mod department;
pub mod op_log;
