//! Request handlers module

pub mod audit;
pub mod config;
pub mod department;
pub mod view;
