pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod query;
pub mod store;
