//! Database layer: initialization, schema maintenance, and models

pub mod init;
pub mod migrations;
pub mod models;
pub mod schema_sync;
pub mod table_schemas;

pub use init::init_database;
