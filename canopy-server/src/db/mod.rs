//! Database access layer for canopy-server
//!
//! Thin data-access functions over the shared pool. Schema creation and
//! maintenance live in canopy-common; this layer assumes the startup
//! initialization has already brought the schema up to date.

pub mod categories;
pub mod items;
pub mod points;
pub mod repair;
pub mod seed;
pub mod sessions;
pub mod users;
