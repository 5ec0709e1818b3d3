//! CLI command implementations.

pub mod buy;
pub mod db;
pub mod migrate;
pub mod products;
