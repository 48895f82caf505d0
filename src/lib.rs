pub mod aggregate;
pub mod collector;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod scoring;
pub mod settings;
pub mod store;
pub mod utils;
