pub mod chunks;
pub mod db;
pub mod error;
pub mod fetch;
pub mod load;
pub mod locator;
pub mod pipeline;
pub mod schema;
