pub mod api;
pub mod error;
pub mod ids;
pub mod model;
pub mod redis;
pub mod store;
