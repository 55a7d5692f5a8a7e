pub mod model;
pub mod services;
pub mod stats;
pub mod store;
