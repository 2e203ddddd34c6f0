//! MongoDB connector and utilities

mod config;
mod connector;
mod health;

pub use config::{DEFAULT_DATABASE, DEFAULT_URL, MongoConfig};
pub use connector::{
    MongoError, connect, connect_from_config, connect_from_config_with_retry, ping,
};
pub use health::{HealthStatus, check_health_detailed};

pub use mongodb::{Client, Collection, Database};
