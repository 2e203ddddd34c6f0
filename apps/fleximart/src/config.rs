//! Configuration for the catalog CLI

use std::path::PathBuf;

use clap::ValueEnum;
use core_config::{ConfigError, Environment, FromEnv, env_or_default};
use database::mongodb::MongoConfig;
use strum::{Display, EnumString};

/// Where the catalog lives while commands run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// A MongoDB deployment
    Mongo,
    /// Process memory, seeded from the catalog file on every run
    Memory,
}

/// Settings taken from command-line flags; anything set here wins over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub mongo_url: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub mongodb: MongoConfig,
    pub backend: Backend,
    pub collection: String,
    /// Catalog JSON used by `load`, `demo` and the memory backend
    pub catalog: PathBuf,
}

/// Load Config from environment variables
///
/// - `APP_ENV` (default: `development`)
/// - `MONGODB_*` / `MONGO_*`, see `MongoConfig`
/// - `FLEXIMART_BACKEND` (`mongo` or `memory`, default: `mongo`)
/// - `FLEXIMART_COLLECTION` (default: `products`)
/// - `FLEXIMART_CATALOG` (default: `products_catalog.json`)
impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let backend_raw = env_or_default("FLEXIMART_BACKEND", "mongo");
        let backend = backend_raw
            .parse::<Backend>()
            .map_err(|e| ConfigError::ParseError {
                key: "FLEXIMART_BACKEND".to_string(),
                details: format!("{} ('{}')", e, backend_raw),
            })?;

        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name("fleximart");
        }

        Ok(Self {
            environment: Environment::from_env(),
            mongodb,
            backend,
            collection: env_or_default(
                "FLEXIMART_COLLECTION",
                domain_products::mongodb::PRODUCTS_COLLECTION,
            ),
            catalog: PathBuf::from(env_or_default("FLEXIMART_CATALOG", "products_catalog.json")),
        })
    }
}

impl Config {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(url) = overrides.mongo_url {
            self.mongodb.url = url;
        }
        if let Some(database) = overrides.database {
            self.mongodb.database = database;
        }
        if let Some(collection) = overrides.collection {
            self.collection = collection;
        }
        if let Some(catalog) = overrides.catalog {
            self.catalog = catalog;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "FLEXIMART_BACKEND",
        "FLEXIMART_COLLECTION",
        "FLEXIMART_CATALOG",
        "MONGODB_URL",
        "MONGO_URL",
        "MONGODB_DATABASE",
        "MONGODB_APP_NAME",
    ];

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars_unset(VARS, || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.backend, Backend::Mongo);
            assert_eq!(config.collection, "products");
            assert_eq!(config.catalog, PathBuf::from("products_catalog.json"));
            assert_eq!(config.mongodb.database, "fleximart_nosql");
            assert_eq!(config.mongodb.app_name.as_deref(), Some("fleximart"));
        });
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("FLEXIMART_BACKEND", Some("Memory")),
                ("FLEXIMART_COLLECTION", Some("catalog")),
                ("MONGODB_URL", None),
                ("MONGO_URL", Some("mongodb://db:27017")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.backend, Backend::Memory);
                assert_eq!(config.collection, "catalog");
                assert_eq!(config.mongodb.url, "mongodb://db:27017");
            },
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        temp_env::with_var("FLEXIMART_BACKEND", Some("postgres"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("FLEXIMART_BACKEND"));
        });
    }

    #[test]
    fn test_flags_override_environment() {
        temp_env::with_vars(
            [
                ("FLEXIMART_BACKEND", Some("mongo")),
                ("MONGODB_DATABASE", Some("from_env")),
            ],
            || {
                let config = Config::from_env().unwrap().apply(Overrides {
                    backend: Some(Backend::Memory),
                    database: Some("from_flag".to_string()),
                    ..Overrides::default()
                });
                assert_eq!(config.backend, Backend::Memory);
                assert_eq!(config.mongodb.database, "from_flag");
            },
        );
    }
}
