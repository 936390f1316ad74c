use std::{sync::Arc, time::Duration};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde_json::Value;

pub type AppState = Arc<State>;

/// Response cache TTL. Analytic reads are idempotent, so concurrent misses
/// for the same key may both run the query; last write wins.
const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(60);
const RESPONSE_CACHE_CAPACITY: u64 = 10_000;

pub struct State {
    pub db: DatabaseConnection,
    response_cache: moka::sync::Cache<String, Value>,
}

impl State {
    pub async fn new(options: ConnectOptions) -> Result<Self, DbErr> {
        let db = Database::connect(options).await?;

        let response_cache = moka::sync::Cache::builder()
            .max_capacity(RESPONSE_CACHE_CAPACITY)
            .time_to_live(RESPONSE_CACHE_TTL)
            .build();

        Ok(Self { db, response_cache })
    }

    pub fn get_cache<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.response_cache
            .get(key)
            .and_then(|json_value| serde_json::from_value(json_value).ok())
    }

    pub fn set_cache<T>(&self, key: String, value: T)
    where
        T: serde::Serialize,
    {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.response_cache.insert(key, json_value);
        }
    }

    pub fn invalidate_cache(&self, key: &str) {
        self.response_cache.invalidate(key);
    }
}
