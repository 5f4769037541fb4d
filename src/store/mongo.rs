//! MongoDB Store
//!
//! Persists one document per cache key, with the key as `_id`:
//!
//! ```text
//! { _id, value: BinData, expiresAt?: Date, slidingDurationSeconds?: Double, refreshBefore?: Date }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{self, doc, spec::BinarySubtype, Binary, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheEntry, SlidingWindow};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::EntryStore;

// == Persisted Document ==
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    #[serde(rename = "_id")]
    key: String,
    value: Binary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sliding_duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_before: Option<bson::DateTime>,
}

impl From<&CacheEntry> for CacheDocument {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: Binary {
                subtype: BinarySubtype::Generic,
                bytes: entry.value.clone(),
            },
            expires_at: entry.expires_at.map(to_bson),
            sliding_duration_seconds: entry
                .sliding_duration()
                .map(|d| d.num_milliseconds() as f64 / 1000.0),
            refresh_before: entry.refresh_before().map(to_bson),
        }
    }
}

impl From<CacheDocument> for CacheEntry {
    fn from(document: CacheDocument) -> Self {
        let sliding = document
            .sliding_duration_seconds
            .zip(document.refresh_before)
            .map(|(seconds, refresh_before)| SlidingWindow {
                duration: sliding_duration(seconds),
                refresh_before: from_bson(refresh_before),
            });

        Self {
            key: document.key,
            value: document.value.bytes,
            expires_at: document.expires_at.map(from_bson),
            sliding,
        }
    }
}

/// Reads a stored window length. Negative or non-numeric lengths, which only
/// another writer could have stored, are read as zero. The entry keeps its stored
/// `refreshBefore` and is never extended past it.
fn sliding_duration(seconds: f64) -> Duration {
    let millis = (seconds * 1000.0).round();
    if millis.is_nan() || millis <= 0.0 {
        return Duration::zero();
    }
    Duration::try_milliseconds(millis as i64).unwrap_or_else(Duration::max_value)
}

fn to_bson(instant: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(instant.timestamp_millis())
}

fn from_bson(instant: bson::DateTime) -> DateTime<Utc> {
    let millis = instant.timestamp_millis();
    DateTime::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Matches documents whose absolute bound or sliding window ended at or before `now`.
fn expired_filter(now: DateTime<Utc>) -> Document {
    let now = to_bson(now);
    doc! {
        "$or": [
            { "expiresAt": { "$lte": now } },
            { "refreshBefore": { "$lte": now } },
        ]
    }
}

// == Mongo Store ==
/// [`EntryStore`] backed by a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<CacheDocument>,
}

impl MongoStore {
    // == Constructor ==
    /// Connects using `config.connection_string`, which must name a database
    /// (e.g. `mongodb://localhost/caching`), and opens `config.collection_name`.
    ///
    /// Also ensures the indexes used by the expired-entry sweep.
    pub async fn connect(config: &Config) -> Result<Self> {
        let connection_string = config
            .connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CacheError::Configuration("connection string is missing".into()))?;
        if config.collection_name.is_empty() {
            return Err(CacheError::Configuration(
                "collection name is missing".into(),
            ));
        }

        let options = ClientOptions::parse(connection_string).await?;
        let database = options.default_database.clone().ok_or_else(|| {
            CacheError::Configuration("connection string requires a database name".into())
        })?;

        let client = Client::with_options(options)?;
        let collection = client
            .database(&database)
            .collection::<CacheDocument>(&config.collection_name);

        let store = Self { collection };
        store.ensure_indexes().await?;

        info!(
            "Connected to MongoDB cache collection {}.{}",
            database, config.collection_name
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        for field in ["expiresAt", "refreshBefore"] {
            let index = IndexModel::builder().keys(doc! { field: 1 }).build();
            self.collection.create_index(index).await?;
        }
        debug!("Sweep indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MongoStore {
    async fn find(&self, key: &str) -> Result<Option<CacheEntry>> {
        let document = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(document.map(CacheEntry::from))
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let document = CacheDocument::from(entry);
        self.collection
            .replace_one(doc! { "_id": entry.key.as_str() }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn update_refresh_before(
        &self,
        key: &str,
        refresh_before: DateTime<Utc>,
    ) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": key, "slidingDurationSeconds": { "$exists": true } },
                doc! { "$set": { "refreshBefore": to_bson(refresh_before) } },
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }

    async fn delete_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        let mut filter = expired_filter(now);
        filter.insert("_id", key);
        self.collection.delete_one(filter).await?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = self.collection.delete_many(expired_filter(now)).await?;
        Ok(result.deleted_count)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryOptions;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn test_document_layout() {
        let clock = ManualClock::default();
        let entry = CacheEntry::create(
            &clock,
            "key",
            b"value".to_vec(),
            &EntryOptions::new()
                .with_absolute_expiration_relative_to_now(Duration::seconds(60))
                .with_sliding_expiration(Duration::milliseconds(1500)),
        );

        let document = bson::to_document(&CacheDocument::from(&entry)).unwrap();

        assert_eq!(document.get_str("_id").unwrap(), "key");
        assert_eq!(document.get_binary_generic("value").unwrap(), b"value");
        assert_eq!(document.get_f64("slidingDurationSeconds").unwrap(), 1.5);
        assert_eq!(
            document.get_datetime("expiresAt").unwrap().timestamp_millis(),
            (clock.now() + Duration::seconds(60)).timestamp_millis()
        );
        assert!(document.contains_key("refreshBefore"));
    }

    #[test]
    fn test_document_omits_absent_fields() {
        let clock = ManualClock::default();
        let entry = CacheEntry::create(&clock, "key", Vec::new(), &EntryOptions::new());

        let document = bson::to_document(&CacheDocument::from(&entry)).unwrap();

        assert!(!document.contains_key("expiresAt"));
        assert!(!document.contains_key("slidingDurationSeconds"));
        assert!(!document.contains_key("refreshBefore"));
    }

    #[test]
    fn test_document_back_to_entry() {
        let clock = ManualClock::default();
        let entry = CacheEntry::create(
            &clock,
            "key",
            vec![0, 1, 2, 255],
            &EntryOptions::new().with_sliding_expiration(Duration::seconds(10)),
        );

        let restored = CacheEntry::from(CacheDocument::from(&entry));

        assert_eq!(restored, entry);
    }

    #[test]
    fn test_document_with_unusable_sliding_duration() {
        let refresh_before = ManualClock::default().now() + Duration::seconds(10);
        let document = |seconds: f64| CacheDocument {
            key: "key".into(),
            value: Binary {
                subtype: BinarySubtype::Generic,
                bytes: b"value".to_vec(),
            },
            expires_at: None,
            sliding_duration_seconds: Some(seconds),
            refresh_before: Some(to_bson(refresh_before)),
        };

        for seconds in [-1e300, -5.0, f64::NAN, f64::NEG_INFINITY] {
            let entry = CacheEntry::from(document(seconds));
            assert_eq!(entry.sliding_duration(), Some(Duration::zero()), "{}", seconds);
            assert_eq!(entry.refresh_before(), Some(refresh_before));
        }

        let entry = CacheEntry::from(document(1e300));
        assert!(entry.sliding_duration().unwrap() > Duration::days(365));
    }

    #[test]
    fn test_expired_filter_shape() {
        let filter = expired_filter(ManualClock::default().now());
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_requires_connection_string() {
        let config = Config::default();
        let result = MongoStore::connect(&config).await;
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_connect_requires_database_name() {
        let config = Config {
            connection_string: Some("mongodb://localhost:27017".into()),
            ..Config::default()
        };
        let result = MongoStore::connect(&config).await;
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }
}
