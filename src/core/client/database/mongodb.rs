use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument, UpdateOptions};
use mongodb::{Client, Collection, Database};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::constant::{COUNTERS_COLLECTION, RECORDS_COLLECTION};
use super::error::DatabaseError;
use super::RecordRepository;
use crate::types::params::DatabaseArgs;
use crate::types::record::{JobMonitorRecord, JobMonitorRecordUpdates, JobStatus};

pub trait ToDocument {
    fn to_document(&self) -> Result<Document, DatabaseError>;
}

impl<T: Serialize> ToDocument for T {
    fn to_document(&self) -> Result<Document, DatabaseError> {
        let doc = bson::to_bson(self)?;

        if let Bson::Document(doc) = doc {
            Ok(doc)
        } else {
            Err(DatabaseError::FailedToSerializeDocument(format!("Failed to serialize document: {}", doc)))
        }
    }
}

/// MongoDB-backed record store.
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseArgs) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = Arc::new(client.database(&config.database_name));
        Ok(Self { client, database })
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn record_collection(&self) -> Collection<JobMonitorRecord> {
        self.database.collection(RECORDS_COLLECTION)
    }

    /// Storage-assigned identities come from an atomically incremented
    /// sequence counter, one counter document per collection.
    async fn next_record_id(&self) -> Result<i64, DatabaseError> {
        let options = FindOneAndUpdateOptions::builder().upsert(true).return_document(ReturnDocument::After).build();
        let counter = self
            .database
            .collection::<Document>(COUNTERS_COLLECTION)
            .find_one_and_update(doc! { "_id": RECORDS_COLLECTION }, doc! { "$inc": { "seq": 1_i64 } }, options)
            .await?
            .ok_or_else(|| DatabaseError::UpdateFailed("Counter upsert returned no document".to_string()))?;

        counter.get_i64("seq").map_err(|e| DatabaseError::MalformedDocument(format!("Counter seq field: {}", e)))
    }
}

#[async_trait]
impl RecordRepository for MongoDbClient {
    async fn create_record(&self, record: JobMonitorRecord) -> Result<JobMonitorRecord, DatabaseError> {
        let mut record = record;
        record.id = self.next_record_id().await?;

        let filter = doc! {
            "job_id": &record.job_id,
            "attempt": record.attempt as i32,
        };

        let options = UpdateOptions::builder().upsert(true).build();
        let update = doc! { "$setOnInsert": record.to_document()? };
        let result = self.record_collection().update_one(filter, update, options).await?;

        if result.matched_count == 0 {
            debug!(record_id = record.id, job_id = %record.job_id, attempt = record.attempt, "Record created");
            Ok(record)
        } else {
            Err(DatabaseError::ItemAlreadyExists(format!(
                "Record already exists for job {} attempt {}",
                record.job_id, record.attempt
            )))
        }
    }

    async fn get_record_by_id(&self, id: i64) -> Result<Option<JobMonitorRecord>, DatabaseError> {
        Ok(self.record_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn get_record_by_job_uuid(&self, job_uuid: Uuid) -> Result<Option<JobMonitorRecord>, DatabaseError> {
        Ok(self.record_collection().find_one(doc! { "job_uuid": job_uuid.to_string() }, None).await?)
    }

    async fn update_record(
        &self,
        current: &JobMonitorRecord,
        update: JobMonitorRecordUpdates,
    ) -> Result<JobMonitorRecord, DatabaseError> {
        let filter = doc! { "id": current.id };
        let updates = update.to_document()?;

        // Separate $set and $unset operations
        let mut set_doc = Document::new();
        let mut unset_doc = Document::new();

        for (key, value) in updates.iter() {
            if value == &Bson::Null {
                unset_doc.insert(key, "");
            } else {
                set_doc.insert(key, value);
            }
        }

        let mut update_doc = doc! { "$set": set_doc };
        if !unset_doc.is_empty() {
            update_doc.insert("$unset", unset_doc);
        }

        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();

        self.record_collection().find_one_and_update(filter, update_doc, options).await?.ok_or_else(|| {
            warn!(record_id = current.id, "Update failed - record missing");
            DatabaseError::UpdateFailed(format!("Record {} no longer exists", current.id))
        })
    }

    async fn get_records_by_job_id(&self, job_id: &str) -> Result<Vec<JobMonitorRecord>, DatabaseError> {
        let options = FindOptions::builder().sort(doc! { "started_at": -1 }).build();
        let cursor = self.record_collection().find(doc! { "job_id": job_id }, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_latest_record_by_job_id(&self, job_id: &str) -> Result<Option<JobMonitorRecord>, DatabaseError> {
        let options = FindOneOptions::builder().sort(doc! { "attempt": -1 }).build();
        Ok(self.record_collection().find_one(doc! { "job_id": job_id }, options).await?)
    }

    async fn get_records_by_status(&self, status: JobStatus) -> Result<Vec<JobMonitorRecord>, DatabaseError> {
        let filter = doc! { "status": bson::to_bson(&status)? };
        let options = FindOptions::builder().sort(doc! { "started_at": -1 }).build();
        let cursor = self.record_collection().find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_records_started_since(&self, since: DateTime<Utc>) -> Result<Vec<JobMonitorRecord>, DatabaseError> {
        // started_at is stored as epoch seconds, compare in the same unit
        let filter = doc! { "started_at": { "$gte": since.timestamp() } };
        let options = FindOptions::builder().sort(doc! { "started_at": -1 }).build();
        let cursor = self.record_collection().find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }
}
