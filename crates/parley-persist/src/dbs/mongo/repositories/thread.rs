use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;
use crate::models::{pair_key, ThreadId, UserId};
use crate::pagination::{Page, PageRequest};

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let pair = IndexModel::builder()
            .keys(doc! { "pair_key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let participants = IndexModel::builder().keys(doc! { "participants": 1 }).build();
        self.collection.create_indexes([pair, participants]).await?;
        Ok(())
    }

    pub async fn insert_thread(&self, thread: &MongoThread) -> Result<()> {
        self.collection.insert_one(thread).await?;
        Ok(())
    }

    /// Get thread by ID
    pub async fn get_thread(&self, thread_id: ThreadId) -> Result<Option<MongoThread>> {
        Ok(self.collection.find_one(doc! { "_id": thread_id }).await?)
    }

    pub async fn find_overlapping(&self, participants: &[UserId]) -> Result<Option<MongoThread>> {
        let filter = doc! { "participants": { "$in": participants.to_vec() } };
        Ok(self.collection.find_one(filter).sort(doc! { "_id": 1 }).await?)
    }

    pub async fn find_by_pair_key(&self, key: &str) -> Result<Option<MongoThread>> {
        Ok(self.collection.find_one(doc! { "pair_key": key }).await?)
    }

    /// Every thread containing the user, unpaginated
    pub async fn find_for_user(&self, user_id: UserId) -> Result<Vec<MongoThread>> {
        let threads = self
            .collection
            .find(doc! { "participants": user_id })
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    pub async fn list_all(&self, page: PageRequest) -> Result<Page<MongoThread>> {
        self.paginate(doc! {}, page).await
    }

    /// List threads for a user
    pub async fn list_for_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<MongoThread>> {
        let filter = doc! { "participants": user_id };
        self.paginate(filter, page).await
    }

    async fn paginate(&self, filter: Document, page: PageRequest) -> Result<Page<MongoThread>> {
        let total = self.collection.count_documents(filter.clone()).await?;
        let items = self
            .collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .skip(page.offset)
            .limit(i64::try_from(page.limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(Page { items, total })
    }

    /// Replace participants, returning the updated document
    pub async fn set_participants(
        &self,
        thread_id: ThreadId,
        participants: &[UserId],
        updated: DateTime<Utc>,
    ) -> Result<Option<MongoThread>> {
        let update = doc! {
            "$set": {
                "participants": participants.to_vec(),
                "pair_key": pair_key(participants),
                "updated": bson::to_bson(&updated)?,
            }
        };
        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": thread_id }, update)
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn touch(&self, thread_id: ThreadId, updated: DateTime<Utc>) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": thread_id },
                doc! { "$set": { "updated": bson::to_bson(&updated)? } },
            )
            .await?;
        Ok(())
    }

    /// Returns whether a thread was deleted
    pub async fn delete_thread(&self, thread_id: ThreadId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": thread_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
