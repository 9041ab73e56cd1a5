use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;
use crate::models::{MessageId, ThreadId, UserId};
use crate::pagination::{Page, PageRequest};

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let by_thread = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "is_read": 1 })
            .build();
        let by_sender = IndexModel::builder().keys(doc! { "sender": 1 }).build();
        self.collection.create_indexes([by_thread, by_sender]).await?;
        Ok(())
    }

    /// Save a single message
    pub async fn save_message(&self, message: &MongoMessage) -> Result<MessageId> {
        self.collection.insert_one(message).await?;
        Ok(message.id)
    }

    pub async fn get_message(&self, message_id: MessageId) -> Result<Option<MongoMessage>> {
        Ok(self.collection.find_one(doc! { "_id": message_id }).await?)
    }

    pub async fn list_all(&self, page: PageRequest) -> Result<Page<MongoMessage>> {
        self.paginate(doc! {}, page).await
    }

    /// Get messages with pagination
    pub async fn get_messages_paginated(&self, thread_id: ThreadId, page: PageRequest) -> Result<Page<MongoMessage>> {
        self.paginate(doc! { "thread_id": thread_id }, page).await
    }

    async fn paginate(&self, filter: Document, page: PageRequest) -> Result<Page<MongoMessage>> {
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

    /// Count unread messages across the given threads
    pub async fn count_unread(&self, thread_ids: &[ThreadId]) -> Result<u64> {
        if thread_ids.is_empty() {
            return Ok(0);
        }
        let filter = doc! {
            "thread_id": { "$in": thread_ids.to_vec() },
            "is_read": false,
        };
        Ok(self.collection.count_documents(filter).await?)
    }

    pub async fn mark_read(&self, message_id: MessageId) -> Result<Option<MongoMessage>> {
        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": message_id }, doc! { "$set": { "is_read": true } })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_for_thread(&self, thread_id: ThreadId) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "thread_id": thread_id }).await?;
        Ok(result.deleted_count)
    }

    pub async fn move_to_thread(&self, from: ThreadId, into: ThreadId) -> Result<u64> {
        let result = self
            .collection
            .update_many(doc! { "thread_id": from }, doc! { "$set": { "thread_id": into } })
            .await?;
        Ok(result.modified_count)
    }

    pub async fn delete_for_sender(&self, sender: UserId) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "sender": sender }).await?;
        Ok(result.deleted_count)
    }
}
