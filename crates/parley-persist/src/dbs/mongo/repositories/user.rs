use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoUser;
use crate::error::Result;
use crate::models::UserId;

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("users");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let username = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(username).await?;
        Ok(())
    }

    pub async fn insert_user(&self, user: &MongoUser) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<Option<MongoUser>> {
        Ok(self.collection.find_one(doc! { "_id": user_id }).await?)
    }

    /// Number of the given ids that exist
    pub async fn count_existing(&self, user_ids: &[UserId]) -> Result<u64> {
        let filter = doc! { "_id": { "$in": user_ids.to_vec() } };
        Ok(self.collection.count_documents(filter).await?)
    }

    /// Returns whether a user was deleted
    pub async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
