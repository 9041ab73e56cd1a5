use mongodb::options::ReturnDocument;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoCounter;
use crate::error::{PersistError, Result};

/// Hands out monotonically increasing integer ids, one sequence per name.
#[derive(Clone)]
pub struct MongoCounterRepository {
    collection: Collection<MongoCounter>,
}

impl MongoCounterRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("counters");
        Self { collection }
    }

    /// Atomically increment and return the sequence for `name`
    pub async fn next_id(&self, name: &str) -> Result<i64> {
        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal(format!("counter {} was not upserted", name)))?;
        Ok(counter.seq)
    }
}
