use serde_json::Value;
use sqlx::PgPool;

use crate::Result;

/// JSON documents keyed by `(collection, doc_id)`.
#[derive(Clone)]
pub struct PgDocumentStore {
	pool: PgPool,
	collection: String,
}
impl PgDocumentStore {
	pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
		Self { pool, collection: collection.into() }
	}

	pub async fn get(&self, doc_id: &str) -> Result<Option<Value>> {
		let row: Option<(Value,)> =
			sqlx::query_as("SELECT body FROM documents WHERE collection = $1 AND doc_id = $2")
				.bind(&self.collection)
				.bind(doc_id)
				.fetch_optional(&self.pool)
				.await?;

		Ok(row.map(|(body,)| body))
	}

	/// Replaces the whole document body.
	pub async fn put(&self, doc_id: &str, body: &Value) -> Result<()> {
		sqlx::query(
			"\
INSERT INTO documents (collection, doc_id, body, updated_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (collection, doc_id)
DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at",
		)
		.bind(&self.collection)
		.bind(doc_id)
		.bind(body)
		.execute(&self.pool)
		.await?;

		tracing::debug!(collection = %self.collection, doc_id, "Document written.");

		Ok(())
	}
}
