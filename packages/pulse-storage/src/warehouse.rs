use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{
	Result,
	models::{GrowthRate, ScoreRow},
};

const INSERT_CHUNK: usize = 1_000;

/// Score table writer and growth view reader. Table names come from validated config.
#[derive(Clone)]
pub struct PgWarehouse {
	pool: PgPool,
	scores_table: String,
	growth_table: String,
}
impl PgWarehouse {
	pub fn new(
		pool: PgPool,
		scores_table: impl Into<String>,
		growth_table: impl Into<String>,
	) -> Self {
		Self { pool, scores_table: scores_table.into(), growth_table: growth_table.into() }
	}

	/// Inserts all rows in one transaction. Returns the number of inserted rows.
	pub async fn insert_scores(&self, rows: &[ScoreRow]) -> Result<u64> {
		if rows.is_empty() {
			return Ok(0);
		}

		let mut tx = self.pool.begin().await?;
		let mut inserted = 0;

		for chunk in rows.chunks(INSERT_CHUNK) {
			let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
				"INSERT INTO {} (geo, term, date, score) ",
				self.scores_table
			));

			builder.push_values(chunk, |mut b, row| {
				b.push_bind(&row.geo).push_bind(&row.term).push_bind(row.date).push_bind(row.score);
			});

			inserted += builder.build().execute(&mut *tx).await?.rows_affected();
		}

		tx.commit().await?;

		tracing::info!(table = %self.scores_table, rows = inserted, "Score rows inserted.");

		Ok(inserted)
	}

	/// Reads up to `limit` rows of the growth view.
	///
	/// Rate columns may be any numeric type and are cast to `float8`; `date` may be a date or text
	/// column. A missing column or a value that cannot be cast is an error.
	pub async fn growth_rates(&self, limit: u32) -> Result<Vec<GrowthRate>> {
		let sql = format!(
			"\
SELECT
	name::text AS name,
	date::text AS date,
	agg_growth::float8 AS agg_growth,
	trends_growth::float8 AS trends_growth,
	news_growth::float8 AS news_growth
FROM (SELECT * FROM {} LIMIT {}) AS growth",
			self.growth_table, limit
		);
		let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

		rows.iter().map(growth_rate_from_row).collect()
	}
}

fn growth_rate_from_row(row: &PgRow) -> Result<GrowthRate> {
	Ok(GrowthRate {
		name: row.try_get("name")?,
		date: row.try_get("date")?,
		growth_rate: row.try_get("agg_growth")?,
		trends_growth: row.try_get("trends_growth")?,
		news_growth: row.try_get("news_growth")?,
	})
}
