use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, Result, Snapshot, SnapshotQuery, SnapshotStoreError, Version,
    store::{SaveOptions, SnapshotStore, validate_snapshot_for_save},
};

/// PostgreSQL-backed snapshot store.
///
/// Optimistic concurrency is enforced with a conditional `UPDATE ... WHERE
/// version = $expected` (or `INSERT ... ON CONFLICT DO NOTHING` for new
/// aggregates) inside one transaction.
#[derive(Clone)]
pub struct PostgresSnapshotStore {
    pool: PgPool,
}

impl PostgresSnapshotStore {
    /// Creates a new PostgreSQL snapshot store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Builds the SELECT for a query.
    ///
    /// Field keys are inlined as literals so `state -> 'status'` lines up with
    /// the expression index; only plain identifiers are accepted.
    fn query_sql(query: &SnapshotQuery) -> Result<String> {
        let mut sql = String::from(
            "SELECT aggregate_type, aggregate_id, version, updated_at, state FROM snapshots WHERE 1=1",
        );
        let mut param_count = 0;

        if query.aggregate_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND aggregate_type = ${param_count}"));
        }
        for (field, _) in &query.field_equals {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(SnapshotStoreError::InvalidQuery(format!(
                    "unsupported field name: {field:?}"
                )));
            }
            param_count += 1;
            sql.push_str(&format!(" AND state -> '{field}' = ${param_count}::jsonb"));
        }

        sql.push_str(" ORDER BY updated_at ASC, aggregate_id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        Ok(sql)
    }

    fn row_to_snapshot(row: PgRow) -> Result<Snapshot> {
        Ok(Snapshot {
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            aggregate_type: row.try_get("aggregate_type")?,
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("updated_at")?,
            state: row.try_get("state")?,
        })
    }

    async fn current_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Version> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM snapshots WHERE aggregate_type = $1 AND aggregate_id = $2",
        )
        .bind(aggregate_type)
        .bind(aggregate_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(version.map(Version::new).unwrap_or(Version::initial()))
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    #[tracing::instrument(skip(self, snapshot), fields(aggregate_type = %snapshot.aggregate_type, aggregate_id = %snapshot.aggregate_id))]
    async fn save(&self, snapshot: Snapshot, options: SaveOptions) -> Result<Version> {
        validate_snapshot_for_save(&snapshot, &options)?;

        let mut tx = self.pool.begin().await?;

        let rows_affected = match options.expected_version {
            Some(expected) if expected.is_initial() => sqlx::query(
                r#"
                    INSERT INTO snapshots (aggregate_type, aggregate_id, version, updated_at, state)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (aggregate_type, aggregate_id) DO NOTHING
                    "#,
            )
            .bind(&snapshot.aggregate_type)
            .bind(snapshot.aggregate_id.as_uuid())
            .bind(snapshot.version.as_i64())
            .bind(snapshot.timestamp)
            .bind(&snapshot.state)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            Some(expected) => sqlx::query(
                r#"
                    UPDATE snapshots
                    SET version = $3, updated_at = $4, state = $5
                    WHERE aggregate_type = $1 AND aggregate_id = $2 AND version = $6
                    "#,
            )
            .bind(&snapshot.aggregate_type)
            .bind(snapshot.aggregate_id.as_uuid())
            .bind(snapshot.version.as_i64())
            .bind(snapshot.timestamp)
            .bind(&snapshot.state)
            .bind(expected.as_i64())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            None => sqlx::query(
                r#"
                    INSERT INTO snapshots (aggregate_type, aggregate_id, version, updated_at, state)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (aggregate_type, aggregate_id) DO UPDATE SET
                        version = EXCLUDED.version,
                        updated_at = EXCLUDED.updated_at,
                        state = EXCLUDED.state
                    "#,
            )
            .bind(&snapshot.aggregate_type)
            .bind(snapshot.aggregate_id.as_uuid())
            .bind(snapshot.version.as_i64())
            .bind(snapshot.timestamp)
            .bind(&snapshot.state)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        };

        if rows_affected == 0 {
            let actual =
                Self::current_version(&mut tx, &snapshot.aggregate_type, snapshot.aggregate_id)
                    .await?;
            tx.rollback().await?;

            let expected = options.expected_version.unwrap_or(Version::initial());
            tracing::warn!(%expected, %actual, "snapshot save rejected");
            metrics::counter!("snapshot_conflicts_total").increment(1);
            return Err(SnapshotStoreError::ConcurrencyConflict {
                aggregate_type: snapshot.aggregate_type,
                aggregate_id: snapshot.aggregate_id,
                expected,
                actual,
            });
        }

        tx.commit().await?;
        Ok(snapshot.version)
    }

    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<Snapshot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT aggregate_type, aggregate_id, version, updated_at, state
            FROM snapshots
            WHERE aggregate_type = $1 AND aggregate_id = $2
            "#,
        )
        .bind(aggregate_type)
        .bind(aggregate_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_snapshot).transpose()
    }

    async fn query(&self, query: SnapshotQuery) -> Result<Vec<Snapshot>> {
        let sql = Self::query_sql(&query)?;

        // Bind in the same order the placeholders were emitted
        let mut sqlx_query = sqlx::query(&sql);

        if let Some(aggregate_type) = query.aggregate_type {
            sqlx_query = sqlx_query.bind(aggregate_type);
        }
        for (_, value) in query.field_equals {
            sqlx_query = sqlx_query.bind(value);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_snapshot).collect()
    }

    async fn version_of(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM snapshots WHERE aggregate_type = $1 AND aggregate_id = $2",
        )
        .bind(aggregate_type)
        .bind(aggregate_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.map(Version::new))
    }

    async fn delete(&self, aggregate_type: &str, aggregate_id: AggregateId) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM snapshots WHERE aggregate_type = $1 AND aggregate_id = $2")
                .bind(aggregate_type)
                .bind(aggregate_id.as_uuid())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
