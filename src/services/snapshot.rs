//! Consistent concurrent reads over one exported PostgreSQL snapshot.
//!
//! A single Postgres connection runs one statement at a time, so concurrent
//! queries need several connections. To keep them all on the same instant the
//! leader transaction exports its snapshot and every reader imports it before
//! running anything. All transactions are REPEATABLE READ and READ ONLY.

use std::time::Duration;

use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::errors::AppError;

/// A read-only transaction bound to an exported snapshot.
pub type ReadTx = Transaction<'static, Postgres>;

/// Leader transaction plus the means to open readers on its snapshot.
pub struct SnapshotScope {
    pool: PgPool,
    leader: ReadTx,
    snapshot_id: String,
    acquire_timeout: Duration,
    statement_timeout: Duration,
}

impl SnapshotScope {
    /// Open the leader transaction and export its snapshot.
    pub async fn open(
        pool: &PgPool,
        acquire_timeout: Duration,
        statement_timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut leader = begin_read_only(pool, acquire_timeout, statement_timeout).await?;
        let snapshot_id: String = sqlx::query_scalar("SELECT pg_export_snapshot()")
            .fetch_one(&mut *leader)
            .await?;

        if !is_snapshot_id(&snapshot_id) {
            return Err(AppError::Internal(format!(
                "Unexpected snapshot identifier '{snapshot_id}'"
            )));
        }

        tracing::debug!(snapshot_id = %snapshot_id, "Exported read snapshot");

        Ok(Self {
            pool: pool.clone(),
            leader,
            snapshot_id,
            acquire_timeout,
            statement_timeout,
        })
    }

    /// A read-only transaction that sees exactly what the leader sees.
    ///
    /// Only valid while the scope (and therefore the leader) is open.
    pub async fn reader(&self) -> Result<ReadTx, AppError> {
        let mut tx =
            begin_read_only(&self.pool, self.acquire_timeout, self.statement_timeout).await?;
        let sql = format!("SET TRANSACTION SNAPSHOT '{}'", self.snapshot_id);
        Executor::execute(&mut *tx, sqlx::raw_sql(&sql)).await?;
        Ok(tx)
    }

    /// `N` readers opened up front, so a concurrent group never waits on the
    /// pool halfway through.
    pub async fn readers<const N: usize>(&self) -> Result<[ReadTx; N], AppError> {
        let mut opened = Vec::with_capacity(N);
        for _ in 0..N {
            opened.push(self.reader().await?);
        }
        opened
            .try_into()
            .map_err(|_: Vec<ReadTx>| AppError::Internal("reader count mismatch".to_string()))
    }

    /// Release the leader. Readers must already be finished.
    pub async fn close(self) -> Result<(), AppError> {
        self.leader.rollback().await?;
        Ok(())
    }
}

/// Begin a REPEATABLE READ, READ ONLY transaction within the acquire budget.
async fn begin_read_only(
    pool: &PgPool,
    acquire_timeout: Duration,
    statement_timeout: Duration,
) -> Result<ReadTx, AppError> {
    let mut tx = tokio::time::timeout(acquire_timeout, pool.begin())
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "No database connection available within {}s",
                acquire_timeout.as_secs()
            ))
        })??;

    // Isolation must be set before the first query of the transaction.
    Executor::execute(
        &mut *tx,
        sqlx::raw_sql("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY"),
    )
    .await?;
    let sql = format!(
        "SET LOCAL statement_timeout = {}",
        statement_timeout.as_millis()
    );
    Executor::execute(&mut *tx, sqlx::raw_sql(&sql)).await?;

    Ok(tx)
}

/// Exported snapshot ids look like `00000003-0000001B-1`.
fn is_snapshot_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}
