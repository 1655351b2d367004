//! PostgreSQL event store.
//!
//! Every statement reads `clock_timestamp()` rather than `now()`: `now()` is
//! frozen at transaction start, which would be stale for a transaction that
//! spent time waiting on the subject's advisory lock.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, DbConn, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Statement, TransactionTrait, Value,
};

use flood_core::StoreError;
use flood_core::domain::{Event, SubjectId};
use flood_core::ports::{EventStore, EventTransaction};

use super::entity::flood_record::{self, Entity as FloodRecord};

/// Must be the first statement of the transaction. Under REPEATABLE READ the
/// snapshot would be taken before the lock wait and miss the previous holder's
/// insert.
pub(crate) const READ_COMMITTED: &str = "SET TRANSACTION ISOLATION LEVEL READ COMMITTED";

/// Transaction-scoped lock on the subject; released on commit or rollback.
///
/// Uses the two-key advisory lock space under a `flood_record` namespace.
/// Users whose ids share the low 31 bits share a lock, which only serializes them.
pub(crate) const LOCK_SUBJECT: &str =
    "SELECT pg_advisory_xact_lock(hashtext('flood_record'), ($1 % 2147483648)::int)";

const DELETE_EXPIRED: &str = "DELETE FROM flood_record \
     WHERE user_id = $1 AND occurred_at < clock_timestamp() - make_interval(secs => $2)";

pub(crate) const INSERT_EVENT: &str =
    "INSERT INTO flood_record (user_id, occurred_at) VALUES ($1, clock_timestamp())";

const COUNT_SINCE: &str = "SELECT COUNT(*) AS total FROM flood_record \
     WHERE user_id = $1 AND occurred_at >= clock_timestamp() - make_interval(secs => $2)";

/// PostgreSQL-backed event store over the `flood_record` table.
#[derive(Debug)]
pub struct PostgresEventStore {
    db: DbConn,
}

impl PostgresEventStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn into_connection(self) -> DbConn {
        self.db
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    type Tx = PostgresEventTransaction;

    async fn begin(&self, subject: SubjectId) -> Result<PostgresEventTransaction, StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        txn.execute(statement(READ_COMMITTED, []))
            .await
            .map_err(store_error)?;
        txn.execute(statement(LOCK_SUBJECT, [subject_value(subject)]))
            .await
            .map_err(store_error)?;

        Ok(PostgresEventTransaction { txn, subject })
    }

    async fn events(&self, subject: SubjectId) -> Result<Vec<Event>, StoreError> {
        tracing::debug!(subject = %subject, "Listing flood records");

        let rows = FloodRecord::find()
            .filter(flood_record::Column::UserId.eq(subject.get()))
            .order_by_asc(flood_record::Column::OccurredAt)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        rows.into_iter().map(Event::try_from).collect()
    }
}

/// An open Postgres transaction holding one subject's advisory lock.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PostgresEventTransaction {
    txn: DatabaseTransaction,
    subject: SubjectId,
}

impl PostgresEventTransaction {
    fn windowed(&self, sql: &str, window: Duration) -> Statement {
        statement(sql, [subject_value(self.subject), window_value(window)])
    }
}

#[async_trait]
impl EventTransaction for PostgresEventTransaction {
    async fn delete_expired(&mut self, window: Duration) -> Result<u64, StoreError> {
        let result = self
            .txn
            .execute(self.windowed(DELETE_EXPIRED, window))
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn insert(&mut self) -> Result<(), StoreError> {
        self.txn
            .execute(statement(INSERT_EVENT, [subject_value(self.subject)]))
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn count_since(&mut self, window: Duration) -> Result<u64, StoreError> {
        let row = self
            .txn
            .query_one(self.windowed(COUNT_SINCE, window))
            .await
            .map_err(store_error)?;

        let total = match row {
            Some(row) => row.try_get::<i64>("", "total").map_err(store_error)?,
            None => 0,
        };

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }
}

fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

fn subject_value(subject: SubjectId) -> Value {
    subject.get().into()
}

fn window_value(window: Duration) -> Value {
    (window.as_secs() as f64).into()
}

/// Map a SeaORM error onto the store taxonomy.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    if err.sql_err().is_some() {
        return StoreError::Constraint(err.to_string());
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Connection(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}
