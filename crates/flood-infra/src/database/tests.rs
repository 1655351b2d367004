#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use crate::database::entity::flood_record;
    use crate::database::postgres_store::{
        INSERT_EVENT, LOCK_SUBJECT, READ_COMMITTED, store_error,
    };
    use crate::database::{PostgresEventStore, PostgresEventTransaction};
    use flood_core::domain::{FloodPolicy, SubjectId};
    use flood_core::ports::{EventStore, EventTransaction, FloodControl};
    use flood_core::{FloodController, FloodError, StoreError};
    use sea_orm::{
        DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Statement, Transaction,
        Value,
    };

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn total(count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("total", Value::BigInt(Some(count)))])
    }

    fn subject(id: i64) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_check_within_threshold() {
        // isolation, lock, delete, insert
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(2), exec(1)])
            .append_query_results([vec![total(3)]])
            .into_connection();

        let controller = FloodController::new(
            PostgresEventStore::new(db),
            FloodPolicy::from_secs(60, 3).unwrap(),
        );

        let decision = controller.evaluate(subject(1)).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.count, 3);
        assert_eq!(decision.remaining(), 0);
    }

    #[tokio::test]
    async fn test_check_over_threshold_is_denied() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(0), exec(1)])
            .append_query_results([vec![total(4)]])
            .into_connection();

        let controller = FloodController::new(
            PostgresEventStore::new(db),
            FloodPolicy::from_secs(60, 3).unwrap(),
        );

        assert!(!controller.check(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_transaction_pins_read_committed_before_lock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(1)])
            .into_connection();
        let store = PostgresEventStore::new(db);

        let mut tx = store.begin(subject(6)).await.unwrap();
        tx.insert().await.unwrap();
        tx.commit().await.unwrap();

        let pg = DatabaseBackend::Postgres;
        assert_eq!(
            store.into_connection().into_transaction_log(),
            [Transaction::many([
                Statement::from_string(pg, "BEGIN"),
                Statement::from_sql_and_values(pg, READ_COMMITTED, []),
                Statement::from_sql_and_values(pg, LOCK_SUBJECT, [6i64.into()]),
                Statement::from_sql_and_values(pg, INSERT_EVENT, [6i64.into()]),
                Statement::from_string(pg, "COMMIT"),
            ])]
        );
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(5)])
            .into_connection();
        let store = PostgresEventStore::new(db);

        let mut tx: PostgresEventTransaction = store.begin(subject(2)).await.unwrap();
        let evicted = tx.delete_expired(Duration::from_secs(60)).await.unwrap();
        assert_eq!(evicted, 5);
    }

    #[tokio::test]
    async fn test_count_without_rows_is_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1)])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let store = PostgresEventStore::new(db);

        let mut tx = store.begin(subject(2)).await.unwrap();
        assert_eq!(tx.count_since(Duration::from_secs(60)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_surfaced() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Conn(RuntimeErr::Internal(
                "connection reset by peer".to_owned(),
            ))])
            .into_connection();

        let controller = FloodController::new(
            PostgresEventStore::new(db),
            FloodPolicy::from_secs(60, 3).unwrap(),
        );

        let err = controller.check(1).await.unwrap_err();
        assert!(matches!(err, FloodError::Store(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn test_count_failure_is_surfaced() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(0), exec(1)])
            .append_query_errors([DbErr::Custom("canceling statement".to_owned())])
            .into_connection();

        let controller = FloodController::new(
            PostgresEventStore::new(db),
            FloodPolicy::from_secs(60, 3).unwrap(),
        );

        let err = controller.check(1).await.unwrap_err();
        assert!(matches!(err, FloodError::Store(StoreError::Query(_))));
    }

    #[tokio::test]
    async fn test_list_events_for_subject() {
        let now = chrono::Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                flood_record::Model {
                    id: 1,
                    user_id: 7,
                    occurred_at: (now - chrono::Duration::seconds(5)).into(),
                },
                flood_record::Model {
                    id: 2,
                    user_id: 7,
                    occurred_at: now.into(),
                },
            ]])
            .into_connection();
        let store = PostgresEventStore::new(db);

        let events = store.events(subject(7)).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject_id, subject(7));
        assert_eq!(events[1].occurred_at, now);
    }

    #[tokio::test]
    async fn test_invalid_stored_user_id_is_a_query_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![flood_record::Model {
                id: 3,
                user_id: 0,
                occurred_at: chrono::Utc::now().into(),
            }]])
            .into_connection();
        let store = PostgresEventStore::new(db);

        let err = store.events(subject(7)).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            store_error(DbErr::Conn(RuntimeErr::Internal("down".to_owned()))),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            store_error(DbErr::RecordNotFound("flood_record".to_owned())),
            StoreError::Query(_)
        ));
    }
}
