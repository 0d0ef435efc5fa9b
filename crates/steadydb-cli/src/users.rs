//! The `users` table and its operations
//!
//! Single-step operations fetch a probed handle from the manager and run once.
//! `create_user_with_retry` goes through the retry executor instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steadydb_connection::{
    ConnectionError, ConnectionManager, ConnectionPool, ExecutionContext, RetryExecutor,
    RetryPolicy,
};
use steadydb_core::{Row, StoreError, Value};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const USER_COLUMNS: &str = "id, name, email, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        let column = |name: &str| {
            row.get_by_name(name)
                .ok_or_else(|| StoreError::Driver(format!("missing column {}", name)))
        };
        let text = |name: &str| {
            column(name)?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| StoreError::Driver(format!("column {} is not text", name)))
        };

        Ok(Self {
            id: column("id")?
                .as_i64()
                .ok_or_else(|| StoreError::Driver("column id is not an integer".into()))?,
            name: text("name")?,
            email: text("email")?,
            created_at: column("created_at")?
                .as_datetime()
                .ok_or_else(|| StoreError::Driver("column created_at is not a timestamp".into()))?,
        })
    }
}

fn not_found(id: i64) -> StoreError {
    StoreError::NotFound(format!("user {}", id))
}

pub async fn ensure_schema(manager: &ConnectionManager) -> Result<(), ConnectionError> {
    let pool = manager.get_connection().await?;
    pool.execute(CREATE_TABLE, &[]).await?;
    Ok(())
}

async fn insert_user(pool: &ConnectionPool, name: &str, email: &str) -> Result<User, StoreError> {
    let sql = format!(
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {}",
        USER_COLUMNS
    );
    let result = pool
        .query(&sql, &[Value::from(name), Value::from(email)])
        .await?;
    let row = result
        .into_first_row()
        .ok_or_else(|| StoreError::Driver("insert returned no row".into()))?;
    User::from_row(&row)
}

pub async fn create_user(
    manager: &ConnectionManager,
    name: &str,
    email: &str,
) -> Result<User, ConnectionError> {
    let pool = manager.get_connection().await?;
    let user = insert_user(&pool, name, email).await?;
    tracing::debug!(id = user.id, "user created");
    Ok(user)
}

/// Insert a user, retrying transport failures with reconnection
pub async fn create_user_with_retry(
    executor: &RetryExecutor,
    ctx: &ExecutionContext,
    policy: &RetryPolicy,
    name: &str,
    email: &str,
) -> Result<User, ConnectionError> {
    executor
        .execute(ctx, policy, |pool| async move {
            insert_user(&pool, name, email).await
        })
        .await
}

pub async fn list_users(manager: &ConnectionManager) -> Result<Vec<User>, ConnectionError> {
    let pool = manager.get_connection().await?;
    let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
    let result = pool.query(&sql, &[]).await?;
    let users = result
        .rows
        .iter()
        .map(User::from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub async fn get_user_by_id(manager: &ConnectionManager, id: i64) -> Result<User, ConnectionError> {
    let pool = manager.get_connection().await?;
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let result = pool.query(&sql, &[Value::Int64(id)]).await?;
    let row = result.into_first_row().ok_or_else(|| not_found(id))?;
    Ok(User::from_row(&row)?)
}

pub async fn update_user_email(
    manager: &ConnectionManager,
    id: i64,
    email: &str,
) -> Result<(), ConnectionError> {
    let pool = manager.get_connection().await?;
    let result = pool
        .execute(
            "UPDATE users SET email = $1 WHERE id = $2",
            &[Value::from(email), Value::Int64(id)],
        )
        .await?;
    if result.affected_rows == 0 {
        return Err(not_found(id).into());
    }
    Ok(())
}

pub async fn delete_user(manager: &ConnectionManager, id: i64) -> Result<(), ConnectionError> {
    let pool = manager.get_connection().await?;
    let result = pool
        .execute("DELETE FROM users WHERE id = $1", &[Value::Int64(id)])
        .await?;
    if result.affected_rows == 0 {
        return Err(not_found(id).into());
    }
    Ok(())
}

/// Remove every user; returns how many were deleted
pub async fn delete_users(manager: &ConnectionManager) -> Result<u64, ConnectionError> {
    let pool = manager.get_connection().await?;
    let result = pool.execute("DELETE FROM users", &[]).await?;
    Ok(result.affected_rows)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use steadydb_core::{
        Connection, ConnectionConfig, ConnectionFactory, QueryResult, StatementResult,
    };

    use super::*;

    /// Answers every query with `rows` and every statement with `affected_rows`
    #[derive(Clone, Default)]
    struct StubFactory {
        rows: Vec<Row>,
        affected_rows: u64,
    }

    struct StubConnection {
        script: StubFactory,
        closed: AtomicBool,
    }

    #[async_trait]
    impl Connection for StubConnection {
        fn driver_name(&self) -> &str {
            "stub"
        }

        async fn execute(
            &self,
            _sql: &str,
            _params: &[Value],
        ) -> steadydb_core::Result<StatementResult> {
            Ok(StatementResult {
                affected_rows: self.script.affected_rows,
            })
        }

        async fn query(
            &self,
            _sql: &str,
            _params: &[Value],
        ) -> steadydb_core::Result<QueryResult> {
            Ok(QueryResult {
                rows: self.script.rows.clone(),
                ..QueryResult::empty()
            })
        }

        async fn close(&self) -> steadydb_core::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectionFactory for StubFactory {
        async fn create(&self) -> steadydb_core::Result<Arc<dyn Connection>> {
            Ok(Arc::new(StubConnection {
                script: self.clone(),
                closed: AtomicBool::new(false),
            }))
        }
    }

    async fn manager_with(script: StubFactory) -> Arc<ConnectionManager> {
        let config = ConnectionConfig::new("stub://app@localhost/test").with_max_retries(1);
        ConnectionManager::connect(config, script).await.unwrap()
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ConnectionError>, id: i64) {
        assert_eq!(
            result.unwrap_err(),
            ConnectionError::Operation(StoreError::NotFound(format!("user {}", id)))
        );
    }

    fn row(values: Vec<Value>) -> Row {
        Row::new(
            ["id", "name", "email", "created_at"].map(String::from).to_vec(),
            values,
        )
    }

    #[test]
    fn test_user_from_row() {
        let created_at = Utc::now();
        let user = User::from_row(&row(vec![
            Value::Int64(2),
            Value::from("Jane Doe"),
            Value::from("jane@example.com"),
            Value::DateTimeUtc(created_at),
        ]))
        .unwrap();

        assert_eq!(user.id, 2);
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.created_at, created_at);
    }

    #[test]
    fn test_user_from_row_with_null_email() {
        let err = User::from_row(&row(vec![
            Value::Int64(2),
            Value::from("Jane Doe"),
            Value::Null,
            Value::DateTimeUtc(Utc::now()),
        ]))
        .unwrap_err();
        assert!(matches!(err, StoreError::Driver(_)));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let manager = manager_with(StubFactory::default()).await;

        assert_not_found(get_user_by_id(&manager, 42).await, 42);
        assert_not_found(update_user_email(&manager, 42, "x@example.com").await, 42);
        assert_not_found(delete_user(&manager, 42).await, 42);
    }

    #[tokio::test]
    async fn test_existing_user_is_found() {
        let created_at = Utc::now();
        let manager = manager_with(StubFactory {
            rows: vec![row(vec![
                Value::Int64(2),
                Value::from("Jane Doe"),
                Value::from("jane@example.com"),
                Value::DateTimeUtc(created_at),
            ])],
            affected_rows: 1,
        })
        .await;

        let user = get_user_by_id(&manager, 2).await.unwrap();
        assert_eq!(user.name, "Jane Doe");
        assert!(update_user_email(&manager, 2, "jane.doe@example.com").await.is_ok());
        assert!(delete_user(&manager, 2).await.is_ok());
        assert_eq!(list_users(&manager).await.unwrap(), vec![user]);
    }

    #[tokio::test]
    async fn test_delete_users_returns_count() {
        let manager = manager_with(StubFactory {
            affected_rows: 3,
            ..StubFactory::default()
        })
        .await;
        assert_eq!(delete_users(&manager).await.unwrap(), 3);

        let empty = manager_with(StubFactory::default()).await;
        assert_eq!(delete_users(&empty).await.unwrap(), 0);
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!not_found(7).is_retryable());
        assert_eq!(not_found(7).to_string(), "Not found: user 7");
    }
}
