//! PostgreSQL connection implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use steadydb_core::{Column, Connection, QueryResult, Result, Row, StatementResult, Value};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Statement};

use crate::error::map_postgres_error;
use crate::value::{PgValue, bind_params, postgres_to_value};

/// One physical PostgreSQL session
///
/// The protocol task that drives the socket runs on the ambient tokio runtime
/// and is aborted on `close`.
pub struct PostgresConnection {
    client: Client,
    driver_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PostgresConnection {
    pub(crate) fn new(client: Client, driver_task: JoinHandle<()>) -> Self {
        Self {
            client,
            driver_task: Mutex::new(Some(driver_task)),
            closed: AtomicBool::new(false),
        }
    }

    async fn prepare(&self, sql: &str) -> Result<Statement> {
        self.client
            .prepare(sql)
            .await
            .map_err(|e| map_postgres_error(&e))
    }
}

fn as_refs(values: &[PgValue]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgresql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let statement = self.prepare(sql).await?;
        let values = bind_params(statement.params(), params)?;

        let affected_rows = self
            .client
            .execute(&statement, &as_refs(&values))
            .await
            .map_err(|e| map_postgres_error(&e))?;

        tracing::debug!(affected_rows, "statement executed");
        Ok(StatementResult { affected_rows })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let statement = self.prepare(sql).await?;
        let values = bind_params(statement.params(), params)?;

        let pg_rows = self
            .client
            .query(&statement, &as_refs(&values))
            .await
            .map_err(|e| map_postgres_error(&e))?;

        // Take columns from the statement so empty results still describe them
        let columns: Vec<Column> = statement
            .columns()
            .iter()
            .map(|col| Column {
                name: col.name().to_string(),
                type_name: col.type_().name().to_string(),
            })
            .collect();
        let column_names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();

        let mut rows = Vec::with_capacity(pg_rows.len());
        for pg_row in &pg_rows {
            let values = (0..columns.len())
                .map(|idx| postgres_to_value(pg_row, idx))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::new(Arc::clone(&column_names), values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(row_count = rows.len(), execution_time_ms, "query executed");

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("closing PostgreSQL connection");
        if let Some(task) = self.driver_task.lock().take() {
            task.abort();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.client.is_closed()
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        if let Some(task) = self.driver_task.get_mut().take() {
            task.abort();
        }
    }
}
