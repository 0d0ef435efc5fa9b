//! Scripted walk through the users operations
//!
//! Every step runs under one shared deadline. A failing step is logged and the
//! sequence carries on with the next one.

use std::future::Future;
use std::sync::Arc;
use steadydb_connection::{ConnectionError, ConnectionManager, ExecutionContext, RetryExecutor};

use crate::config::RetrySettings;
use crate::users;

/// Run a single-attempt operation, giving up when the context is done
async fn bounded<T>(
    ctx: &ExecutionContext,
    operation: impl Future<Output = Result<T, ConnectionError>>,
) -> Result<T, ConnectionError> {
    tokio::select! {
        biased;
        _ = ctx.done() => Err(ConnectionError::Cancelled),
        result = operation => result,
    }
}

fn report<T>(step: &str, result: Result<T, ConnectionError>) -> Option<T> {
    match result {
        Ok(value) => {
            tracing::info!(step, "step succeeded");
            Some(value)
        }
        Err(err) => {
            tracing::warn!(step, error = %err, kind = ?err.kind(), "step failed");
            None
        }
    }
}

pub async fn run(manager: Arc<ConnectionManager>, retry: &RetrySettings) {
    let ctx = ExecutionContext::with_timeout(retry.operation_timeout());
    let executor = RetryExecutor::new(Arc::clone(&manager));
    let policy = retry.policy();

    if let Some(user) = report(
        "create user",
        bounded(&ctx, users::create_user(&manager, "John Doe", "john@example.com")).await,
    ) {
        tracing::info!(id = user.id, name = %user.name, "created user");
    }

    if let Some(user) = report(
        "create user with retry",
        users::create_user_with_retry(&executor, &ctx, &policy, "Jane Doe", "jane@example.com")
            .await,
    ) {
        tracing::info!(id = user.id, name = %user.name, "created user with retry");
    }

    if let Some(all) = report("list users", bounded(&ctx, users::list_users(&manager)).await) {
        for user in &all {
            tracing::info!(id = user.id, name = %user.name, email = %user.email, "user");
        }
    }

    if let Some(user) = report(
        "get user",
        bounded(&ctx, users::get_user_by_id(&manager, 2)).await,
    ) {
        tracing::info!(id = user.id, name = %user.name, email = %user.email, "fetched user");
    }

    report(
        "update email",
        bounded(
            &ctx,
            users::update_user_email(&manager, 1, "john.doe@example.com"),
        )
        .await,
    );

    if let Some(deleted) = report(
        "delete users",
        bounded(&ctx, users::delete_users(&manager)).await,
    ) {
        tracing::info!(deleted, "deleted users");
    }
}
