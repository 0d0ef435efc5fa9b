//! Tests for connection pool functionality

use std::time::Duration;

use steadydb_core::{ConnectionConfig, StoreError};

use super::*;
use crate::testing::{MockFactory, MockServer};

// =============================================================================
// PoolConfig tests
// =============================================================================

#[test]
fn test_pool_config_creation() {
    let config = PoolConfig::new(2, 10);
    assert_eq!(config.max_idle(), 2);
    assert_eq!(config.max_open(), 10);
    assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
    assert!(config.max_lifetime().is_none());
}

#[test]
fn test_pool_config_zero_lifetime_means_unlimited() {
    let config = PoolConfig::new(1, 1).with_max_lifetime(Duration::ZERO);
    assert!(config.max_lifetime().is_none());
}

#[test]
fn test_pool_config_from_connection_config() {
    let config = ConnectionConfig::new("postgres://localhost/app")
        .with_max_idle_connections(10)
        .with_max_open_connections(100)
        .with_conn_max_lifetime(Duration::from_secs(3600))
        .with_acquire_timeout(Duration::from_secs(3));

    let pool_config = PoolConfig::from(&config);
    assert_eq!(pool_config.max_idle(), 10);
    assert_eq!(pool_config.max_open(), 100);
    assert_eq!(pool_config.max_lifetime(), Some(Duration::from_secs(3600)));
    assert_eq!(pool_config.acquire_timeout(), Duration::from_secs(3));
}

#[test]
fn test_pool_config_zero_open_is_unbounded() {
    let config = PoolConfig::new(10, 0);
    assert_eq!(config.max_open(), 0);
    assert_eq!(config.open_permits(), tokio::sync::Semaphore::MAX_PERMITS);
}

#[test]
fn test_pool_config_sub_millisecond_timeout_rounds_up() {
    let config = PoolConfig::new(1, 1).with_acquire_timeout(Duration::from_micros(10));
    assert_eq!(config.acquire_timeout(), Duration::from_millis(1));
}

#[test]
#[should_panic(expected = "cannot exceed max_open")]
fn test_pool_config_idle_above_open_panics() {
    PoolConfig::new(5, 2);
}

// =============================================================================
// PoolStats tests
// =============================================================================

#[test]
fn test_pool_stats_utilization() {
    let stats = PoolStats::new(1, 3, 0);
    assert_eq!(stats.total(), 4);
    assert_eq!(stats.utilization(), 0.75);
    assert_eq!(PoolStats::default().utilization(), 0.0);
}

// =============================================================================
// ConnectionPool tests
// =============================================================================

#[tokio::test]
async fn test_returned_connection_is_reused() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(2, 4), MockFactory::new(&server));

    {
        let conn = pool.get().await.unwrap();
        assert_eq!(conn.driver_name(), "mock");
        assert_eq!(pool.stats().in_use(), 1);
    }
    assert_eq!(pool.stats().idle(), 1);

    let _conn = pool.get().await.unwrap();
    assert_eq!(server.connect_attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_connections_are_bounded() {
    let server = MockServer::new();
    let config = PoolConfig::new(1, 2).with_acquire_timeout(Duration::from_millis(100));
    let pool = ConnectionPool::new(config, MockFactory::new(&server));

    let _first = pool.get().await.unwrap();
    let _second = pool.get().await.unwrap();

    let err = pool.get().await.err().unwrap();
    assert!(matches!(err, StoreError::Timeout(_)));
    assert_eq!(server.connect_attempts(), 2);
    assert_eq!(pool.stats().waiting(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_gets_returned_connection() {
    let server = MockServer::new();
    let config = PoolConfig::new(1, 1).with_acquire_timeout(Duration::from_secs(1));
    let pool = ConnectionPool::new(config, MockFactory::new(&server));

    let held = pool.get().await.unwrap();
    let waiter = async {
        let conn = pool.get().await.unwrap();
        conn.inner().driver_name().to_string()
    };
    let release = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(held);
    };

    let (driver, ()) = tokio::join!(waiter, release);
    assert_eq!(driver, "mock");
    assert_eq!(server.connect_attempts(), 1);
}

#[tokio::test]
async fn test_unbounded_pool_opens_on_demand() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(0, 0), MockFactory::new(&server));

    let mut held = Vec::new();
    for _ in 0..50 {
        held.push(pool.get().await.unwrap());
    }
    assert_eq!(pool.stats().in_use(), 50);
    assert_eq!(server.connect_attempts(), 50);

    drop(held);
    assert_eq!(pool.stats().total(), 0);
}

#[tokio::test]
async fn test_idle_connections_are_bounded() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(1, 3), MockFactory::new(&server));

    let first = pool.get().await.unwrap();
    let second = pool.get().await.unwrap();
    let third = pool.get().await.unwrap();
    assert_eq!(pool.stats().in_use(), 3);

    drop(first);
    drop(second);
    drop(third);

    let stats = pool.stats();
    assert_eq!(stats.idle(), 1);
    assert_eq!(stats.in_use(), 0);
    assert_eq!(stats.total(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connections_past_lifetime_are_retired() {
    let server = MockServer::new();
    let config = PoolConfig::new(2, 2).with_max_lifetime(Duration::from_secs(3600));
    let pool = ConnectionPool::new(config, MockFactory::new(&server));

    drop(pool.get().await.unwrap());
    assert_eq!(pool.stats().idle(), 1);

    tokio::time::advance(Duration::from_secs(3601)).await;

    let conn = pool.get().await.unwrap();
    assert!(conn.age() < Duration::from_secs(1));
    assert_eq!(server.connect_attempts(), 2);
    assert_eq!(server.closed_connections(), 1);
}

#[tokio::test]
async fn test_closed_connection_is_not_returned_to_idle() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(2, 2), MockFactory::new(&server));

    {
        let conn = pool.get().await.unwrap();
        conn.close().await.unwrap();
    }
    assert_eq!(pool.stats().idle(), 0);
}

#[tokio::test]
async fn test_close_drains_idle_and_rejects_checkout() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(2, 2), MockFactory::new(&server));

    {
        let _a = pool.get().await.unwrap();
        let _b = pool.get().await.unwrap();
    }
    assert_eq!(pool.stats().idle(), 2);

    pool.close().await;
    pool.close().await;

    assert!(pool.is_closed());
    assert_eq!(server.closed_connections(), 2);
    assert!(matches!(
        pool.get().await.err(),
        Some(StoreError::Connection(_))
    ));
}

#[tokio::test]
async fn test_checkout_failure_is_reported() {
    let server = MockServer::unreachable();
    let pool = ConnectionPool::new(PoolConfig::new(1, 1), MockFactory::new(&server));

    let err = pool.query("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(pool.stats().in_use(), 0);
}

#[tokio::test]
async fn test_ping_through_pool() {
    let server = MockServer::new();
    let pool = ConnectionPool::new(PoolConfig::new(1, 1), MockFactory::new(&server));

    assert!(pool.ping(Duration::from_secs(1)).await.is_ok());

    server.set_queries_failing(true);
    assert!(pool.ping(Duration::from_secs(1)).await.is_err());
}
