//! Drain behaviour with requests in flight.

use std::time::{Duration, Instant};

use hostgate::config::options::{shutdown_request_timeout, shutdown_timeout};
use hostgate::{LifecycleState, ServerError};
use tokio_util::sync::CancellationToken;

mod common;

fn get(addr: std::net::SocketAddr) -> tokio::task::JoinHandle<reqwest::Result<reqwest::Response>> {
    tokio::spawn(async move { reqwest::get(format!("http://{}/", addr)).await })
}

#[tokio::test]
async fn in_flight_request_finishes_during_drain() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::sleeper(Duration::from_millis(200)))
            .option(shutdown_timeout(Duration::from_secs(5)))
            .option(shutdown_request_timeout(Duration::from_secs(5))),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.stop(CancellationToken::new()).await.unwrap();

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.text().await.unwrap(), "slept");
    assert!(!server.shutdown_token().was_forced());
    assert_eq!(server.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn request_budget_forces_cancellation() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::until_cancelled())
            .option(shutdown_timeout(Duration::from_secs(5)))
            .option(shutdown_request_timeout(Duration::from_millis(100))),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.stop(CancellationToken::new()).await.unwrap();

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status().as_u16(), 503);
    assert!(server.shutdown_token().was_forced());
}

#[tokio::test]
async fn forced_stop_still_waits_for_drain() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::slow_after_cancel(Duration::from_millis(400)))
            .option(shutdown_timeout(Duration::from_secs(5)))
            .option(shutdown_request_timeout(Duration::from_millis(100))),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let begun = Instant::now();
    server.stop(CancellationToken::new()).await.unwrap();
    assert!(begun.elapsed() >= Duration::from_millis(400));
    assert!(server.shutdown_token().was_forced());

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status().as_u16(), 503);
    assert_eq!(res.text().await.unwrap(), "cleaned up");
}

#[tokio::test]
async fn disabled_budgets_wait_for_natural_drain() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::sleeper(Duration::from_millis(300)))
            .option(shutdown_timeout(Duration::ZERO))
            .option(shutdown_request_timeout(Duration::ZERO)),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let begun = Instant::now();
    server.stop(CancellationToken::new()).await.unwrap();
    assert!(begun.elapsed() >= Duration::from_millis(200));
    assert!(!server.shutdown_token().was_forced());
    assert_eq!(server.state(), LifecycleState::Stopped);

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status().as_u16(), 200);
}

#[tokio::test]
async fn shutdown_timeout_closes_stuck_connections() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::sleeper(Duration::from_secs(60)))
            .option(shutdown_timeout(Duration::from_millis(200)))
            .option(shutdown_request_timeout(Duration::ZERO)),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let begun = Instant::now();
    let err = server.stop(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ServerError::DrainTimeout { .. }));
    assert!(begun.elapsed() < Duration::from_secs(5));
    assert_eq!(server.state(), LifecycleState::Stopped);
    assert!(!server.shutdown_token().was_forced());

    assert!(pending.await.unwrap().is_err());
}

#[tokio::test]
async fn cancelled_stop_context_interrupts_drain() {
    let (mut server, addr) = common::start(
        common::builder()
            .register(1, ["*"], common::sleeper(Duration::from_secs(60)))
            .option(shutdown_timeout(Duration::ZERO))
            .option(shutdown_request_timeout(Duration::ZERO)),
    )
    .await;

    let pending = get(addr);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let ctx = CancellationToken::new();
    let trigger = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = server.stop(ctx).await.unwrap_err();
    assert!(matches!(err, ServerError::DrainInterrupted));
    assert_eq!(server.state(), LifecycleState::Stopped);
    assert!(server.shutdown_token().is_cancelled());

    assert!(pending.await.unwrap().is_err());
}

#[tokio::test]
async fn stop_twice_is_harmless() {
    let (mut server, _) = common::start(common::builder()).await;
    server.stop(CancellationToken::new()).await.unwrap();
    server.stop(CancellationToken::new()).await.unwrap();
    assert_eq!(server.state(), LifecycleState::Stopped);
}
