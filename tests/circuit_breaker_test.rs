use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use payment_gateway_core::health::{check_health, DependencyChecker, PublisherChecker};
use payment_gateway_core::resilience::{
    BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState,
};

fn breaker(threshold: u32, cool_down: Duration) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(
        "publisher",
        CircuitBreakerConfig {
            failure_threshold: threshold,
            cool_down,
        },
    ))
}

async fn fail(breaker: &CircuitBreaker) {
    let _ = breaker
        .call(|| async { Err::<(), _>("downstream error") })
        .await;
}

#[tokio::test]
async fn test_circuit_breaker_state() {
    let breaker = breaker(5, Duration::from_secs(30));

    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.state().as_str(), "closed");
    assert_eq!(breaker.name(), "publisher");
}

#[tokio::test]
async fn test_circuit_breaker_with_custom_config() {
    let breaker = breaker(2, Duration::from_secs(30));

    fail(&breaker).await;
    assert_eq!(breaker.state(), CircuitState::Closed);
    fail(&breaker).await;
    assert_eq!(breaker.state(), CircuitState::Open);

    let calls = AtomicUsize::new(0);
    let result = breaker
        .call(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(())
        })
        .await;

    assert!(matches!(result, Err(BreakerError::Rejected)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_trial() {
    let breaker = breaker(1, Duration::from_millis(10));
    fail(&breaker).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let admitted = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let breaker = breaker.clone();
        let admitted = admitted.clone();
        handles.push(tokio::spawn(async move {
            breaker
                .call(|| async {
                    admitted.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, &str>(())
                })
                .await
                .is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
    assert_eq!(succeeded, 1);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_publisher_health_follows_circuit() {
    let breaker = breaker(1, Duration::from_secs(30));
    let checks: Vec<Arc<dyn DependencyChecker>> =
        vec![Arc::new(PublisherChecker::new(breaker.clone()))];

    let healthy = check_health(&checks, Instant::now()).await;
    assert_eq!(healthy.status, "healthy");

    fail(&breaker).await;
    let degraded = check_health(&checks, Instant::now()).await;

    // The publisher is not critical, so an open circuit only degrades.
    assert_eq!(degraded.status, "degraded");
    assert!(!degraded.is_unhealthy());
}
