//! Tests for the retry processor

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("attempt failed")]
struct AttemptFailed;

/// Appends `.attemptN` to every payload; tags an error on the first
/// `fail_attempts` calls.
struct FlakyAppend {
    fail_attempts: u32,
    calls: AtomicU32,
}

impl FlakyAppend {
    fn new(fail_attempts: u32) -> Arc<Self> {
        Arc::new(Self {
            fail_attempts,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl BatchProcessor for FlakyAppend {
    async fn process_batch(
        &self,
        _ctx: &CancellationToken,
        mut batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        for part in batch.iter_mut() {
            let mut payload = part.as_bytes().to_vec();
            payload.extend_from_slice(format!(".attempt{call}").as_bytes());
            part.set_payload(payload);
            if call <= self.fail_attempts {
                part.set_error(AttemptFailed);
            }
        }
        Ok(vec![batch])
    }
}

fn backoff_ms(initial: u64, max: u64, elapsed: u64) -> BackoffConfig {
    BackoffConfig {
        initial_interval: Duration::from_millis(initial),
        max_interval: Duration::from_millis(max),
        max_elapsed_time: Duration::from_millis(elapsed),
    }
}

fn retry_over(child: Arc<dyn BatchProcessor>, backoff: BackoffConfig, max_retries: u32) -> RetryProcessor {
    RetryProcessor::new(vec![child], backoff, false, max_retries)
}

fn meta_u64(part: &Part, key: &str) -> u64 {
    part.meta_get(key).and_then(|v| v.as_u64()).unwrap()
}

#[tokio::test]
async fn succeeds_after_two_failures() {
    let retry = retry_over(FlakyAppend::new(2), backoff_ms(100, 100, 0), 0);
    let ctx = CancellationToken::new();

    let started = Instant::now();
    let out = retry
        .process_batch(&ctx, Batch::new(vec![Part::from("x")]))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(out.len(), 1);
    let part = out[0].get(0).unwrap();

    // Mutations from the failed attempts were discarded.
    assert_eq!(part.as_bytes(), b"x.attempt3");
    assert!(!part.is_errored());
    assert_eq!(meta_u64(part, "retry_count"), 2);
    assert_eq!(meta_u64(part, "backoff_duration"), 200);
    assert!(elapsed >= Duration::from_millis(200), "slept only {elapsed:?}");
}

#[tokio::test]
async fn exhaustion_returns_tagged_result_not_fatal() {
    let retry = retry_over(FlakyAppend::new(u32::MAX), backoff_ms(1, 1, 0), 2);
    let ctx = CancellationToken::new();

    let out = retry
        .process_batch(&ctx, Batch::new(vec![Part::from("x")]))
        .await
        .unwrap();

    let part = out[0].get(0).unwrap();
    assert!(part.is_errored());
    assert_eq!(meta_u64(part, "retry_count"), 2);
}

#[tokio::test]
async fn elapsed_budget_exhaustion_is_not_fatal() {
    let retry = retry_over(FlakyAppend::new(u32::MAX), backoff_ms(20, 20, 30), 0);
    let ctx = CancellationToken::new();

    let out = retry
        .process_batch(&ctx, Batch::new(vec![Part::from("x")]))
        .await
        .unwrap();
    assert!(out[0].get(0).unwrap().is_errored());
}

#[tokio::test]
async fn incoming_error_tags_are_cleared() {
    let retry = retry_over(FlakyAppend::new(0), backoff_ms(1, 1, 0), 0);
    let ctx = CancellationToken::new();

    let mut part = Part::from("x");
    part.set_error(AttemptFailed);

    let out = retry
        .process_batch(&ctx, Batch::new(vec![part]))
        .await
        .unwrap();

    // One attempt, no retries: the upstream tag did not trigger a loop.
    let part = out[0].get(0).unwrap();
    assert!(!part.is_errored());
    assert_eq!(meta_u64(part, "retry_count"), 0);
}

#[tokio::test]
async fn parts_are_retried_in_isolation() {
    // Only the "bad" part errors; the other part must not be re-executed.
    struct FailPayload {
        calls: AtomicU32,
    }

    #[async_trait]
    impl BatchProcessor for FailPayload {
        async fn process_batch(
            &self,
            _ctx: &CancellationToken,
            mut batch: Batch,
        ) -> Result<Vec<Batch>, ComponentError> {
            self.calls.fetch_add(batch.len() as u32, Ordering::SeqCst);
            for part in batch.iter_mut() {
                if part.as_bytes() == b"bad" {
                    part.set_error(AttemptFailed);
                }
            }
            Ok(vec![batch])
        }
    }

    let child = Arc::new(FailPayload {
        calls: AtomicU32::new(0),
    });
    let retry = RetryProcessor::new(
        vec![Arc::clone(&child) as Arc<dyn BatchProcessor>],
        backoff_ms(1, 1, 0),
        false,
        2,
    );
    let ctx = CancellationToken::new();

    let out = retry
        .process_batch(&ctx, Batch::new(vec![Part::from("good"), Part::from("bad")]))
        .await
        .unwrap();

    assert_eq!(out.len(), 1);
    let batch = &out[0];
    assert_eq!(batch.len(), 2);
    assert!(!batch.get(0).unwrap().is_errored());
    assert!(batch.get(1).unwrap().is_errored());

    // good ran once, bad ran twice.
    assert_eq!(child.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn parallel_mode_preserves_index_order() {
    // The first part is the slowest; output order must still match input.
    struct SlowFirst;

    #[async_trait]
    impl BatchProcessor for SlowFirst {
        async fn process_batch(
            &self,
            _ctx: &CancellationToken,
            batch: Batch,
        ) -> Result<Vec<Batch>, ComponentError> {
            if batch.get(0).is_some_and(|p| p.as_bytes() == b"a") {
                tokio::time::sleep(Duration::from_millis(40)).await;
            }
            Ok(vec![batch])
        }
    }

    let retry = RetryProcessor::new(
        vec![Arc::new(SlowFirst) as Arc<dyn BatchProcessor>],
        backoff_ms(1, 1, 0),
        true,
        0,
    );
    let ctx = CancellationToken::new();

    let out = retry
        .process_batch(
            &ctx,
            Batch::new(vec![Part::from("a"), Part::from("b"), Part::from("c")]),
        )
        .await
        .unwrap();

    let payloads: Vec<&[u8]> = out[0].iter().map(|p| p.as_bytes()).collect();
    assert_eq!(payloads, vec![b"a" as &[u8], b"b", b"c"]);
}

#[tokio::test]
async fn unbounded_retry_cancels_cleanly() {
    let retry = Arc::new(retry_over(
        FlakyAppend::new(u32::MAX),
        backoff_ms(10, 10, 0),
        0,
    ));
    let ctx = CancellationToken::new();

    let task = {
        let retry = Arc::clone(&retry);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            retry
                .process_batch(&ctx, Batch::new(vec![Part::from("x")]))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    ctx.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("retry failed to observe cancellation")
        .unwrap();
    assert!(matches!(result, Err(ComponentError::Cancelled)));
}

#[tokio::test]
async fn serial_fatal_child_error_aborts_the_batch() {
    struct Fatal;

    #[async_trait]
    impl BatchProcessor for Fatal {
        async fn process_batch(
            &self,
            _ctx: &CancellationToken,
            _batch: Batch,
        ) -> Result<Vec<Batch>, ComponentError> {
            Err(ComponentError::failed("unrecoverable"))
        }
    }

    let retry = RetryProcessor::new(
        vec![Arc::new(Fatal) as Arc<dyn BatchProcessor>],
        backoff_ms(1, 1, 0),
        false,
        0,
    );
    let ctx = CancellationToken::new();

    let err = retry
        .process_batch(&ctx, Batch::new(vec![Part::from("x")]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unrecoverable");
}
