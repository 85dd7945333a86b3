//! End-to-end stream tests

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::*;
use sluice_batch::BatchCondition;
use sluice_message::{AckResult, Batch, Part, Transaction};
use sluice_runtime::{
    BatchProcessor, ComponentError, Mapper, MapperEngine,
};

type FeedSlot = Arc<Mutex<Option<mpsc::Sender<Transaction>>>>;
type SeenSlot = Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<Vec<u8>>>>>>;

struct TestMapper {
    expr: String,
}

impl Mapper for TestMapper {
    fn map_part(&self, index: usize, batch: &Batch) -> Result<Option<Part>, ComponentError> {
        match self.expr.as_str() {
            "drop_all" => Ok(None),
            _ => Ok(Some(batch.get(index).expect("indexed part").clone())),
        }
    }

    fn map_onto(&self, index: usize, batch: &Batch) -> Result<Option<Part>, ComponentError> {
        self.map_part(index, batch)
    }
}

struct TestEngine;

impl MapperEngine for TestEngine {
    fn compile(&self, expr: &str) -> Result<Arc<dyn Mapper>, ComponentError> {
        Ok(Arc::new(TestMapper {
            expr: expr.to_string(),
        }))
    }

    fn compile_condition(&self, _expr: &str) -> Result<Arc<dyn BatchCondition>, ComponentError> {
        struct Never;
        impl BatchCondition for Never {
            fn test(&self, _parts: &[Part]) -> bool {
                false
            }
        }
        Ok(Arc::new(Never))
    }
}

struct FailBatch;

#[async_trait]
impl BatchProcessor for FailBatch {
    async fn process_batch(
        &self,
        _ctx: &CancellationToken,
        _batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        Err(ComponentError::failed("refused by processor"))
    }
}

fn test_env() -> (Arc<Environment>, FeedSlot, SeenSlot) {
    let feed: FeedSlot = Arc::new(Mutex::new(None));
    let seen: SeenSlot = Arc::new(Mutex::new(None));

    let mut env = Environment::new();
    sluice_components::register_all(&mut env);
    env.set_mapper_engine(Arc::new(TestEngine));

    {
        let feed = Arc::clone(&feed);
        env.register_input(
            "feed",
            Box::new(move |_, _, _| {
                let (tx, rx) = mpsc::channel(16);
                *feed.lock() = Some(tx);
                let sig = Signaller::new();
                let watcher = sig.clone();
                tokio::spawn(async move {
                    watcher.soft_stopped().await;
                    watcher.trigger_stopped();
                });
                Ok(InputHandle::new(rx, sig))
            }),
        );
    }

    {
        let seen = Arc::clone(&seen);
        env.register_output(
            "collect",
            Box::new(move |_, _, _| {
                let (tx, mut rx) = mpsc::channel::<Transaction>(16);
                let (seen_tx, seen_rx) = mpsc::unbounded_channel();
                *seen.lock() = Some(seen_rx);
                let sig = Signaller::new();
                let worker = sig.clone();
                tokio::spawn(async move {
                    while let Some(tran) = rx.recv().await {
                        let payloads = tran
                            .batch()
                            .iter()
                            .map(|p| p.as_bytes().to_vec())
                            .collect::<Vec<_>>();
                        let _ = seen_tx.send(payloads);
                        let _ = tran.ack(Ok(()));
                    }
                    worker.trigger_stopped();
                });
                Ok(OutputHandle::new(tx, sig))
            }),
        );
    }

    env.register_processor(
        "fail_batch",
        Box::new(|_, _, _| Ok(Arc::new(FailBatch) as Arc<dyn BatchProcessor>)),
    );

    (Arc::new(env), feed, seen)
}

async fn feed_part(
    tx: &mpsc::Sender<Transaction>,
    payload: &str,
) -> oneshot::Receiver<AckResult> {
    let (tran, ack_rx) = Transaction::new(Batch::new(vec![Part::from(payload)]));
    tx.send(tran).await.unwrap();
    ack_rx
}

#[tokio::test]
async fn batched_output_flushes_on_count_and_shutdown() {
    let (env, feed, seen) = test_env();
    let resources = Resources::new(Arc::clone(&env));

    let config: EngineConfig = r#"
        [input]
        type = "feed"

        [output]
        type = "collect"
        [output.batching]
        count = 3
    "#
    .parse()
    .unwrap();

    let stream = Stream::new(&config, &env, &resources).unwrap();
    let tx = feed.lock().take().unwrap();
    let mut seen = seen.lock().take().unwrap();

    let mut acks = Vec::new();
    for payload in ["a", "b", "c", "d", "e"] {
        acks.push(feed_part(&tx, payload).await);
    }

    let first = tokio::time::timeout(Duration::from_secs(1), seen.recv())
        .await
        .expect("count batch missing")
        .unwrap();
    assert_eq!(first, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

    // Closing the input drains the stream and flushes the remainder.
    drop(tx);

    let second = tokio::time::timeout(Duration::from_secs(1), seen.recv())
        .await
        .expect("shutdown flush missing")
        .unwrap();
    assert_eq!(second, vec![b"d".to_vec(), b"e".to_vec()]);

    for ack in acks {
        let res = tokio::time::timeout(Duration::from_secs(1), ack)
            .await
            .expect("source ack unresolved")
            .unwrap();
        assert!(res.is_ok());
    }

    stream.stop_within(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn mapping_drop_resolves_the_source_ack() {
    let (env, feed, seen) = test_env();
    let resources = Resources::new(Arc::clone(&env));

    let config: EngineConfig = r#"
        [input]
        type = "feed"

        [[pipeline.processors]]
        type = "mapping"
        mapping = "drop_all"

        [output]
        type = "collect"
    "#
    .parse()
    .unwrap();

    let stream = Stream::new(&config, &env, &resources).unwrap();
    let tx = feed.lock().take().unwrap();
    let mut seen = seen.lock().take().unwrap();

    let ack = feed_part(&tx, "vanishes").await;
    let res = tokio::time::timeout(Duration::from_secs(1), ack)
        .await
        .expect("dropped batch did not ack")
        .unwrap();
    assert!(res.is_ok());

    assert!(seen.try_recv().is_err());

    drop(tx);
    stream.stop_within(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn fatal_processor_nacks_the_source() {
    let (env, feed, _seen) = test_env();
    let resources = Resources::new(Arc::clone(&env));

    let config: EngineConfig = r#"
        [input]
        type = "feed"

        [[pipeline.processors]]
        type = "fail_batch"

        [output]
        type = "collect"
    "#
    .parse()
    .unwrap();

    let stream = Stream::new(&config, &env, &resources).unwrap();
    let tx = feed.lock().take().unwrap();

    let ack = feed_part(&tx, "doomed").await;
    let err = tokio::time::timeout(Duration::from_secs(1), ack)
        .await
        .expect("fatal error did not nack")
        .unwrap()
        .unwrap_err();
    assert_eq!(err.to_string(), "refused by processor");

    drop(tx);
    stream.stop_within(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn missing_sections_fail_construction() {
    let (env, _feed, _seen) = test_env();
    let resources = Resources::new(Arc::clone(&env));

    let config: EngineConfig = "".parse().unwrap();
    assert!(matches!(
        Stream::new(&config, &env, &resources),
        Err(StreamError::MissingInput)
    ));

    let config: EngineConfig = r#"
        [input]
        type = "feed"
    "#
    .parse()
    .unwrap();
    assert!(matches!(
        Stream::new(&config, &env, &resources),
        Err(StreamError::MissingOutput)
    ));
}

#[tokio::test]
async fn unknown_component_type_is_diagnosed() {
    let (env, _feed, _seen) = test_env();
    let resources = Resources::new(Arc::clone(&env));

    let config: EngineConfig = r#"
        [input]
        type = "kafka"

        [output]
        type = "collect"
    "#
    .parse()
    .unwrap();

    let err = Stream::new(&config, &env, &resources).unwrap_err();
    assert!(err.to_string().contains("unrecognised input type 'kafka'"));
}
