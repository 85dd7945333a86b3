//! Tests for the inproc input

use std::time::Duration;

use super::*;
use sluice_manager::Environment;
use sluice_message::{Batch, Part, Transaction};

fn empty_resources() -> Arc<Resources> {
    Resources::new(Arc::new(Environment::new()))
}

#[tokio::test]
async fn registers_the_pipe_and_receives_from_it() {
    let resources = empty_resources();
    let mut input = spawn("bridge".to_string(), &resources);

    let pipe = resources.get_pipe("bridge").unwrap();
    let (tran, ack_rx) = Transaction::new(Batch::new(vec![Part::from("x")]));
    pipe.send(tran).await.unwrap();

    let received = input.recv().await.unwrap();
    assert_eq!(received.batch().get(0).unwrap().as_bytes(), b"x");
    received.ack(Ok(())).unwrap();
    assert!(ack_rx.await.unwrap().is_ok());
}

#[tokio::test]
async fn soft_stop_unregisters_the_pipe() {
    let resources = empty_resources();
    let input = spawn("bridge".to_string(), &resources);
    assert!(resources.get_pipe("bridge").is_ok());

    input.trigger_stop_consuming();
    input.wait_for_close(Duration::from_secs(1)).await.unwrap();
    assert!(resources.get_pipe("bridge").is_err());
}

#[tokio::test]
async fn stale_teardown_spares_a_newer_registration() {
    let resources = empty_resources();
    let first = spawn("bridge".to_string(), &resources);

    // A replacement registers over the same name before the first input
    // is torn down; the stale unset must not clobber it.
    let second = spawn("bridge".to_string(), &resources);

    first.trigger_stop_consuming();
    first.wait_for_close(Duration::from_secs(1)).await.unwrap();
    assert!(resources.get_pipe("bridge").is_ok());

    second.trigger_stop_consuming();
    second.wait_for_close(Duration::from_secs(1)).await.unwrap();
    assert!(resources.get_pipe("bridge").is_err());
}
