//! Stream engine
//!
//! Builds a running stream from an engine config: input, processor chain,
//! output, with the batcher spliced in when the output carries a batching
//! section. Construction starts the flow immediately; shutdown runs in
//! two levels - a graceful drain bounded by a deadline, then an immediate
//! stop that abandons in-flight work.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use sluice_batch::{BatchPolicy, BatchPolicyConfig};
use sluice_config::EngineConfig;
use sluice_manager::{Environment, ManagerError, Resources};
use sluice_runtime::{InputHandle, OutputHandle, Signaller};

use crate::batcher;
use crate::pipeline;

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

const HARD_STOP_DEADLINE: Duration = Duration::from_secs(3);

/// Errors raised while building or stopping a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("config requires an input section")]
    MissingInput,

    #[error("config requires an output section")]
    MissingOutput,

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("stream failed to stop within the deadline")]
    StopDeadline,
}

/// A running input → pipeline → output flow.
#[derive(Debug)]
pub struct Stream {
    input_sig: Signaller,
    stream_sig: Signaller,
}

impl Stream {
    /// Build and start a stream from its config.
    pub fn new(
        config: &EngineConfig,
        env: &Arc<Environment>,
        resources: &Arc<Resources>,
    ) -> Result<Self, StreamError> {
        let input_config = config.input.as_ref().ok_or(StreamError::MissingInput)?;
        let output_config = config.output.as_ref().ok_or(StreamError::MissingOutput)?;

        let input = env.build_input(input_config, resources)?;
        let input_sig = input.signaller().clone();

        let processors = config
            .pipeline
            .processors
            .iter()
            .map(|element| env.build_processor(element, resources))
            .collect::<Result<Vec<_>, _>>()?;

        let mut output = env.build_output(output_config, resources)?;
        if let Some(batching) = output_config
            .parse_option::<BatchPolicyConfig>("batching")
            .map_err(ManagerError::Config)?
        {
            if !batching.is_noop() {
                let check = match &batching.check {
                    Some(expr) => Some(
                        env.mapper_engine()?
                            .compile_condition(expr)
                            .map_err(ManagerError::Component)?,
                    ),
                    None => None,
                };
                output = batcher::wrap(BatchPolicy::new(&batching, check), output);
            }
        }

        let processed = pipeline::spawn(processors, input);

        let stream_sig = Signaller::new();
        let worker = stream_sig.clone();
        tokio::spawn(forward(processed, output, worker));

        tracing::info!(
            input = %input_config.type_name,
            processors = config.pipeline.processors.len(),
            output = %output_config.type_name,
            "stream started"
        );

        Ok(Self {
            input_sig,
            stream_sig,
        })
    }

    /// Block until the stream has drained and stopped on its own.
    pub async fn wait(&self) {
        self.stream_sig.stopped().await;
    }

    /// Stop gracefully within the deadline, then abandon what remains.
    ///
    /// Returns [`StreamError::StopDeadline`] when even the hard stop
    /// failed to quiesce the flow.
    pub async fn stop_within(&self, deadline: Duration) -> Result<(), StreamError> {
        self.input_sig.trigger_soft_stop();

        if self.stream_sig.wait_for_stop(deadline).await.is_ok() {
            tracing::info!("stream stopped gracefully");
            return Ok(());
        }

        tracing::warn!("graceful stop deadline reached, abandoning in-flight work");
        self.input_sig.trigger_hard_stop();
        self.stream_sig.trigger_hard_stop();

        if self.stream_sig.wait_for_stop(HARD_STOP_DEADLINE).await.is_err() {
            return Err(StreamError::StopDeadline);
        }
        Ok(())
    }
}

async fn forward(mut processed: InputHandle, output: OutputHandle, sig: Signaller) {
    loop {
        let tran = tokio::select! {
            tran = processed.recv() => match tran {
                Some(tran) => tran,
                None => break,
            },
            _ = sig.hard_stopped() => break,
        };
        if output.send(tran).await.is_err() {
            tracing::error!("output closed before the stream drained");
            break;
        }
    }

    if sig.is_hard_stopped() {
        processed.trigger_close_now();
    }

    let output_sig = output.signaller().clone();
    if sig.is_hard_stopped() {
        output_sig.trigger_hard_stop();
    }
    drop(output);
    if let Err(err) = output_sig.wait_for_stop(HARD_STOP_DEADLINE).await {
        tracing::warn!(error = %err, "output failed to close");
    }
    sig.trigger_stopped();
}
