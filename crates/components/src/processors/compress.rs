//! Compress processor
//!
//! Compresses message payloads with the selected codec. The level field
//! applies to zstd only; a negative level selects the codec default.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use sluice_message::Part;
use sluice_runtime::{ComponentError, Processor};

#[cfg(test)]
#[path = "compress_test.rs"]
mod tests;

/// Supported compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Lz4,
    Zstd,
}

/// Configuration for the compress processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressConfig {
    /// The compression algorithm to use.
    pub algorithm: Algorithm,

    /// Compression level; may not apply to all algorithms.
    #[serde(default = "default_level")]
    pub level: i32,
}

fn default_level() -> i32 {
    -1
}

/// Compresses each part's payload.
pub struct CompressProcessor {
    algorithm: Algorithm,
    level: i32,
}

impl CompressProcessor {
    pub fn new(algorithm: Algorithm, level: i32) -> Self {
        Self { algorithm, level }
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, ComponentError> {
        match self.algorithm {
            Algorithm::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Algorithm::Zstd => {
                let level = if self.level < 0 {
                    zstd::DEFAULT_COMPRESSION_LEVEL
                } else {
                    self.level
                };
                zstd::bulk::compress(data, level)
                    .map_err(|err| ComponentError::failed(format!("zstd compression: {err}")))
            }
        }
    }
}

#[async_trait]
impl Processor for CompressProcessor {
    async fn process(
        &self,
        _ctx: &CancellationToken,
        mut part: Part,
    ) -> Result<Vec<Part>, ComponentError> {
        let compressed = self.compress(part.as_bytes())?;
        part.set_payload(compressed);
        Ok(vec![part])
    }
}
