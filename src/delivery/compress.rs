// src/delivery/compress.rs
//! gzip batch compression
//!
//! The wire contract is `Content-Encoding: gzip`, so the compressor wraps
//! flate2's gzip codec. JSON event batches typically shrink well.

use crate::utils::errors::{CourierError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use tracing::debug;

/// Compression levels
#[derive(Debug, Clone, Copy)]
pub enum CompressionLevel {
    /// Fast compression (level 1)
    Fast,

    /// Balanced (level 6)
    Balanced,

    /// Best compression (level 9)
    Best,
}

impl CompressionLevel {
    pub fn as_u32(&self) -> u32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Balanced => 6,
            CompressionLevel::Best => 9,
        }
    }
}

/// gzip compressor
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// Compress data
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let level = self.level.as_u32();

        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::new(level));
        encoder
            .write_all(data)
            .map_err(|e| CourierError::Compression(format!("gzip encode error: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CourierError::Compression(format!("gzip encode error: {}", e)))?;

        let ratio = data.len() as f64 / compressed.len().max(1) as f64;
        debug!(
            "Compressed {} bytes -> {} bytes (ratio: {:.2}x, level {})",
            data.len(),
            compressed.len(),
            ratio,
            level
        );

        Ok(compressed)
    }

    /// Decompress data
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| CourierError::Compression(format!("gzip decode error: {}", e)))?;

        Ok(decompressed)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressionLevel::Balanced)
    }
}
