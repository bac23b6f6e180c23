use crate::error::{CacheError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Codec(format!("compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Codec(format!("compression failed: {}", e)))
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Codec(format!("decompression failed: {}", e)))?;
    Ok(out)
}
