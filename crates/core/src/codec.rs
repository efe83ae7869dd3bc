//! Packed float32 encoding for persisted embeddings: little-endian IEEE-754, component
//! order, `4 * dim` bytes. sqlite-vec's `vec_distance_l2` reads the same layout.

use crate::error::StoreError;

const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * FLOAT_BYTES);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub fn decode_embedding(bytes: &[u8], dimensions: usize) -> Result<Vec<f32>, StoreError> {
    if bytes.len() != dimensions * FLOAT_BYTES {
        return Err(StoreError::CorruptEmbedding(format!(
            "expected {} bytes, found {}",
            dimensions * FLOAT_BYTES,
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(FLOAT_BYTES)
        .map(|raw| f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
        .collect())
}
