use std::fmt;

// DType — element types a feature store may hold
//
// Tensors in memory are always f32. Stores may keep features in half
// precision to save space, or in f64 when exported straight from numpy;
// DType describes the on-disk encoding so it can be widened or narrowed to
// f32 on load.

/// On-disk element type of a stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 => 2,
            DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Decode a little-endian buffer of this dtype into f32 values.
    pub fn decode_le(&self, raw: &[u8]) -> crate::Result<Vec<f32>> {
        let elem_size = self.size_in_bytes();
        if raw.len() % elem_size != 0 {
            return Err(crate::Error::MisalignedBytes {
                dtype: *self,
                len: raw.len(),
                elem_size,
            });
        }

        let values = match self {
            DType::F16 => raw
                .chunks_exact(2)
                .map(|c| half::f16::from_le_bytes([c[0], c[1]]).to_f32())
                .collect(),
            DType::BF16 => raw
                .chunks_exact(2)
                .map(|c| half::bf16::from_le_bytes([c[0], c[1]]).to_f32())
                .collect(),
            DType::F32 => raw
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            DType::F64 => raw
                .chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect(),
        };
        Ok(values)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}
