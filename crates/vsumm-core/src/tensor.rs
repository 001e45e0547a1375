use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::shape::Shape;

// Tensor — owned, contiguous f32 array
//
// Feature matrices and score vectors are loaded once and then only read, so
// the tensor is an immutable row-major buffer plus a shape. The buffer sits
// behind an Arc: cloning a Tensor (as every `Dataset::get` does) copies a
// pointer, and loader workers on other threads can share the same samples.

/// An immutable, contiguous n-dimensional array of `f32`.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    data: Arc<Vec<f32>>,
    shape: Shape,
}

impl Tensor {
    /// Build a tensor from a flat row-major buffer.
    ///
    /// Fails with [`Error::ElementCountMismatch`] when `data.len()` differs
    /// from the element count of `shape`.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            shape,
        })
    }

    /// Build a tensor by copying a slice.
    pub fn from_slice(data: &[f32], shape: impl Into<Shape>) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// A tensor of zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        Self {
            data: Arc::new(vec![0.0; shape.elem_count()]),
            shape,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// Size of dimension `d`.
    pub fn dim(&self, d: usize) -> Result<usize> {
        self.shape.dim(d)
    }

    /// The underlying row-major data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.as_ref().clone()
    }

    /// Fail unless the tensor has exactly `rank` dimensions.
    pub fn expect_rank(&self, rank: usize) -> Result<()> {
        if self.rank() != rank {
            return Err(Error::RankMismatch {
                expected: rank,
                got: self.rank(),
            });
        }
        Ok(())
    }

    /// Borrow row `i` along the leading dimension.
    ///
    /// For a `[T, D]` feature matrix this is the D-dimensional feature of
    /// frame `i`; for a `[T]` score vector it is a one-element slice.
    pub fn row(&self, i: usize) -> Result<&[f32]> {
        let rows = self.dim(0)?;
        if i >= rows {
            return Err(Error::IndexOutOfRange {
                index: i,
                size: rows,
            });
        }
        let width = self.shape.stride_contiguous()[0];
        Ok(&self.data[i * width..(i + 1) * width])
    }

    /// Stack equally-shaped tensors along a new leading dimension.
    pub fn stack(tensors: &[Tensor]) -> Result<Tensor> {
        let first = match tensors.first() {
            Some(t) => t,
            None => crate::bail!("stack: need at least one tensor"),
        };

        let mut data = Vec::with_capacity(first.elem_count() * tensors.len());
        for t in tensors {
            if t.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: t.shape.clone(),
                });
            }
            data.extend_from_slice(t.as_slice());
        }

        Tensor::from_vec(data, first.shape.with_leading(tensors.len()))
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, f32)", self.shape)
    }
}
