//! Read-only view over the raw detection head output.
//!
//! The model emits `[1, 4 + num_classes, num_candidates]`: the attributes of
//! one candidate live in a column. Rows are handed out as strided column
//! views so the tensor is never transposed into a new buffer.

use crate::error::PostprocessError;
use ndarray::{ArrayView1, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn, s};

/// Number of leading box attributes per candidate (`cx, cy, w, h`).
pub const BOX_ATTRIBUTES: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct RawOutput<'a> {
    // [num_attributes, num_candidates]
    attributes: ArrayView2<'a, f32>,
}

impl<'a> RawOutput<'a> {
    /// Wrap a `[1, 4 + num_classes, num_candidates]` tensor.
    pub fn from_view(view: ArrayViewD<'a, f32>) -> Result<Self, PostprocessError> {
        let shape = view.shape().to_vec();

        if shape.len() != 3 {
            return Err(PostprocessError::Shape(format!(
                "expected [1, 4 + num_classes, num_candidates], got {:?}",
                shape
            )));
        }
        if shape[0] != 1 {
            return Err(PostprocessError::Shape(format!(
                "expected batch size 1, got {}",
                shape[0]
            )));
        }
        if shape[1] <= BOX_ATTRIBUTES {
            return Err(PostprocessError::Shape(format!(
                "expected more than {} attributes per candidate, got {}",
                BOX_ATTRIBUTES, shape[1]
            )));
        }

        let attributes = view
            .index_axis_move(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| PostprocessError::Shape(e.to_string()))?;

        Ok(Self { attributes })
    }

    /// Wrap a flat row-major buffer together with its shape descriptor.
    pub fn from_slice(data: &'a [f32], shape: &[usize]) -> Result<Self, PostprocessError> {
        let view = ArrayViewD::from_shape(IxDyn(shape), data).map_err(|e| {
            PostprocessError::Shape(format!(
                "{} values cannot be viewed as {:?}: {}",
                data.len(),
                shape,
                e
            ))
        })?;
        Self::from_view(view)
    }

    pub fn num_classes(&self) -> usize {
        self.attributes.nrows() - BOX_ATTRIBUTES
    }

    pub fn num_candidates(&self) -> usize {
        self.attributes.ncols()
    }

    pub fn row(&self, index: usize) -> Option<Row<'a>> {
        (index < self.num_candidates()).then(|| Row {
            attributes: self.attributes.index_axis_move(Axis(1), index),
        })
    }

    /// Iterate candidates in output order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'a>> + 'a {
        let attributes = self.attributes;
        (0..attributes.ncols()).map(move |i| Row {
            attributes: attributes.index_axis_move(Axis(1), i),
        })
    }
}

/// One candidate location: a box followed by its class scores.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    attributes: ArrayView1<'a, f32>,
}

impl<'a> Row<'a> {
    /// `[cx, cy, w, h]` in model input coordinates.
    pub fn bbox(&self) -> [f32; 4] {
        [
            self.attributes[0],
            self.attributes[1],
            self.attributes[2],
            self.attributes[3],
        ]
    }

    pub fn class_scores(&self) -> ArrayView1<'a, f32> {
        self.attributes.slice_move(s![BOX_ATTRIBUTES..])
    }

    /// Highest class score and the lowest index reaching it.
    ///
    /// NaN scores never win.
    pub fn best_class(&self) -> (usize, f32) {
        let mut best = (0usize, f32::NAN);
        for (class_id, &score) in self.class_scores().iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            if best.1.is_nan() || score > best.1 {
                best = (class_id, score);
            }
        }
        best
    }
}
