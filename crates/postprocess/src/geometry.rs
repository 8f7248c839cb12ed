use crate::error::PostprocessError;

/// Axis-aligned box in original image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Zero for boxes with a non-positive side.
    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// Intersection over union. Degenerate boxes overlap nothing.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let area_a = self.area();
        let area_b = other.area();
        if area_a == 0 || area_b == 0 {
            return 0.0;
        }

        let x1 = (self.left as i64).max(other.left as i64);
        let y1 = (self.top as i64).max(other.top as i64);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        let intersection = (x2 - x1).max(0) * (y2 - y1).max(0);
        let union = area_a + area_b - intersection;

        (intersection as f64 / union as f64) as f32
    }
}

/// Ratio between the original image and the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x_factor: f64,
    pub y_factor: f64,
}

impl ScaleFactors {
    /// `input_shape` and `img_shape` are `(width, height)`.
    pub fn new(input_shape: (u32, u32), img_shape: (u32, u32)) -> Result<Self, PostprocessError> {
        let x_factor = img_shape.0 as f64 / input_shape.0 as f64;
        let y_factor = img_shape.1 as f64 / input_shape.1 as f64;

        let valid = |f: f64| f.is_finite() && f > 0.0;
        if !valid(x_factor) || !valid(y_factor) {
            return Err(PostprocessError::InvalidScale { x_factor, y_factor });
        }

        Ok(Self { x_factor, y_factor })
    }

    /// Map a center-format box from model input space to an image-space
    /// corner box. Every coordinate is truncated toward zero.
    pub fn scale_box(&self, [cx, cy, w, h]: [f32; 4]) -> BoundingBox {
        let left = ((cx - w / 2.0) as f64 * self.x_factor) as i32;
        let top = ((cy - h / 2.0) as f64 * self.y_factor) as i32;
        let width = (w as f64 * self.x_factor) as i32;
        let height = (h as f64 * self.y_factor) as i32;

        BoundingBox::new(left, top, width, height)
    }
}
