use crate::error::{ReelsmithError, Result};

/// Placement of a source frame on the vertical output canvas: the frame
/// is scaled to fit entirely inside the canvas and centered with black
/// padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlacement {
    pub canvas_w: u32,
    pub canvas_h: u32,
    pub scaled_w: u32,
    pub scaled_h: u32,
    /// Padding on the left edge; the right edge gets the remainder.
    pub pad_left: u32,
    /// Padding on the top edge; the bottom edge gets the remainder.
    pub pad_top: u32,
}

impl FramePlacement {
    /// Compute the scale and padding that place a `src_w` x `src_h`
    /// frame on a portrait `canvas_w` x `canvas_h` canvas.
    ///
    /// The scale factor is min(W/w, H/h), so the whole frame fits with
    /// no cropping. Leftover space on each axis is split evenly between
    /// the two opposing edges, the extra pixel of an odd remainder
    /// going to the right/bottom.
    pub fn compute(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> Result<Self> {
        if src_w == 0 || src_h == 0 {
            return Err(ReelsmithError::InvalidConfiguration(format!(
                "Source frame dimensions must be nonzero, got {src_w}x{src_h}"
            )));
        }
        if canvas_w == 0 || canvas_h == 0 || canvas_w >= canvas_h {
            return Err(ReelsmithError::InvalidConfiguration(format!(
                "Canvas must be portrait with nonzero dimensions, got {canvas_w}x{canvas_h}"
            )));
        }

        let scale = (canvas_w as f64 / src_w as f64).min(canvas_h as f64 / src_h as f64);
        let scaled_w = ((src_w as f64 * scale).round() as u32).min(canvas_w);
        let scaled_h = ((src_h as f64 * scale).round() as u32).min(canvas_h);

        Ok(Self {
            canvas_w,
            canvas_h,
            scaled_w,
            scaled_h,
            pad_left: (canvas_w - scaled_w) / 2,
            pad_top: (canvas_h - scaled_h) / 2,
        })
    }

    pub fn pad_right(&self) -> u32 {
        self.canvas_w - self.scaled_w - self.pad_left
    }

    pub fn pad_bottom(&self) -> u32 {
        self.canvas_h - self.scaled_h - self.pad_top
    }

    /// The ffmpeg video filter that applies this placement.
    pub fn to_video_filter(&self) -> String {
        format!(
            "scale={}:{},pad={}:{}:{}:{}:black",
            self.scaled_w, self.scaled_h, self.canvas_w, self.canvas_h, self.pad_left, self.pad_top
        )
    }
}
