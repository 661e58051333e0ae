// convolution.rs — 3×3 edge-detection stencil, scalar reference engine.
//
// BORDER HANDLING: exclusion.
// The one-pixel border of the output is never computed — out-of-range
// stencil taps are never read and the border keeps the zero value the
// output buffer was initialized with. This is deliberate and both engines
// implement the identical policy, so CPU and GPU results are comparable
// pixel-for-pixel including the border.
//
// The scalar pass below is the authoritative reference for the GPU kernel
// in `gpu::convolve`, and its y-outer / x-inner row-major traversal is the
// baseline the GPU timing is compared against.

use std::fmt;

use crate::gpu::device::GpuError;
use crate::image::Image;

/// The fixed horizontal edge-detection kernel, shared by both engines.
///
/// `EDGE_KERNEL[ky][kx]` weights the input tap at
/// `(x + kx - 1, y + ky - 1)`. Each output pixel is the left column of its
/// 3×3 neighborhood minus the right column, so locally constant regions map
/// to zero and vertical edges produce strong responses.
pub const EDGE_KERNEL: [[i32; 3]; 3] = [
    [1, 0, -1],
    [1, 0, -1],
    [1, 0, -1],
];

/// Apply [`EDGE_KERNEL`] sequentially over the interior of `input`.
///
/// The output has identical dimensions. Interior pixels
/// (1 ≤ x < width−1, 1 ≤ y < height−1) hold the 3×3 neighborhood sum;
/// border pixels stay zero. Images with width or height < 3 have no
/// interior, so the result is all-zero.
///
/// Pure function of the input and the fixed kernel; no error conditions.
pub fn convolve_scalar(input: &Image<f32>) -> Image<f32> {
    let w = input.width();
    let h = input.height();
    let mut out = Image::new(w, h);

    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut sum = 0.0f32;
            // SAFETY: x ± 1 and y ± 1 are in bounds because x is in
            // [1, w-2] and y is in [1, h-2].
            unsafe {
                for (ky, row) in EDGE_KERNEL.iter().enumerate() {
                    for (kx, &weight) in row.iter().enumerate() {
                        let px = x + kx - 1;
                        let py = y + ky - 1;
                        sum += input.get_unchecked(px, py) * weight as f32;
                    }
                }
                out.set_unchecked(x, y, sum);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// ConvolutionEngine
// ---------------------------------------------------------------------------

/// An execution strategy for the fixed 3×3 stencil.
///
/// The timing harness, the runner, and the parity tests are written once
/// against this trait and run against both the scalar and the GPU engine.
pub trait ConvolutionEngine {
    /// Short display name for reports ("scalar", "gpu").
    fn name(&self) -> &'static str;

    /// Apply [`EDGE_KERNEL`] to `input`, producing a same-sized image with
    /// a zero border. Must include any blocking device completion, so that
    /// wall-clock measurement around this call covers the full execution.
    fn convolve(&self, input: &Image<f32>) -> Result<Image<f32>, EngineError>;
}

/// The sequential CPU engine. Stateless; never fails.
pub struct ScalarEngine;

impl ConvolutionEngine for ScalarEngine {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn convolve(&self, input: &Image<f32>) -> Result<Image<f32>, EngineError> {
        Ok(convolve_scalar(input))
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from a convolution engine invocation.
///
/// The scalar engine never produces one; the GPU engine wraps device-level
/// failures. Every variant is fatal for the run — there is no fallback from
/// the GPU engine to the scalar engine.
#[derive(Debug)]
pub enum EngineError {
    /// The GPU engine failed at the device level (dispatch, readback).
    Device(GpuError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Device(e) => write!(f, "device engine failed: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Device(e) => Some(e),
        }
    }
}

impl From<GpuError> for EngineError {
    fn from(e: GpuError) -> Self {
        EngineError::Device(e)
    }
}
