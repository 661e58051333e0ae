// gpu/mod.rs — wgpu compute path.
//
// The GPU engine mirrors the scalar convolution in the parent crate. The
// scalar implementation remains the authoritative reference — the compute
// kernel is validated against it pixel-for-pixel in the parity tests.
//
// One blocking dispatch per run: the host enqueues the 2D grid, waits for
// device completion, and reads the output buffer back before returning.
// There is no host/device overlap, no cancellation, and no timeout.

pub mod device;
pub mod convolve;
