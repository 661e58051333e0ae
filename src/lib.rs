// edgemark — CPU vs GPU 3×3 edge-detection convolution benchmark.
//
// The scalar implementation in `convolution` is the authoritative reference;
// the wgpu compute path in `gpu` is validated against it pixel-for-pixel.

pub mod image;
pub mod convolution;
pub mod synth;
pub mod pgm;
pub mod timing;
pub mod gpu;
