// image.rs — Runtime-sized grayscale image container, generic over pixel type.
//
// Row-major, contiguous buffer with no stride padding: the pixel at (x, y)
// lives at index `y * width + x`, and the buffer length is exactly
// `width * height`. This is the layout both convolution engines index into
// and the layout the GPU storage buffers carry, so keeping it flat avoids a
// compaction step on upload.

use std::fmt;

// ---------------------------------------------------------------------------
// Pixel trait
// ---------------------------------------------------------------------------

/// Trait for types that can serve as pixel values in an [`Image`].
///
/// Bounds: `Copy` (trivially copyable samples), `Default` (zero value for
/// `Image::new`), `Send + Sync + 'static` (images cross thread boundaries in
/// benchmarks), `PartialOrd` (range assertions in tests).
pub trait Pixel: Copy + Default + Send + Sync + PartialOrd + 'static {
    /// Convert this pixel value to f32 (raw, not normalized).
    fn to_f32(self) -> f32;

    /// Construct a pixel from an f32 value.
    fn from_f32(v: f32) -> Self;
}

impl Pixel for u8 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    /// Clamp to [0, 255], then truncate.
    ///
    /// Truncation (not rounding) matches the PGM writer: a pixel of 99.9
    /// becomes 99. The save→load round-trip tests depend on this.
    #[inline]
    fn from_f32(v: f32) -> Self {
        v.clamp(0.0, 255.0) as u8
    }
}

impl Pixel for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

// ---------------------------------------------------------------------------
// Image<T>
// ---------------------------------------------------------------------------

/// A 2D grayscale image with runtime dimensions, generic over pixel type `T`.
///
/// Invariant: `data.len() == width * height`, row-major, no padding. Every
/// valid (x, y) maps to exactly one slot and images never alias.
pub struct Image<T: Pixel> {
    /// Pixel data in row-major order. Length = width * height.
    data: Vec<T>,
    /// Image width in pixels.
    width: usize,
    /// Image height in pixels.
    height: usize,
}

// Clone is a deep copy of heap data; implemented manually to document that.
impl<T: Pixel> Clone for Image<T> {
    fn clone(&self) -> Self {
        Image {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Pixel> Image<T> {
    // --- Constructors ---

    /// Create a zero-initialized image with the given dimensions.
    ///
    /// Both convolution engines rely on this: an output image starts as all
    /// zeros and only interior pixels are ever written, so the one-pixel
    /// border keeps its initialized value.
    pub fn new(width: usize, height: usize) -> Self {
        Image {
            data: vec![T::default(); width * height],
            width,
            height,
        }
    }

    /// Create an image from an existing pixel vector (row-major).
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length ({}) must equal width * height ({})",
            data.len(),
            width * height,
        );
        Image { data, width, height }
    }

    // --- Accessors ---

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the pixel value at (x, y). x is column, y is row.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.bounds_check(x, y);
        self.data[y * self.width + x]
    }

    /// Get a pixel value without bounds checking.
    ///
    /// # Safety
    /// Caller must guarantee x < width and y < height. Used in the scalar
    /// convolution inner loop where bounds are validated at the loop level.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, x: usize, y: usize) -> T {
        debug_assert!(
            x < self.width && y < self.height,
            "get_unchecked({x},{y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        *self.data.get_unchecked(y * self.width + x)
    }

    /// Set a pixel value without bounds checking.
    ///
    /// # Safety
    /// Caller must guarantee x < width and y < height.
    #[inline(always)]
    pub unsafe fn set_unchecked(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(x < self.width && y < self.height);
        *self.data.get_unchecked_mut(y * self.width + x) = value;
    }

    /// Set the pixel at (x, y) to the given value.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.bounds_check(x, y);
        let idx = y * self.width + x;
        self.data[idx] = value;
    }

    /// Iterate over all pixels as `(x, y, value)` tuples, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| (x, y, self.data[y * self.width + x]))
        })
    }

    /// Access the underlying data as a flat row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the underlying data.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    // --- Internal helpers ---

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) out of bounds for image {}×{}",
            self.width,
            self.height,
        );
    }
}

// Debug formatting — useful for small images in tests.
impl<T: Pixel + fmt::Debug> fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Image<{}> {{ {}×{} }}",
            std::any::type_name::<T>(),
            self.width,
            self.height,
        )?;
        for y in 0..self.height.min(8) {
            write!(f, "  row {y}: [")?;
            for x in 0..self.width.min(16) {
                if x > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.get(x, y))?;
            }
            if self.width > 16 {
                write!(f, ", ...")?;
            }
            writeln!(f, "]")?;
        }
        if self.height > 8 {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

impl<T: Pixel> std::ops::Index<(usize, usize)> for Image<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        self.bounds_check(x, y);
        &self.data[y * self.width + x]
    }
}

impl<T: Pixel> std::ops::IndexMut<(usize, usize)> for Image<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        self.bounds_check(x, y);
        let idx = y * self.width + x;
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zero_initialized() {
        let img: Image<f32> = Image::new(10, 5);
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        for (_, _, v) in img.pixels() {
            assert_eq!(v, 0.0f32);
        }
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut img: Image<u8> = Image::new(4, 3);
        img.set(0, 0, 10);
        img.set(3, 2, 255);
        img.set(1, 1, 42);
        assert_eq!(img.get(0, 0), 10);
        assert_eq!(img.get(3, 2), 255);
        assert_eq!(img.get(1, 1), 42);
        assert_eq!(img.get(2, 2), 0); // untouched pixel
    }

    #[test]
    fn test_from_vec_layout() {
        let data: Vec<u8> = (0..12).collect();
        let img = Image::from_vec(4, 3, data);
        // Row 0: [0, 1, 2, 3], Row 1: [4, 5, 6, 7], Row 2: [8, 9, 10, 11]
        assert_eq!(img.get(0, 0), 0);
        assert_eq!(img.get(3, 0), 3);
        assert_eq!(img.get(0, 1), 4);
        assert_eq!(img.get(3, 2), 11);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_from_vec_length_mismatch() {
        let _ = Image::from_vec(4, 3, vec![0u8; 11]);
    }

    #[test]
    fn test_pixels_iterator_order() {
        let data: Vec<u8> = (0..6).collect();
        let img = Image::from_vec(3, 2, data);
        let pixels: Vec<_> = img.pixels().collect();
        assert_eq!(pixels.len(), 6);
        assert_eq!(pixels[0], (0, 0, 0));
        assert_eq!(pixels[1], (1, 0, 1));
        assert_eq!(pixels[2], (2, 0, 2));
        assert_eq!(pixels[3], (0, 1, 3));
    }

    #[test]
    fn test_index_read_write() {
        let mut img: Image<f32> = Image::new(4, 3);
        img[(1, 2)] = 42.0;
        assert_eq!(img[(1, 2)], 42.0);
        assert_eq!(img.get(1, 2), 42.0); // consistent with get()
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let img: Image<u8> = Image::new(4, 4);
        img.get(4, 0); // x == width → out of bounds
    }

    #[test]
    fn test_u8_from_f32_truncates() {
        // Truncation, not rounding — must match the PGM writer.
        assert_eq!(u8::from_f32(99.9), 99);
        assert_eq!(u8::from_f32(0.4), 0);
        assert_eq!(u8::from_f32(-5.0), 0);
        assert_eq!(u8::from_f32(300.7), 255);
    }

    #[test]
    fn test_zero_dimension_images() {
        // Degenerate sizes must construct without panicking.
        let a: Image<f32> = Image::new(0, 7);
        let b: Image<f32> = Image::new(7, 0);
        assert_eq!(a.as_slice().len(), 0);
        assert_eq!(b.as_slice().len(), 0);
    }
}
