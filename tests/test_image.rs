// tests/test_image.rs — Integration tests for Image<T> and SyntheticSource.
//
// Integration tests can only touch the public API — a good check that the
// public surface is usable on its own.

use edgemark::image::Image;
use edgemark::synth::{SyntheticSource, DEFAULT_SEED};

// ===== Image construction & access =====

#[test]
fn image_new_zero_initialized() {
    let img: Image<f32> = Image::new(100, 50);
    assert_eq!(img.width(), 100);
    assert_eq!(img.height(), 50);
    assert_eq!(img.get(0, 0), 0.0);
    assert_eq!(img.get(99, 49), 0.0);
}

#[test]
fn image_row_major_indexing() {
    // 3×2 image, row-major:
    //  [10, 20, 30]
    //  [40, 50, 60]
    let data = vec![10.0f32, 20.0, 30.0, 40.0, 50.0, 60.0];
    let img = Image::from_vec(3, 2, data);
    assert_eq!(img.get(0, 0), 10.0);
    assert_eq!(img.get(2, 0), 30.0);
    assert_eq!(img.get(0, 1), 40.0);
    assert_eq!(img.get(2, 1), 60.0);
    // Flat slice view matches index = y*width + x.
    assert_eq!(img.as_slice()[1 * 3 + 2], 60.0);
}

#[test]
fn image_set_then_read_back() {
    let mut img: Image<f32> = Image::new(10, 10);
    for y in 0..10 {
        for x in 0..10 {
            img.set(x, y, (x * 10 + y) as f32);
        }
    }
    for y in 0..10 {
        for x in 0..10 {
            assert_eq!(img.get(x, y), (x * 10 + y) as f32, "mismatch at ({x},{y})");
        }
    }
}

#[test]
fn image_clone_is_deep() {
    let mut a: Image<f32> = Image::new(4, 4);
    a.set(2, 2, 9.0);
    let b = a.clone();
    a.set(2, 2, 1.0);
    assert_eq!(b.get(2, 2), 9.0, "clone must not alias the original");
}

// ===== Synthetic source =====

#[test]
fn synthetic_source_reproducible_across_instances() {
    let a = SyntheticSource::new(DEFAULT_SEED).generate(24, 24);
    let b = SyntheticSource::default().generate(24, 24);
    assert_eq!(a.as_slice(), b.as_slice());
}

#[test]
fn synthetic_source_range_and_shape() {
    let img = SyntheticSource::default().generate(50, 20);
    assert_eq!(img.width(), 50);
    assert_eq!(img.height(), 20);
    for (x, y, v) in img.pixels() {
        assert!((0.0..255.0).contains(&v), "pixel ({x},{y}) out of range: {v}");
    }
}

#[test]
fn synthetic_source_not_constant() {
    // Uniform noise over a 4×4 grid is not all-equal for the fixed seed.
    let img = SyntheticSource::default().generate(4, 4);
    let first = img.get(0, 0);
    assert!(
        img.pixels().any(|(_, _, v)| v != first),
        "synthetic image is unexpectedly constant"
    );
}
