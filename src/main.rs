// main.rs — Interactive CPU vs GPU convolution benchmark.
//
// Run flow: list every enumerated compute device, prompt for one, prompt
// for the input source (synthetic or input.pgm), then run the scalar and
// GPU engines over the same image, reporting wall-clock time for each and
// writing the results as PGM files. The GPU output filename carries the
// selected device index so repeated runs against different devices do not
// collide.
//
// Every error is fatal: print a diagnostic, exit non-zero. A single-shot
// benchmark has no state worth recovering.

use std::error::Error;
use std::io::{self, Write};
use std::process;

use edgemark::convolution::{ConvolutionEngine, ScalarEngine};
use edgemark::gpu::convolve::GpuEngine;
use edgemark::gpu::device::{DeviceCatalog, GpuError};
use edgemark::image::Image;
use edgemark::pgm;
use edgemark::synth::SyntheticSource;
use edgemark::timing;

/// Dimensions of the synthetic input.
const GENERATED_WIDTH: usize = 1024;
const GENERATED_HEIGHT: usize = 1024;

/// Well-known input filename for the load path.
const INPUT_PATH: &str = "input.pgm";

fn main() {
    if let Err(e) = run() {
        eprintln!("[edgemark] error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    // ---- Device listing and selection ----
    let catalog = DeviceCatalog::enumerate();
    for descriptor in catalog.descriptors() {
        println!("{descriptor}");
    }
    if catalog.is_empty() {
        // Fatal: the parallel path never falls back to scalar-only.
        return Err(GpuError::NoDevices.into());
    }

    let raw = prompt(&format!("Select device [0 - {}]: ", catalog.len() - 1))?;
    let choice: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid device index: {:?}", raw.trim()))?;
    catalog.select(choice)?;

    // ---- Input image ----
    let raw = prompt(&format!(
        "Select image input method:\n[0] Generate random image ({GENERATED_WIDTH}x{GENERATED_HEIGHT})\n[1] Load from PGM file ({INPUT_PATH})\nChoice: "
    ))?;
    let input: Image<f32> = match raw.trim() {
        "0" => SyntheticSource::default().generate(GENERATED_WIDTH, GENERATED_HEIGHT),
        "1" => pgm::load(INPUT_PATH)?,
        other => return Err(format!("invalid input choice: {other:?}").into()),
    };
    println!("Input: {}x{}", input.width(), input.height());

    // ---- Scalar engine ----
    run_engine(&ScalarEngine, &input, "output_scalar.pgm")?;

    // ---- GPU engine ----
    let gpu = catalog.open(choice)?;
    println!("[edgemark] {gpu}");
    let engine = GpuEngine::new(gpu)?;
    run_engine(&engine, &input, &format!("output_gpu_device_{choice}.pgm"))?;

    Ok(())
}

/// Time one engine invocation and write its result.
///
/// The measured interval brackets the whole `convolve` call, which for the
/// GPU engine includes the blocking wait on device completion and readback.
fn run_engine(
    engine: &dyn ConvolutionEngine,
    input: &Image<f32>,
    out_path: &str,
) -> Result<(), Box<dyn Error>> {
    let (result, ms) = timing::measure(|| engine.convolve(input));
    let output = result?;
    println!("{} convolution time: {ms:.3} ms", engine.name());
    pgm::save(&output, out_path)?;
    println!("Wrote image: {out_path}");
    Ok(())
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
