// timing.rs — Wall-clock measurement for a single engine invocation.

use std::time::Instant;

/// Run `f` once and report its wall-clock duration in milliseconds.
///
/// The clock is monotonic (`Instant`) and brackets the call exactly: it is
/// read immediately before invoking `f` and immediately after it returns.
/// For the GPU engine this includes the blocking wait on device completion,
/// not just enqueue time, because the engine does not return until the
/// result is back on the host. One sample per invocation; no retries.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let out = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    (out, elapsed_ms)
}
