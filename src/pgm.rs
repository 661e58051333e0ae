// pgm.rs — Binary PGM (P5) decode and encode.
//
// Format, read and written identically:
//   magic "P5", width, height, maxval — ASCII tokens separated by
//   whitespace — then exactly one whitespace byte, then width*height raw
//   bytes, one per pixel, row-major, no padding.
//
// Any deviation (wrong magic, malformed header, truncated pixel data) is a
// decode failure. The writer clamps each pixel to [0, 255] and truncates
// before the cast to a byte — truncation, not rounding, so the round-trip
// tests hold exactly for in-range integral pixels.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::image::{Image, Pixel};

/// The P5 magic token a binary PGM file must start with.
pub const MAGIC: &str = "P5";

/// Maximum sample value written to the header.
const MAX_VAL: u32 = 255;

/// Decode a binary PGM file into an `Image<f32>` with raw byte values
/// (0.0 ..= 255.0).
pub fn load<P: AsRef<Path>>(path: P) -> Result<Image<f32>, PgmError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Decode an in-memory PGM byte stream.
pub fn decode(bytes: &[u8]) -> Result<Image<f32>, PgmError> {
    let mut pos = 0usize;

    let magic = next_token(bytes, &mut pos)?;
    if magic != MAGIC {
        return Err(PgmError::BadMagic { found: magic });
    }

    let width = parse_dimension(bytes, &mut pos, "width")?;
    let height = parse_dimension(bytes, &mut pos, "height")?;

    let maxval_tok = next_token(bytes, &mut pos)?;
    let _maxval: u32 = maxval_tok
        .parse()
        .map_err(|_| PgmError::BadHeader(format!("maxval is not an integer: {maxval_tok:?}")))?;

    // Exactly one whitespace byte separates the header from the raster.
    match bytes.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        _ => {
            return Err(PgmError::BadHeader(
                "missing whitespace separator after maxval".to_string(),
            ))
        }
    }

    // Header dimensions are untrusted; the product must not overflow.
    let expected = width
        .checked_mul(height)
        .ok_or_else(|| PgmError::BadHeader(format!("dimensions overflow: {width} x {height}")))?;
    let raster = &bytes[pos..];
    if raster.len() < expected {
        return Err(PgmError::Truncated {
            expected,
            actual: raster.len(),
        });
    }

    let data: Vec<f32> = raster[..expected].iter().map(|&b| b as f32).collect();
    Ok(Image::from_vec(width, height, data))
}

/// Serialize `image` as a binary PGM file.
///
/// Each pixel is clamped to [0, 255] and truncated to a byte. Fails with
/// [`PgmError::Io`] if the destination cannot be opened for writing.
pub fn save<P: AsRef<Path>>(image: &Image<f32>, path: P) -> Result<(), PgmError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    write!(out, "{MAGIC}\n{} {}\n{MAX_VAL}\n", image.width(), image.height())?;

    let raster: Vec<u8> = image.as_slice().iter().map(|&v| u8::from_f32(v)).collect();
    out.write_all(&raster)?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Header parsing helpers
// ---------------------------------------------------------------------------

/// Skip ASCII whitespace, then collect the next run of non-whitespace bytes.
fn next_token(bytes: &[u8], pos: &mut usize) -> Result<String, PgmError> {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(PgmError::BadHeader("unexpected end of header".to_string()));
    }
    String::from_utf8(bytes[start..*pos].to_vec())
        .map_err(|_| PgmError::BadHeader("non-ASCII bytes in header".to_string()))
}

fn parse_dimension(bytes: &[u8], pos: &mut usize, what: &str) -> Result<usize, PgmError> {
    let tok = next_token(bytes, pos)?;
    let value: usize = tok
        .parse()
        .map_err(|_| PgmError::BadHeader(format!("{what} is not an integer: {tok:?}")))?;
    if value == 0 {
        return Err(PgmError::BadHeader(format!("{what} must be positive")));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from PGM decode or encode.
#[derive(Debug)]
pub enum PgmError {
    /// The file could not be read or written.
    Io(io::Error),
    /// The magic token was not "P5".
    BadMagic { found: String },
    /// The header tokens were malformed (non-integer or zero dimensions,
    /// missing separator, non-ASCII bytes).
    BadHeader(String),
    /// Fewer raster bytes than width * height.
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for PgmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgmError::Io(e) => write!(f, "PGM I/O failed: {e}"),
            PgmError::BadMagic { found } => {
                write!(f, "bad PGM magic: expected {MAGIC:?}, found {found:?}")
            }
            PgmError::BadHeader(msg) => write!(f, "malformed PGM header: {msg}"),
            PgmError::Truncated { expected, actual } => write!(
                f,
                "truncated PGM raster: expected {expected} bytes, found {actual}"
            ),
        }
    }
}

impl std::error::Error for PgmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PgmError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PgmError {
    fn from(e: io::Error) -> Self {
        PgmError::Io(e)
    }
}
