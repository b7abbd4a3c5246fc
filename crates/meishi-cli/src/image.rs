//! Image payload preparation.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Upper bound on the photo size. The upload travels as a single
/// request body, so captures beyond this reliably fail; downscale the
/// photo before submitting.
const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Reads a capture and encodes it the way the backend expects: plain
/// base64 with no data-URL prefix.
pub fn load_base64(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        bail!(
            "{} is {} bytes; keep captures under {} bytes",
            path.display(),
            bytes.len(),
            MAX_IMAGE_BYTES
        );
    }
    Ok(STANDARD.encode(&bytes))
}
