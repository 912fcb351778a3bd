//! Request path screening for line-framed protocols.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid path")]
pub struct InvalidPath;

/// Accept `path` unchanged unless it is empty, starts with `#`, or
/// contains a NUL byte.
pub fn localize(path: &str) -> Result<&str, InvalidPath> {
    if path.is_empty() || path.starts_with('#') || path.contains('\0') {
        return Err(InvalidPath);
    }
    Ok(path)
}
