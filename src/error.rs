//! Error type shared by the restoration core.
//!
//! Cancellation is not an error: a cancelled run returns `Ok` with
//! [`crate::diagnostics::Outcome::Cancelled`].
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefocusError {
    /// A kernel, table or image-sized buffer could not be reserved.
    #[error("failed to allocate {what} ({elements} elements)")]
    AllocationFailure { what: &'static str, elements: usize },
    /// Unsupported pixel layout, mismatched planes or non-finite parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, RefocusError>;

/// Reserve `len` samples up front and fill them with `fill`.
///
/// Uses `try_reserve_exact` so that an out-of-memory condition surfaces as
/// [`RefocusError::AllocationFailure`] instead of aborting the process.
pub(crate) fn try_buffer(what: &'static str, len: usize, fill: f64) -> Result<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| RefocusError::AllocationFailure {
            what,
            elements: len,
        })?;
    buf.resize(len, fill);
    Ok(buf)
}

/// `w * h` with overflow reported as an allocation failure.
pub(crate) fn area(what: &'static str, w: usize, h: usize) -> Result<usize> {
    w.checked_mul(h).ok_or(RefocusError::AllocationFailure {
        what,
        elements: usize::MAX,
    })
}
