use std::string::FromUtf8Error;

use slotscan_layout::LayoutError;

use crate::{packing::SlotBoundaryError, slots::SlotError};

/// Result type for storage reads.
pub type Result<T, E = ReadError> = std::result::Result<T, E>;

/// Errors that abort a storage read.
///
/// Soft degradations (unknown types, unresolved mappings, oversized dynamic
/// values) never surface here; they are rendered as placeholders instead.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    SlotBoundary(#[from] SlotBoundaryError),
    #[error("string at `{path}` is not valid UTF-8")]
    InvalidEncoding {
        path: String,
        #[source]
        source: FromUtf8Error,
    },
    #[error("short byte string at `{path}` declares {length} bytes, more than fit in a slot")]
    MalformedBytes { path: String, length: usize },
    #[error("failed fetching storage slot {slot}")]
    Provider {
        slot: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
