use crate::avformat::AVMediaType;
use crate::native::{CodecId, Native};
use std::ffi::{c_char, c_int, CStr};
use thiserror::Error;

/// Failures surfaced by the wrappers.
///
/// Every wrapper returns `anyhow::Result`; the root cause is one of these, so
/// callers that need to branch can `downcast_ref::<AVError>()`.
#[derive(Debug, Error)]
pub enum AVError {
    #[error("Failed to allocate {0}.")]
    Allocation(&'static str),

    #[error("Unsupported codec: \"{0}\".")]
    UnsupportedDecoder(String),

    #[error("Unsupported codec: \"{name}\", ({id}).")]
    UnsupportedCodec { name: String, id: CodecId },

    #[error("Decoder selection changed between lookups.")]
    DecoderMismatch,

    #[error("Failed to open the input \"{source_name}\" ({reason}).")]
    Open { source_name: String, reason: String },

    #[error("Unexpected {label}: {keys}")]
    UnusedOptions { label: &'static str, keys: String },

    #[error("Failed to find stream information.")]
    Probe,

    #[error("Failed to {action} ({reason}).")]
    Configure { action: &'static str, reason: String },

    #[error("Stream index {index} is out of range ({count} streams).")]
    StreamIndex { index: usize, count: usize },

    #[error("No {0:?} stream found.")]
    NoStream(AVMediaType),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{message}: {reason} (error code {code}).")]
    Native {
        message: String,
        code: c_int,
        reason: String,
    },
}

/// Human readable description of a native status code.
pub(crate) fn av_err2str<N: Native>(code: c_int) -> String {
    let mut buffer = [0 as c_char; 1024];
    let ret = unsafe { N::av_strerror(code, buffer.as_mut_ptr(), buffer.len()) };

    if ret < 0 {
        return format!("error code {}", code);
    }

    unsafe { CStr::from_ptr(buffer.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Wraps a failed native status code together with its description.
pub(crate) fn native_error<N: Native>(message: impl ToString, code: c_int) -> anyhow::Error {
    AVError::Native {
        message: message.to_string(),
        code,
        reason: av_err2str::<N>(code),
    }
    .into()
}

/// Copies a possibly-null C string owned by the native library.
pub(crate) unsafe fn lossy_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }

    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}
