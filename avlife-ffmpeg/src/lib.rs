//! Owned wrappers for libav* handles.
//!
//! Each wrapper holds exactly one native handle, is built by a single call
//! that either fully succeeds or leaves nothing behind, and frees the handle
//! once when it goes out of scope. Calls that take an [`Options`] map fail if
//! the library leaves any key unconsumed.
//!
//! All wrappers are generic over the [`Native`](native::Native) library; with
//! the `ffmpeg` feature the [`FFmpeg`](native::FFmpeg) bindings and the
//! aliases in [`ffmpeg`] are available.

#[macro_use]
mod util;
#[cfg(feature = "ffmpeg")]
mod ffi;

pub mod av_dictionary;
pub mod avcodec;
pub mod avfilter_graph;
pub mod avformat;
pub mod avframe;
pub mod avpacket;
pub mod native;

pub use av_dictionary::{AVDictionary, Options};
pub use avcodec::{AVCodec, AVCodecContext, AVCodecParameters};
pub use avfilter_graph::AVFilterGraph;
pub use avformat::{AVFormatContext, AVMediaType};
pub use avframe::AVFrame;
pub use avpacket::{AVPacket, AutoPacketUnref};
pub use util::error_handler::AVError;

/// The wrappers bound to the system FFmpeg libraries.
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg {
    use crate::native::FFmpeg;

    pub type FormatContext = crate::AVFormatContext<FFmpeg>;
    pub type Packet = crate::AVPacket<FFmpeg>;
    pub type Frame = crate::AVFrame<FFmpeg>;
    pub type Codec = crate::AVCodec<FFmpeg>;
    pub type CodecContext = crate::AVCodecContext<FFmpeg>;
    pub type CodecParameters<'a> = crate::AVCodecParameters<'a, FFmpeg>;
    pub type FilterGraph = crate::AVFilterGraph<FFmpeg>;
    pub type Dictionary = crate::AVDictionary<FFmpeg>;
}
