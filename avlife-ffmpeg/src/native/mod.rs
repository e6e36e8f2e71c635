//! The native multimedia library as seen by the wrappers.
//!
//! Every wrapper in this crate is generic over [`Native`], so the same
//! ownership code runs on top of the real FFmpeg bindings or on top of an
//! in-process stand-in. Functions carry the name of the C function they stand
//! for and keep its calling convention: raw pointers in, status codes or raw
//! pointers out, nothing checked.

use std::ffi::{c_char, c_int, c_uint};

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
#[cfg(test)]
pub(crate) mod fake;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FFmpeg;

/// Codec identifier as used by the native library.
pub type CodecId = c_uint;

/// Iterate every entry regardless of the key suffix.
pub const AV_DICT_IGNORE_SUFFIX: c_int = 2;

#[allow(clippy::missing_safety_doc)]
pub trait Native: 'static {
    type FormatContext;
    type InputFormat;
    type Packet;
    type Frame;
    type Codec;
    type CodecContext;
    type CodecParameters;
    type FilterGraph;
    type Dictionary;
    type DictionaryEntry;

    /// Status returned when the decoder needs more input.
    const EAGAIN: c_int;
    /// Status returned at end of stream.
    const EOF: c_int;

    unsafe fn av_strerror(errnum: c_int, buf: *mut c_char, size: usize) -> c_int;

    unsafe fn av_dict_set(
        dict: *mut *mut Self::Dictionary,
        key: *const c_char,
        value: *const c_char,
        flags: c_int,
    ) -> c_int;
    unsafe fn av_dict_get(
        dict: *const Self::Dictionary,
        key: *const c_char,
        prev: *const Self::DictionaryEntry,
        flags: c_int,
    ) -> *mut Self::DictionaryEntry;
    unsafe fn av_dict_entry_key(entry: *const Self::DictionaryEntry) -> *const c_char;
    unsafe fn av_dict_free(dict: *mut *mut Self::Dictionary);

    unsafe fn av_find_input_format(name: *const c_char) -> *const Self::InputFormat;
    unsafe fn avformat_open_input(
        context: *mut *mut Self::FormatContext,
        url: *const c_char,
        format: *const Self::InputFormat,
        options: *mut *mut Self::Dictionary,
    ) -> c_int;
    unsafe fn avformat_find_stream_info(context: *mut Self::FormatContext) -> c_int;
    unsafe fn avformat_close_input(context: *mut *mut Self::FormatContext);
    unsafe fn av_read_frame(context: *mut Self::FormatContext, packet: *mut Self::Packet) -> c_int;
    unsafe fn format_nb_streams(context: *const Self::FormatContext) -> c_uint;
    unsafe fn format_stream_parameters(
        context: *const Self::FormatContext,
        index: c_uint,
    ) -> *mut Self::CodecParameters;

    unsafe fn av_packet_alloc() -> *mut Self::Packet;
    unsafe fn av_packet_unref(packet: *mut Self::Packet);
    unsafe fn av_packet_free(packet: *mut *mut Self::Packet);
    unsafe fn packet_size(packet: *const Self::Packet) -> c_int;
    unsafe fn packet_stream_index(packet: *const Self::Packet) -> c_int;

    unsafe fn av_frame_alloc() -> *mut Self::Frame;
    unsafe fn av_frame_free(frame: *mut *mut Self::Frame);

    unsafe fn avcodec_find_decoder(id: CodecId) -> *const Self::Codec;
    unsafe fn avcodec_find_decoder_by_name(name: *const c_char) -> *const Self::Codec;
    unsafe fn avcodec_get_name(id: CodecId) -> *const c_char;
    unsafe fn avcodec_alloc_context3(codec: *const Self::Codec) -> *mut Self::CodecContext;
    unsafe fn avcodec_parameters_to_context(
        context: *mut Self::CodecContext,
        parameters: *const Self::CodecParameters,
    ) -> c_int;
    unsafe fn avcodec_open2(
        context: *mut Self::CodecContext,
        codec: *const Self::Codec,
        options: *mut *mut Self::Dictionary,
    ) -> c_int;
    unsafe fn avcodec_send_packet(
        context: *mut Self::CodecContext,
        packet: *const Self::Packet,
    ) -> c_int;
    unsafe fn avcodec_receive_frame(
        context: *mut Self::CodecContext,
        frame: *mut Self::Frame,
    ) -> c_int;
    unsafe fn avcodec_free_context(context: *mut *mut Self::CodecContext);
    unsafe fn codec_context_channels(context: *const Self::CodecContext) -> c_int;

    unsafe fn parameters_codec_id(parameters: *const Self::CodecParameters) -> CodecId;
    unsafe fn parameters_codec_type(parameters: *const Self::CodecParameters) -> c_int;
    /// Channel mask of the stream, `0` when the layout is not a plain mask.
    unsafe fn parameters_channel_layout(parameters: *const Self::CodecParameters) -> u64;
    /// Whether the stream declares any channel layout, mask-based or not.
    unsafe fn parameters_has_channel_layout(parameters: *const Self::CodecParameters) -> bool;
    /// Replaces the stream layout with `layout`. On failure the stream is left
    /// as it was.
    unsafe fn parameters_set_channel_layout(parameters: *mut Self::CodecParameters, layout: u64) -> c_int;
    /// Default channel mask for `channels` channels, `0` when there is none.
    unsafe fn default_channel_layout(channels: c_int) -> u64;

    unsafe fn avfilter_graph_alloc() -> *mut Self::FilterGraph;
    unsafe fn avfilter_graph_free(graph: *mut *mut Self::FilterGraph);
}
