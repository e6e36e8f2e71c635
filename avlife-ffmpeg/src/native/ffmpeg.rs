use super::{CodecId, Native};
use crate::ffi;
use std::ffi::{c_char, c_int, c_uint};
use std::ptr::null_mut;

/// The real libav* libraries, through the bindgen bindings.
///
/// Targets the `AVChannelLayout` API introduced in FFmpeg 5.1.
pub struct FFmpeg;

impl Native for FFmpeg {
    type FormatContext = ffi::AVFormatContext;
    type InputFormat = ffi::AVInputFormat;
    type Packet = ffi::AVPacket;
    type Frame = ffi::AVFrame;
    type Codec = ffi::AVCodec;
    type CodecContext = ffi::AVCodecContext;
    type CodecParameters = ffi::AVCodecParameters;
    type FilterGraph = ffi::AVFilterGraph;
    type Dictionary = ffi::AVDictionary;
    type DictionaryEntry = ffi::AVDictionaryEntry;

    const EAGAIN: c_int = -(ffi::EAGAIN as c_int);
    // FFERRTAG('E', 'O', 'F', ' ')
    const EOF: c_int = -0x2046_4f45;

    unsafe fn av_strerror(errnum: c_int, buf: *mut c_char, size: usize) -> c_int {
        ffi::av_strerror(errnum, buf, size)
    }

    unsafe fn av_dict_set(
        dict: *mut *mut ffi::AVDictionary,
        key: *const c_char,
        value: *const c_char,
        flags: c_int,
    ) -> c_int {
        ffi::av_dict_set(dict, key, value, flags)
    }

    unsafe fn av_dict_get(
        dict: *const ffi::AVDictionary,
        key: *const c_char,
        prev: *const ffi::AVDictionaryEntry,
        flags: c_int,
    ) -> *mut ffi::AVDictionaryEntry {
        ffi::av_dict_get(dict, key, prev, flags)
    }

    unsafe fn av_dict_entry_key(entry: *const ffi::AVDictionaryEntry) -> *const c_char {
        (*entry).key
    }

    unsafe fn av_dict_free(dict: *mut *mut ffi::AVDictionary) {
        ffi::av_dict_free(dict)
    }

    unsafe fn av_find_input_format(name: *const c_char) -> *const ffi::AVInputFormat {
        ffi::av_find_input_format(name)
    }

    unsafe fn avformat_open_input(
        context: *mut *mut ffi::AVFormatContext,
        url: *const c_char,
        format: *const ffi::AVInputFormat,
        options: *mut *mut ffi::AVDictionary,
    ) -> c_int {
        ffi::avformat_open_input(context, url, format, options)
    }

    unsafe fn avformat_find_stream_info(context: *mut ffi::AVFormatContext) -> c_int {
        ffi::avformat_find_stream_info(context, null_mut())
    }

    unsafe fn avformat_close_input(context: *mut *mut ffi::AVFormatContext) {
        ffi::avformat_close_input(context)
    }

    unsafe fn av_read_frame(context: *mut ffi::AVFormatContext, packet: *mut ffi::AVPacket) -> c_int {
        ffi::av_read_frame(context, packet)
    }

    unsafe fn format_nb_streams(context: *const ffi::AVFormatContext) -> c_uint {
        (*context).nb_streams
    }

    unsafe fn format_stream_parameters(
        context: *const ffi::AVFormatContext,
        index: c_uint,
    ) -> *mut ffi::AVCodecParameters {
        (**(*context).streams.add(index as usize)).codecpar
    }

    unsafe fn av_packet_alloc() -> *mut ffi::AVPacket {
        ffi::av_packet_alloc()
    }

    unsafe fn av_packet_unref(packet: *mut ffi::AVPacket) {
        ffi::av_packet_unref(packet)
    }

    unsafe fn av_packet_free(packet: *mut *mut ffi::AVPacket) {
        ffi::av_packet_free(packet)
    }

    unsafe fn packet_size(packet: *const ffi::AVPacket) -> c_int {
        (*packet).size
    }

    unsafe fn packet_stream_index(packet: *const ffi::AVPacket) -> c_int {
        (*packet).stream_index
    }

    unsafe fn av_frame_alloc() -> *mut ffi::AVFrame {
        ffi::av_frame_alloc()
    }

    unsafe fn av_frame_free(frame: *mut *mut ffi::AVFrame) {
        ffi::av_frame_free(frame)
    }

    unsafe fn avcodec_find_decoder(id: CodecId) -> *const ffi::AVCodec {
        ffi::avcodec_find_decoder(id as ffi::AVCodecID)
    }

    unsafe fn avcodec_find_decoder_by_name(name: *const c_char) -> *const ffi::AVCodec {
        ffi::avcodec_find_decoder_by_name(name)
    }

    unsafe fn avcodec_get_name(id: CodecId) -> *const c_char {
        ffi::avcodec_get_name(id as ffi::AVCodecID)
    }

    unsafe fn avcodec_alloc_context3(codec: *const ffi::AVCodec) -> *mut ffi::AVCodecContext {
        ffi::avcodec_alloc_context3(codec)
    }

    unsafe fn avcodec_parameters_to_context(
        context: *mut ffi::AVCodecContext,
        parameters: *const ffi::AVCodecParameters,
    ) -> c_int {
        ffi::avcodec_parameters_to_context(context, parameters)
    }

    unsafe fn avcodec_open2(
        context: *mut ffi::AVCodecContext,
        codec: *const ffi::AVCodec,
        options: *mut *mut ffi::AVDictionary,
    ) -> c_int {
        ffi::avcodec_open2(context, codec, options)
    }

    unsafe fn avcodec_send_packet(
        context: *mut ffi::AVCodecContext,
        packet: *const ffi::AVPacket,
    ) -> c_int {
        ffi::avcodec_send_packet(context, packet)
    }

    unsafe fn avcodec_receive_frame(context: *mut ffi::AVCodecContext, frame: *mut ffi::AVFrame) -> c_int {
        ffi::avcodec_receive_frame(context, frame)
    }

    unsafe fn avcodec_free_context(context: *mut *mut ffi::AVCodecContext) {
        ffi::avcodec_free_context(context)
    }

    unsafe fn codec_context_channels(context: *const ffi::AVCodecContext) -> c_int {
        (*context).ch_layout.nb_channels
    }

    unsafe fn parameters_codec_id(parameters: *const ffi::AVCodecParameters) -> CodecId {
        (*parameters).codec_id as CodecId
    }

    unsafe fn parameters_codec_type(parameters: *const ffi::AVCodecParameters) -> c_int {
        (*parameters).codec_type as c_int
    }

    unsafe fn parameters_channel_layout(parameters: *const ffi::AVCodecParameters) -> u64 {
        let layout = &(*parameters).ch_layout;
        if layout.order == ffi::AVChannelOrder_AV_CHANNEL_ORDER_NATIVE {
            layout.u.mask
        } else {
            0
        }
    }

    unsafe fn parameters_has_channel_layout(parameters: *const ffi::AVCodecParameters) -> bool {
        (*parameters).ch_layout.order != ffi::AVChannelOrder_AV_CHANNEL_ORDER_UNSPEC
    }

    unsafe fn parameters_set_channel_layout(parameters: *mut ffi::AVCodecParameters, layout: u64) -> c_int {
        let mut replacement: ffi::AVChannelLayout = std::mem::zeroed();
        let ret = ffi::av_channel_layout_from_mask(&mut replacement, layout);
        if ret < 0 {
            return ret;
        }

        let target = &mut (*parameters).ch_layout;
        ffi::av_channel_layout_uninit(target);
        // Mask layouts own no heap storage, a bitwise move is enough.
        *target = replacement;
        0
    }

    unsafe fn default_channel_layout(channels: c_int) -> u64 {
        let mut layout: ffi::AVChannelLayout = std::mem::zeroed();
        ffi::av_channel_layout_default(&mut layout, channels);

        let mask = if layout.order == ffi::AVChannelOrder_AV_CHANNEL_ORDER_NATIVE {
            layout.u.mask
        } else {
            0
        };
        ffi::av_channel_layout_uninit(&mut layout);
        mask
    }

    unsafe fn avfilter_graph_alloc() -> *mut ffi::AVFilterGraph {
        ffi::avfilter_graph_alloc()
    }

    unsafe fn avfilter_graph_free(graph: *mut *mut ffi::AVFilterGraph) {
        ffi::avfilter_graph_free(graph)
    }
}
