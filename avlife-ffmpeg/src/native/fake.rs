//! In-process stand-in for the native library.
//!
//! Keeps per-thread books of every allocation and release so tests can assert
//! that each handle is freed exactly once. Freeing a pointer that is not live
//! panics.

use super::{CodecId, Native, AV_DICT_IGNORE_SUFFIX};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_int, c_uint, CStr, CString};
use std::ptr::{null, null_mut};

pub(crate) const ENOENT: c_int = -2;
pub(crate) const EINVAL: c_int = -22;
const EAGAIN: c_int = -11;
const EOF: c_int = -0x2046_4f45;

pub(crate) const AUDIO: c_int = 1;
pub(crate) const VIDEO: c_int = 0;

pub(crate) const PCM_ID: CodecId = 65536;
pub(crate) const H264_ID: CodecId = 27;
pub(crate) const OPUS_ID: CodecId = 86076;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Kind {
    FormatContext,
    Packet,
    Frame,
    CodecContext,
    FilterGraph,
    Dictionary,
}

pub(crate) struct FakeInputFormat {
    pub(crate) name: &'static CStr,
}

static INPUT_FORMATS: [FakeInputFormat; 2] = [
    FakeInputFormat { name: c"lavfi" },
    FakeInputFormat { name: c"alsa" },
];

pub(crate) struct FakeCodec {
    pub(crate) id: CodecId,
    pub(crate) name: &'static CStr,
}

static DECODERS: [FakeCodec; 3] = [
    FakeCodec { id: PCM_ID, name: c"pcm_s16le" },
    FakeCodec { id: H264_ID, name: c"h264" },
    FakeCodec { id: PCM_ID, name: c"pcm_s16le_planar" },
];

pub(crate) struct FakeEntry {
    key: CString,
    #[allow(dead_code)]
    value: CString,
}

#[derive(Default)]
pub(crate) struct FakeDictionary {
    entries: Vec<FakeEntry>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeParameters {
    pub(crate) codec_id: CodecId,
    pub(crate) codec_type: c_int,
    pub(crate) channel_layout: u64,
    /// A declared layout that is not a plain mask.
    pub(crate) custom_layout: bool,
    pub(crate) channels: c_int,
}

pub(crate) struct FakeFormatContext {
    streams: Vec<Box<FakeParameters>>,
    remaining_packets: usize,
    next_stream: usize,
}

#[derive(Default)]
pub(crate) struct FakePacket {
    pub(crate) data: Vec<u8>,
    pub(crate) stream_index: c_int,
}

#[derive(Default)]
pub(crate) struct FakeFrame {
    pub(crate) filled: bool,
}

pub(crate) struct FakeCodecContext {
    codec: *const FakeCodec,
    channels: c_int,
    pending_frames: usize,
}

pub(crate) struct FakeFilterGraph {
    pub(crate) serial: usize,
}

#[derive(Default)]
struct State {
    allocations: HashMap<Kind, usize>,
    frees: HashMap<Kind, usize>,
    live: HashMap<Kind, HashSet<usize>>,

    fail_next_allocation: HashSet<Kind>,
    fail_probe: bool,
    fail_parameters: bool,
    fail_codec_open: bool,
    fail_channel_layout: bool,
    swap_second_lookup: bool,
    decoder_lookups: usize,

    sources: HashSet<String>,
    streams: Vec<FakeParameters>,
    packets_per_source: usize,
    format_keys: HashSet<String>,
    codec_keys: HashSet<String>,
    last_input_format: Option<String>,
    filter_graph_serial: usize,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

fn with_state<T>(f: impl FnOnce(&mut State) -> T) -> T {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Clears every counter and switch of the current thread.
pub(crate) fn reset() {
    with_state(|state| *state = State::default());
}

pub(crate) fn allocations(kind: Kind) -> usize {
    with_state(|state| state.allocations.get(&kind).copied().unwrap_or_default())
}

pub(crate) fn frees(kind: Kind) -> usize {
    with_state(|state| state.frees.get(&kind).copied().unwrap_or_default())
}

pub(crate) fn live(kind: Kind) -> usize {
    with_state(|state| state.live.get(&kind).map(HashSet::len).unwrap_or_default())
}

/// Asserts that nothing of any kind is still allocated.
pub(crate) fn assert_no_leaks() {
    for kind in [
        Kind::FormatContext,
        Kind::Packet,
        Kind::Frame,
        Kind::CodecContext,
        Kind::FilterGraph,
        Kind::Dictionary,
    ] {
        assert_eq!(
            allocations(kind),
            frees(kind),
            "{:?} allocated {} times but freed {} times",
            kind,
            allocations(kind),
            frees(kind)
        );
    }
}

pub(crate) fn fail_next_allocation(kind: Kind) {
    with_state(|state| state.fail_next_allocation.insert(kind));
}

pub(crate) fn fail_probe() {
    with_state(|state| state.fail_probe = true);
}

pub(crate) fn fail_parameters() {
    with_state(|state| state.fail_parameters = true);
}

pub(crate) fn fail_codec_open() {
    with_state(|state| state.fail_codec_open = true);
}

pub(crate) fn fail_channel_layout() {
    with_state(|state| state.fail_channel_layout = true);
}

/// Makes every decoder lookup after the first one return a different decoder.
pub(crate) fn swap_second_lookup() {
    with_state(|state| state.swap_second_lookup = true);
}

pub(crate) fn decoder_lookups() -> usize {
    with_state(|state| state.decoder_lookups)
}

pub(crate) fn add_source(url: &str, streams: Vec<FakeParameters>, packets: usize) {
    with_state(|state| {
        state.sources.insert(url.to_string());
        state.streams = streams;
        state.packets_per_source = packets;
    });
}

pub(crate) fn recognise_format_keys(keys: &[&str]) {
    with_state(|state| state.format_keys.extend(keys.iter().map(|x| x.to_string())));
}

pub(crate) fn recognise_codec_keys(keys: &[&str]) {
    with_state(|state| state.codec_keys.extend(keys.iter().map(|x| x.to_string())));
}

pub(crate) fn last_input_format() -> Option<String> {
    with_state(|state| state.last_input_format.clone())
}

pub(crate) fn audio_stream(codec_id: CodecId, channels: c_int, channel_layout: u64) -> FakeParameters {
    FakeParameters {
        codec_id,
        codec_type: AUDIO,
        channel_layout,
        custom_layout: false,
        channels,
    }
}

pub(crate) fn video_stream(codec_id: CodecId) -> FakeParameters {
    FakeParameters {
        codec_id,
        codec_type: VIDEO,
        ..Default::default()
    }
}

/// Puts `len` bytes into a packet as a demuxer would.
pub(crate) fn fill_packet(packet: *mut FakePacket, len: usize) {
    unsafe {
        (*packet).data = vec![0xAB; len];
    }
}

pub(crate) fn filter_graph_serial(graph: *const FakeFilterGraph) -> usize {
    unsafe { (*graph).serial }
}

fn allocate<T>(kind: Kind, value: T) -> *mut T {
    let fail = with_state(|state| state.fail_next_allocation.remove(&kind));
    if fail {
        return null_mut();
    }

    let ptr = Box::into_raw(Box::new(value));
    with_state(|state| {
        *state.allocations.entry(kind).or_default() += 1;
        state.live.entry(kind).or_default().insert(ptr as usize);
    });
    ptr
}

unsafe fn release<T>(kind: Kind, ptr: *mut *mut T) {
    if (*ptr).is_null() {
        return;
    }

    let address = *ptr as usize;
    let was_live = with_state(|state| {
        *state.frees.entry(kind).or_default() += 1;
        state.live.entry(kind).or_default().remove(&address)
    });
    assert!(was_live, "{:?} at {:#x} freed twice or never allocated", kind, address);

    drop(Box::from_raw(*ptr));
    *ptr = null_mut();
}

/// Splits the entries of `*options` into recognised and leftover keys and
/// replaces the dictionary with a freshly allocated one holding the leftovers.
unsafe fn consume_options(options: *mut *mut FakeDictionary, recognised: &HashSet<String>) {
    if options.is_null() {
        return;
    }

    let leftovers = if (*options).is_null() {
        vec![]
    } else {
        std::mem::take(&mut (**options).entries)
            .into_iter()
            .filter(|x| !recognised.contains(x.key.to_str().unwrap_or_default()))
            .collect()
    };

    release(Kind::Dictionary, options);
    *options = allocate(Kind::Dictionary, FakeDictionary { entries: leftovers });
}

pub(crate) struct Fake;

impl Native for Fake {
    type FormatContext = FakeFormatContext;
    type InputFormat = FakeInputFormat;
    type Packet = FakePacket;
    type Frame = FakeFrame;
    type Codec = FakeCodec;
    type CodecContext = FakeCodecContext;
    type CodecParameters = FakeParameters;
    type FilterGraph = FakeFilterGraph;
    type Dictionary = FakeDictionary;
    type DictionaryEntry = FakeEntry;

    const EAGAIN: c_int = EAGAIN;
    const EOF: c_int = EOF;

    unsafe fn av_strerror(errnum: c_int, buf: *mut c_char, size: usize) -> c_int {
        let message = match errnum {
            ENOENT => "No such file or directory",
            EINVAL => "Invalid argument",
            EAGAIN => "Resource temporarily unavailable",
            EOF => "End of file",
            _ => return -1,
        };

        let bytes = message.as_bytes();
        let len = bytes.len().min(size.saturating_sub(1));
        for (index, byte) in bytes.iter().take(len).enumerate() {
            *buf.add(index) = *byte as c_char;
        }
        *buf.add(len) = 0;
        0
    }

    unsafe fn av_dict_set(
        dict: *mut *mut FakeDictionary,
        key: *const c_char,
        value: *const c_char,
        _flags: c_int,
    ) -> c_int {
        if (*dict).is_null() {
            *dict = allocate(Kind::Dictionary, FakeDictionary::default());
            if (*dict).is_null() {
                return EINVAL;
            }
        }

        let key = CStr::from_ptr(key).to_owned();
        let value = CStr::from_ptr(value).to_owned();
        let entries = &mut (**dict).entries;
        match entries.iter_mut().find(|x| x.key == key) {
            Some(entry) => entry.value = value,
            None => entries.push(FakeEntry { key, value }),
        }
        0
    }

    unsafe fn av_dict_get(
        dict: *const FakeDictionary,
        key: *const c_char,
        prev: *const FakeEntry,
        flags: c_int,
    ) -> *mut FakeEntry {
        assert_eq!(CStr::from_ptr(key).to_bytes(), b"");
        assert_eq!(flags & AV_DICT_IGNORE_SUFFIX, AV_DICT_IGNORE_SUFFIX);
        if dict.is_null() {
            return null_mut();
        }

        let entries = &(*dict).entries;
        let next = if prev.is_null() {
            0
        } else {
            match entries.iter().position(|x| std::ptr::eq(x, prev)) {
                Some(index) => index + 1,
                None => return null_mut(),
            }
        };

        entries
            .get(next)
            .map(|x| x as *const FakeEntry as *mut FakeEntry)
            .unwrap_or(null_mut())
    }

    unsafe fn av_dict_entry_key(entry: *const FakeEntry) -> *const c_char {
        (*entry).key.as_ptr()
    }

    unsafe fn av_dict_free(dict: *mut *mut FakeDictionary) {
        release(Kind::Dictionary, dict);
    }

    unsafe fn av_find_input_format(name: *const c_char) -> *const FakeInputFormat {
        let name = CStr::from_ptr(name);
        INPUT_FORMATS
            .iter()
            .find(|x| x.name == name)
            .map(|x| x as *const FakeInputFormat)
            .unwrap_or(null())
    }

    unsafe fn avformat_open_input(
        context: *mut *mut FakeFormatContext,
        url: *const c_char,
        format: *const FakeInputFormat,
        options: *mut *mut FakeDictionary,
    ) -> c_int {
        let url = CStr::from_ptr(url).to_string_lossy().into_owned();
        let known = with_state(|state| {
            state.last_input_format = (!format.is_null())
                .then(|| (*format).name.to_string_lossy().into_owned());
            state.sources.contains(&url)
        });

        let created = allocate(
            Kind::FormatContext,
            FakeFormatContext {
                streams: vec![],
                remaining_packets: 0,
                next_stream: 0,
            },
        );
        if created.is_null() {
            return EINVAL;
        }

        if !known {
            let mut created = created;
            release(Kind::FormatContext, &mut created);
            *context = null_mut();
            return ENOENT;
        }

        let recognised = with_state(|state| {
            (*created).streams = state.streams.iter().cloned().map(Box::new).collect();
            (*created).remaining_packets = state.packets_per_source;
            state.format_keys.clone()
        });
        consume_options(options, &recognised);

        *context = created;
        0
    }

    unsafe fn avformat_find_stream_info(_context: *mut FakeFormatContext) -> c_int {
        if with_state(|state| state.fail_probe) {
            EINVAL
        } else {
            0
        }
    }

    unsafe fn avformat_close_input(context: *mut *mut FakeFormatContext) {
        release(Kind::FormatContext, context);
    }

    unsafe fn av_read_frame(context: *mut FakeFormatContext, packet: *mut FakePacket) -> c_int {
        let context = &mut *context;
        if context.remaining_packets == 0 {
            return EOF;
        }
        assert!(
            (*packet).data.is_empty(),
            "packet buffer overwritten without unref"
        );

        context.remaining_packets -= 1;
        let stream_index = context.next_stream % context.streams.len().max(1);
        context.next_stream += 1;

        fill_packet(packet, 64);
        (*packet).stream_index = stream_index as c_int;
        0
    }

    unsafe fn format_nb_streams(context: *const FakeFormatContext) -> c_uint {
        (*context).streams.len() as c_uint
    }

    unsafe fn format_stream_parameters(
        context: *const FakeFormatContext,
        index: c_uint,
    ) -> *mut FakeParameters {
        let streams = &(*context).streams;
        &*streams[index as usize] as *const FakeParameters as *mut FakeParameters
    }

    unsafe fn av_packet_alloc() -> *mut FakePacket {
        allocate(Kind::Packet, FakePacket::default())
    }

    unsafe fn av_packet_unref(packet: *mut FakePacket) {
        *packet = FakePacket::default();
    }

    unsafe fn av_packet_free(packet: *mut *mut FakePacket) {
        release(Kind::Packet, packet);
    }

    unsafe fn packet_size(packet: *const FakePacket) -> c_int {
        (*packet).data.len() as c_int
    }

    unsafe fn packet_stream_index(packet: *const FakePacket) -> c_int {
        (*packet).stream_index
    }

    unsafe fn av_frame_alloc() -> *mut FakeFrame {
        allocate(Kind::Frame, FakeFrame::default())
    }

    unsafe fn av_frame_free(frame: *mut *mut FakeFrame) {
        release(Kind::Frame, frame);
    }

    unsafe fn avcodec_find_decoder(id: CodecId) -> *const FakeCodec {
        let swap = with_state(|state| {
            state.decoder_lookups += 1;
            state.swap_second_lookup && state.decoder_lookups > 1
        });

        let mut matches = DECODERS.iter().filter(|x| x.id == id);
        let found = if swap {
            matches.nth(1)
        } else {
            matches.next()
        };
        found.map(|x| x as *const FakeCodec).unwrap_or(null())
    }

    unsafe fn avcodec_find_decoder_by_name(name: *const c_char) -> *const FakeCodec {
        with_state(|state| state.decoder_lookups += 1);
        let name = CStr::from_ptr(name);
        DECODERS
            .iter()
            .find(|x| x.name == name)
            .map(|x| x as *const FakeCodec)
            .unwrap_or(null())
    }

    unsafe fn avcodec_get_name(id: CodecId) -> *const c_char {
        DECODERS
            .iter()
            .find(|x| x.id == id)
            .map(|x| x.name.as_ptr())
            .unwrap_or(c"unknown_codec".as_ptr())
    }

    unsafe fn avcodec_alloc_context3(codec: *const FakeCodec) -> *mut FakeCodecContext {
        allocate(
            Kind::CodecContext,
            FakeCodecContext {
                codec,
                channels: 0,
                pending_frames: 0,
            },
        )
    }

    unsafe fn avcodec_parameters_to_context(
        context: *mut FakeCodecContext,
        parameters: *const FakeParameters,
    ) -> c_int {
        if with_state(|state| state.fail_parameters) {
            return EINVAL;
        }

        (*context).channels = (*parameters).channels;
        0
    }

    unsafe fn avcodec_open2(
        context: *mut FakeCodecContext,
        codec: *const FakeCodec,
        options: *mut *mut FakeDictionary,
    ) -> c_int {
        if with_state(|state| state.fail_codec_open) {
            return EINVAL;
        }
        if !(*context).codec.is_null() && !std::ptr::eq((*context).codec, codec) {
            return EINVAL;
        }

        (*context).codec = codec;
        let recognised = with_state(|state| state.codec_keys.clone());
        consume_options(options, &recognised);
        0
    }

    unsafe fn avcodec_send_packet(context: *mut FakeCodecContext, packet: *const FakePacket) -> c_int {
        if !(*packet).data.is_empty() {
            (*context).pending_frames += 1;
        }
        0
    }

    unsafe fn avcodec_receive_frame(context: *mut FakeCodecContext, frame: *mut FakeFrame) -> c_int {
        let context = &mut *context;
        if context.pending_frames == 0 {
            (*frame).filled = false;
            return EAGAIN;
        }

        context.pending_frames -= 1;
        (*frame).filled = true;
        0
    }

    unsafe fn avcodec_free_context(context: *mut *mut FakeCodecContext) {
        release(Kind::CodecContext, context);
    }

    unsafe fn codec_context_channels(context: *const FakeCodecContext) -> c_int {
        (*context).channels
    }

    unsafe fn parameters_codec_id(parameters: *const FakeParameters) -> CodecId {
        (*parameters).codec_id
    }

    unsafe fn parameters_codec_type(parameters: *const FakeParameters) -> c_int {
        (*parameters).codec_type
    }

    unsafe fn parameters_channel_layout(parameters: *const FakeParameters) -> u64 {
        (*parameters).channel_layout
    }

    unsafe fn parameters_has_channel_layout(parameters: *const FakeParameters) -> bool {
        (*parameters).channel_layout != 0 || (*parameters).custom_layout
    }

    unsafe fn parameters_set_channel_layout(parameters: *mut FakeParameters, layout: u64) -> c_int {
        if layout == 0 || with_state(|state| state.fail_channel_layout) {
            return EINVAL;
        }

        let parameters = &mut *parameters;
        parameters.channel_layout = layout;
        parameters.custom_layout = false;
        parameters.channels = layout.count_ones() as c_int;
        0
    }

    unsafe fn default_channel_layout(channels: c_int) -> u64 {
        match channels {
            1 => 0x4,
            2 => 0x3,
            // No standard layout outside 1..=8 channels.
            c @ 3..=8 => (1u64 << c) - 1,
            _ => 0,
        }
    }

    unsafe fn avfilter_graph_alloc() -> *mut FakeFilterGraph {
        let serial = with_state(|state| {
            state.filter_graph_serial += 1;
            state.filter_graph_serial
        });
        allocate(Kind::FilterGraph, FakeFilterGraph { serial })
    }

    unsafe fn avfilter_graph_free(graph: *mut *mut FakeFilterGraph) {
        release(Kind::FilterGraph, graph);
    }
}
