use avlife_proc_macro::wrap_ffmpeg;

pub mod codec_context;
pub mod codec_parameters;
pub mod open_codec;

pub use codec_parameters::AVCodecParameters;

wrap_ffmpeg!(
    AVCodecContext<CodecContext> drop+ [avcodec_free_context]
);

// Decoder descriptors are static in the library and never freed.
wrap_ffmpeg!(
    AVCodec<Codec>
);
