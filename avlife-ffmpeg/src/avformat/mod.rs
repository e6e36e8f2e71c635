use avlife_proc_macro::wrap_ffmpeg;
use num_enum::TryFromPrimitive;

pub mod av_stream;
pub mod avformat_context;

#[repr(i32)]
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, TryFromPrimitive)]
pub enum AVMediaType {
    UNKNOWN = -1,
    VIDEO = 0,
    AUDIO = 1,
    DATA = 2,
    SUBTITLE = 3,
    ATTACHMENT = 4,
}

impl AVMediaType {
    pub(crate) fn from_raw(value: i32) -> Self {
        AVMediaType::try_from(value).unwrap_or(AVMediaType::UNKNOWN)
    }
}

wrap_ffmpeg!(
    AVFormatContext<FormatContext> drop+ [avformat_close_input]
);
