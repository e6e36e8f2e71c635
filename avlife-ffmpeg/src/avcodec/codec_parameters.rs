use crate::avformat::AVMediaType;
use crate::native::{CodecId, Native};
use crate::util::error_handler::{av_err2str, lossy_string, AVError};
use anyhow::Result;
use std::fmt;
use std::marker::PhantomData;

/// Codec parameters of one stream, borrowed from the format context that
/// owns them.
///
/// Opening a codec context may write a derived channel layout back into
/// them, hence the exclusive borrow.
pub struct AVCodecParameters<'a, N: Native> {
    pub(crate) inner: *mut N::CodecParameters,
    _borrow: PhantomData<&'a mut N::CodecParameters>,
}

impl<'a, N: Native> AVCodecParameters<'a, N> {
    /// # Safety
    ///
    /// `inner` must be valid and not aliased for `'a`.
    pub(crate) unsafe fn from_raw(inner: *mut N::CodecParameters) -> Self {
        AVCodecParameters {
            inner,
            _borrow: PhantomData,
        }
    }

    pub fn codec_id(&self) -> CodecId {
        unsafe { N::parameters_codec_id(self.inner) }
    }

    pub fn codec_name(&self) -> String {
        unsafe { lossy_string(N::avcodec_get_name(self.codec_id())) }
    }

    pub fn media_type(&self) -> AVMediaType {
        AVMediaType::from_raw(unsafe { N::parameters_codec_type(self.inner) })
    }

    /// Channel mask, `0` if the stream declares no layout or one that is not
    /// a plain mask.
    pub fn channel_layout(&self) -> u64 {
        unsafe { N::parameters_channel_layout(self.inner) }
    }

    pub fn has_channel_layout(&self) -> bool {
        unsafe { N::parameters_has_channel_layout(self.inner) }
    }

    pub(crate) fn set_channel_layout(&mut self, layout: u64) -> Result<()> {
        let ret = unsafe { N::parameters_set_channel_layout(self.inner, layout) };
        if ret < 0 {
            return Err(AVError::Configure {
                action: "set the default channel layout",
                reason: av_err2str::<N>(ret),
            }
            .into());
        }

        Ok(())
    }
}

impl<N: Native> fmt::Debug for AVCodecParameters<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AVCodecParameters")
            .field("codec", &self.codec_name())
            .field("media_type", &self.media_type())
            .field("channel_layout", &format_args!("{:#x}", self.channel_layout()))
            .finish()
    }
}
