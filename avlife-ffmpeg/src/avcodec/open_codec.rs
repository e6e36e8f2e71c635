use crate::avcodec::AVCodec;
use crate::native::{CodecId, Native};
use crate::util::error_handler::{lossy_string, AVError};
use anyhow::Result;
use std::ffi::CString;

impl<N: Native> AVCodec<N> {
    /// Looks up a decoder by `name`, or by `id` when `name` is empty.
    pub fn find_decoder(id: CodecId, name: &str) -> Result<Self> {
        let codec = if name.is_empty() {
            unsafe { N::avcodec_find_decoder(id) }
        } else {
            let name_c = CString::new(name)
                .map_err(|_| AVError::InvalidArgument(format!("decoder {:?} contains a NUL byte", name)))?;
            unsafe { N::avcodec_find_decoder_by_name(name_c.as_ptr()) }
        };

        if !codec.is_null() {
            return Ok(AVCodec { inner: codec.cast_mut() });
        }

        let error = if name.is_empty() {
            AVError::UnsupportedCodec {
                name: unsafe { lossy_string(N::avcodec_get_name(id)) },
                id,
            }
        } else {
            AVError::UnsupportedDecoder(name.to_string())
        };
        Err(error.into())
    }
}

impl<N: Native> PartialEq for AVCodec<N> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

#[test]
fn test_find_decoder() {
    use crate::native::fake::{self, Fake, H264_ID, OPUS_ID};
    fake::reset();

    let by_id = AVCodec::<Fake>::find_decoder(H264_ID, "").unwrap();
    let by_name = AVCodec::<Fake>::find_decoder(OPUS_ID, "h264").unwrap();
    assert_eq!(by_id, by_name);

    let error = AVCodec::<Fake>::find_decoder(OPUS_ID, "").unwrap_err();
    assert_eq!(
        error.to_string(),
        format!("Unsupported codec: \"unknown_codec\", ({}).", OPUS_ID)
    );

    let error = AVCodec::<Fake>::find_decoder(H264_ID, "not-a-real-decoder").unwrap_err();
    assert_eq!(error.to_string(), "Unsupported codec: \"not-a-real-decoder\".");
}
