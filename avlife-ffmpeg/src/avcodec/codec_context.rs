use crate::av_dictionary::{ensure_consumed, AVDictionary, Options};
use crate::avcodec::{AVCodec, AVCodecContext, AVCodecParameters};
use crate::avformat::AVMediaType;
use crate::avframe::AVFrame;
use crate::avpacket::AVPacket;
use crate::native::Native;
use crate::util::error_handler::{av_err2str, native_error, AVError};
use anyhow::Result;
use log::debug;

impl<N: Native> AVCodecContext<N> {
    /// Opens a decoder for `parameters`.
    ///
    /// `decoder` overrides the decoder picked from the codec id when it is
    /// not empty. For audio streams without a channel layout the default
    /// layout for the decoder's channel count is written back into
    /// `parameters`.
    pub fn open(parameters: &mut AVCodecParameters<'_, N>, decoder: &str, options: &Options) -> Result<Self> {
        let codec = AVCodec::<N>::find_decoder(parameters.codec_id(), decoder)?;

        let inner = unsafe { N::avcodec_alloc_context3(codec.inner) };
        if inner.is_null() {
            return Err(AVError::Allocation("CodecContext").into());
        }

        let mut context = AVCodecContext { inner };
        context.init(&codec, parameters, decoder, options)?;

        debug!(
            "Opened {} decoder at {:p} with {} channels",
            parameters.codec_name(),
            context.inner,
            context.channels()
        );
        Ok(context)
    }

    fn init(
        &mut self,
        selected: &AVCodec<N>,
        parameters: &mut AVCodecParameters<'_, N>,
        decoder: &str,
        options: &Options,
    ) -> Result<()> {
        // Bind whatever the library resolves now and make sure it is still
        // the decoder the context was allocated for.
        let codec = AVCodec::<N>::find_decoder(parameters.codec_id(), decoder)?;
        if codec != *selected {
            return Err(AVError::DecoderMismatch.into());
        }

        let ret = unsafe { N::avcodec_parameters_to_context(self.inner, parameters.inner) };
        if ret < 0 {
            return Err(AVError::Configure {
                action: "set CodecContext parameter",
                reason: av_err2str::<N>(ret),
            }
            .into());
        }

        let mut dictionary = AVDictionary::<N>::build(options)?;
        let ret = unsafe { N::avcodec_open2(self.inner, codec.inner, dictionary.as_mut_ptr()) };
        let unused = dictionary.drain();

        if ret < 0 {
            return Err(AVError::Configure {
                action: "initialize CodecContext",
                reason: av_err2str::<N>(ret),
            }
            .into());
        }
        ensure_consumed(&unused, "decoder options")?;

        // Later stages read the layout from the stream, not from the context.
        if parameters.media_type() == AVMediaType::AUDIO && !parameters.has_channel_layout() {
            let layout = unsafe { N::default_channel_layout(self.channels() as i32) };
            if layout == 0 {
                debug!("No default layout for {} channels, keeping the stream as is", self.channels());
            } else {
                parameters.set_channel_layout(layout)?;
            }
        }

        Ok(())
    }

    pub fn channels(&self) -> usize {
        unsafe { N::codec_context_channels(self.inner) }.max(0) as usize
    }

    pub fn send_packet(&mut self, packet: &AVPacket<N>) -> Result<()> {
        ffmpeg! {
            N::avcodec_send_packet(self.inner, packet.inner) or "Failed to send packet to decoder"
        }

        Ok(())
    }

    /// Fetches the next decoded frame into `frame`. Returns `false` when the
    /// decoder needs more input or is drained.
    pub fn receive_frame(&mut self, frame: &mut AVFrame<N>) -> Result<bool> {
        let ret = unsafe { N::avcodec_receive_frame(self.inner, frame.inner) };

        if ret == N::EAGAIN || ret == N::EOF {
            return Ok(false);
        }
        if ret < 0 {
            return Err(native_error::<N>("Failed to receive frame from decoder", ret));
        }

        Ok(true)
    }
}

#[cfg(test)]
fn open_fake(
    stream: crate::native::fake::FakeParameters,
    decoder: &str,
    options: &[(&str, &str)],
) -> (Result<AVCodecContext<crate::native::fake::Fake>>, crate::native::fake::FakeParameters) {
    let options = options
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<Options>();

    let mut stream = stream;
    let result = {
        let mut parameters = unsafe { AVCodecParameters::<crate::native::fake::Fake>::from_raw(&mut stream) };
        AVCodecContext::open(&mut parameters, decoder, &options)
    };
    (result, stream)
}

#[test]
fn test_open_and_free() {
    use crate::native::fake::{self, Kind, PCM_ID};
    fake::reset();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0x3), "", &[]);
    let context = context.unwrap();
    assert_eq!(context.channels(), 2);
    assert_eq!(fake::live(Kind::CodecContext), 1);

    drop(context);
    assert_eq!(fake::frees(Kind::CodecContext), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_unknown_decoder_name_allocates_nothing() {
    use crate::native::fake::{self, Kind, PCM_ID};
    fake::reset();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "not-a-real-decoder", &[]);
    let message = context.unwrap_err().to_string();
    assert!(message.contains("Unsupported codec"), "{}", message);
    assert!(message.contains("not-a-real-decoder"), "{}", message);
    assert_eq!(fake::allocations(Kind::CodecContext), 0);
}

#[test]
fn test_unknown_codec_id_names_codec() {
    use crate::native::fake::{self, Kind, OPUS_ID};
    fake::reset();

    let (context, _) = open_fake(fake::audio_stream(OPUS_ID, 2, 0), "", &[]);
    let error = context.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AVError>(),
        Some(AVError::UnsupportedCodec { id, .. }) if *id == OPUS_ID
    ));
    assert_eq!(fake::allocations(Kind::CodecContext), 0);
}

#[test]
fn test_allocation_failure() {
    use crate::native::fake::{self, Kind, PCM_ID};
    fake::reset();
    fake::fail_next_allocation(Kind::CodecContext);

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    assert_eq!(context.unwrap_err().to_string(), "Failed to allocate CodecContext.");
    fake::assert_no_leaks();
}

#[test]
fn test_parameter_copy_failure_frees_context() {
    use crate::native::fake::{self, Kind, PCM_ID};
    fake::reset();
    fake::fail_parameters();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    assert_eq!(
        context.unwrap_err().to_string(),
        "Failed to set CodecContext parameter (Invalid argument)."
    );
    assert_eq!(fake::allocations(Kind::CodecContext), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_codec_open_failure_frees_context_and_options() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();
    fake::fail_codec_open();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[("threads", "2")]);
    let error = context.unwrap_err();
    assert_eq!(error.to_string(), "Failed to initialize CodecContext (Invalid argument).");
    fake::assert_no_leaks();
}

#[test]
fn test_unused_decoder_options() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();
    fake::recognise_codec_keys(&["threads", "refcounted_frames"]);

    let (context, _) = open_fake(
        fake::audio_stream(PCM_ID, 2, 0),
        "",
        &[("threads", "2"), ("thread", "2"), ("drc_scale", "0")],
    );
    let message = context.unwrap_err().to_string();

    assert!(message.starts_with("Unexpected decoder options: "), "{}", message);
    assert_eq!(message.matches("\"thread\"").count(), 1);
    assert_eq!(message.matches("\"drc_scale\"").count(), 1);
    assert!(!message.contains("\"threads\""));
    fake::assert_no_leaks();
}

#[test]
fn test_recognised_decoder_options() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();
    fake::recognise_codec_keys(&["threads", "refcounted_frames"]);

    let (context, _) = open_fake(
        fake::audio_stream(PCM_ID, 2, 0x3),
        "pcm_s16le",
        &[("threads", "2"), ("refcounted_frames", "1")],
    );
    drop(context.unwrap());
    fake::assert_no_leaks();
}

#[test]
fn test_missing_channel_layout_is_back_filled() {
    use crate::native::fake::{self, Fake, PCM_ID};
    use crate::native::Native;
    fake::reset();

    let (context, stream) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    let context = context.unwrap();

    assert_ne!(stream.channel_layout, 0);
    assert_eq!(stream.channel_layout, unsafe {
        Fake::default_channel_layout(context.channels() as i32)
    });
}

#[test]
fn test_declared_channel_layout_is_kept() {
    use crate::native::fake::{self, H264_ID, PCM_ID};
    fake::reset();

    let (_, stream) = open_fake(fake::audio_stream(PCM_ID, 2, 0x60f), "", &[]);
    assert_eq!(stream.channel_layout, 0x60f);

    let (_, stream) = open_fake(fake::video_stream(H264_ID), "", &[]);
    assert_eq!(stream.channel_layout, 0);
}

#[test]
fn test_channel_count_without_default_layout_is_kept() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();

    let (context, stream) = open_fake(fake::audio_stream(PCM_ID, 9, 0), "", &[]);
    assert_eq!(context.unwrap().channels(), 9);
    assert_eq!(stream.channels, 9);
    assert_eq!(stream.channel_layout, 0);
    assert!(!stream.custom_layout);
}

#[test]
fn test_custom_channel_layout_is_kept() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();

    let mut declared = fake::audio_stream(PCM_ID, 2, 0);
    declared.custom_layout = true;

    let (context, stream) = open_fake(declared, "", &[]);
    assert!(context.is_ok());
    assert!(stream.custom_layout);
    assert_eq!(stream.channel_layout, 0);
    assert_eq!(stream.channels, 2);
}

#[test]
fn test_channel_layout_write_failure() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();
    fake::fail_channel_layout();

    let (context, stream) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    assert_eq!(
        context.unwrap_err().to_string(),
        "Failed to set the default channel layout (Invalid argument)."
    );
    assert_eq!(stream.channels, 2);
    assert_eq!(stream.channel_layout, 0);
    fake::assert_no_leaks();
}

#[test]
fn test_decoder_is_looked_up_twice() {
    use crate::native::fake::{self, PCM_ID};
    fake::reset();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    assert!(context.is_ok());
    assert_eq!(fake::decoder_lookups(), 2);
}

#[test]
fn test_disagreeing_lookups_are_rejected() {
    use crate::native::fake::{self, Kind, PCM_ID};
    fake::reset();
    fake::swap_second_lookup();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    assert!(matches!(
        context.unwrap_err().downcast_ref::<AVError>(),
        Some(AVError::DecoderMismatch)
    ));
    assert_eq!(fake::allocations(Kind::CodecContext), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_decode_round() {
    use crate::native::fake::{self, Fake, PCM_ID};
    fake::reset();

    let (context, _) = open_fake(fake::audio_stream(PCM_ID, 2, 0), "", &[]);
    let mut context = context.unwrap();
    let mut packet = AVPacket::<Fake>::new().unwrap();
    let mut frame = AVFrame::<Fake>::new().unwrap();

    {
        let guard = packet.auto_unref();
        fake::fill_packet(guard.inner, 32);
        context.send_packet(&guard).unwrap();
    }

    assert!(context.receive_frame(&mut frame).unwrap());
    assert!(!context.receive_frame(&mut frame).unwrap());

    drop((context, packet, frame));
    fake::assert_no_leaks();
}
