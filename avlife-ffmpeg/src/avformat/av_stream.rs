use crate::avcodec::AVCodecParameters;
use crate::avformat::{AVFormatContext, AVMediaType};
use crate::native::Native;
use crate::util::error_handler::AVError;
use anyhow::Result;

impl<N: Native> AVFormatContext<N> {
    pub fn nb_streams(&self) -> usize {
        unsafe { N::format_nb_streams(self.inner) as usize }
    }

    /// Indices of every stream of `target_type`, in container order.
    pub fn find_streams(&self, target_type: AVMediaType) -> Vec<usize> {
        (0..self.nb_streams())
            .filter(|x| {
                let parameters = unsafe { N::format_stream_parameters(self.inner, *x as u32) };
                AVMediaType::from_raw(unsafe { N::parameters_codec_type(parameters) }) == target_type
            })
            .collect()
    }

    /// First stream of `target_type`.
    pub fn find_best_stream(&self, target_type: AVMediaType) -> Result<usize> {
        self.find_streams(target_type)
            .first()
            .copied()
            .ok_or_else(|| AVError::NoStream(target_type).into())
    }

    /// Codec parameters of stream `index`, borrowed from this context.
    pub fn codec_parameters(&mut self, index: usize) -> Result<AVCodecParameters<'_, N>> {
        let count = self.nb_streams();
        if index >= count {
            return Err(AVError::StreamIndex { index, count }.into());
        }

        let parameters = unsafe { N::format_stream_parameters(self.inner, index as u32) };
        Ok(unsafe { AVCodecParameters::from_raw(parameters) })
    }
}

#[test]
fn test_find_streams_by_type() {
    use crate::av_dictionary::Options;
    use crate::native::fake::{self, Fake, H264_ID, PCM_ID};
    fake::reset();
    fake::add_source(
        "movie.mkv",
        vec![
            fake::video_stream(H264_ID),
            fake::audio_stream(PCM_ID, 2, 0x3),
            fake::audio_stream(PCM_ID, 1, 0),
        ],
        0,
    );

    let mut context = AVFormatContext::<Fake>::open("movie.mkv", "", &Options::new()).unwrap();
    assert_eq!(context.find_streams(AVMediaType::AUDIO), vec![1, 2]);
    assert_eq!(context.find_best_stream(AVMediaType::VIDEO).unwrap(), 0);

    let error = context.find_best_stream(AVMediaType::SUBTITLE).unwrap_err();
    assert_eq!(error.to_string(), "No SUBTITLE stream found.");

    let parameters = context.codec_parameters(1).unwrap();
    assert_eq!(parameters.codec_id(), PCM_ID);
    assert_eq!(parameters.media_type(), AVMediaType::AUDIO);
    assert_eq!(parameters.channel_layout(), 0x3);
}

#[test]
fn test_codec_parameters_out_of_range() {
    use crate::av_dictionary::Options;
    use crate::native::fake::{self, Fake, PCM_ID};
    fake::reset();
    fake::add_source("a.wav", vec![fake::audio_stream(PCM_ID, 1, 0)], 0);

    let mut context = AVFormatContext::<Fake>::open("a.wav", "", &Options::new()).unwrap();
    let error = context.codec_parameters(3).unwrap_err();
    assert_eq!(error.to_string(), "Stream index 3 is out of range (1 streams).");
}
