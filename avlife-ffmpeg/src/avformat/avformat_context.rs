use crate::av_dictionary::{ensure_consumed, AVDictionary, Options};
use crate::avformat::AVFormatContext;
use crate::avpacket::AVPacket;
use crate::native::Native;
use crate::util::error_handler::{av_err2str, native_error, AVError};
use anyhow::Result;
use log::{debug, warn};
use std::ffi::CString;
use std::ptr::{null, null_mut};

impl<N: Native> AVFormatContext<N> {
    /// Opens `source` and probes its streams.
    ///
    /// `device` names an input format to force (e.g. a capture device). An
    /// empty or unknown name lets the library detect the format. Every key of
    /// `options` must be consumed by the library.
    pub fn open(source: &str, device: &str, options: &Options) -> Result<Self> {
        let format = Self::find_input_format(device)?;
        let path = CString::new(source)
            .map_err(|_| AVError::InvalidArgument(format!("source {:?} contains a NUL byte", source)))?;
        let mut dictionary = AVDictionary::<N>::build(options)?;

        let mut inner = null_mut();
        let ret = unsafe {
            N::avformat_open_input(&mut inner, path.as_ptr(), format, dictionary.as_mut_ptr())
        };

        // The library frees its context when opening fails, so from here on
        // whatever it handed back is ours to close.
        let context = AVFormatContext { inner };
        let unused = dictionary.drain();

        if ret < 0 {
            return Err(AVError::Open {
                source_name: source.to_string(),
                reason: av_err2str::<N>(ret),
            }
            .into());
        }
        ensure_consumed(&unused, "options")?;

        if unsafe { N::avformat_find_stream_info(context.inner) } < 0 {
            return Err(AVError::Probe.into());
        }

        debug!(
            "Opened input \"{}\" with {} streams at {:p}",
            source,
            context.nb_streams(),
            context.inner
        );
        Ok(context)
    }

    fn find_input_format(device: &str) -> Result<*const N::InputFormat> {
        if device.is_empty() {
            return Ok(null());
        }

        let name = CString::new(device)
            .map_err(|_| AVError::InvalidArgument(format!("device {:?} contains a NUL byte", device)))?;
        let format = unsafe { N::av_find_input_format(name.as_ptr()) };

        if format.is_null() {
            warn!("Input format \"{}\" not found, falling back to detection", device);
        }

        Ok(format)
    }

    /// Reads the next packet into `packet`. Returns `false` at end of stream.
    ///
    /// The packet must be empty; wrap it in [`AVPacket::auto_unref`] around
    /// each use.
    pub fn read_frame(&mut self, packet: &mut AVPacket<N>) -> Result<bool> {
        let ret = unsafe { N::av_read_frame(self.inner, packet.inner) };

        if ret == N::EOF {
            return Ok(false);
        }
        if ret < 0 {
            return Err(native_error::<N>("Failed to read frame", ret));
        }

        Ok(true)
    }
}


#[test]
fn test_open_and_close() {
    use crate::native::fake::{self, Fake, Kind};
    fixture::setup();

    {
        let context = AVFormatContext::<Fake>::open(fixture::SOURCE, "", &Options::new()).unwrap();
        assert_eq!(context.nb_streams(), 1);
        assert_eq!(fake::live(Kind::FormatContext), 1);
    }

    assert_eq!(fake::allocations(Kind::FormatContext), 1);
    assert_eq!(fake::frees(Kind::FormatContext), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_missing_source_names_path() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    let error = AVFormatContext::<Fake>::open("nonexistent/file", "", &Options::new()).unwrap_err();
    let message = error.to_string();
    assert!(message.contains("nonexistent/file"), "{}", message);
    assert_eq!(
        message,
        "Failed to open the input \"nonexistent/file\" (No such file or directory)."
    );
    fake::assert_no_leaks();
}

#[test]
fn test_recognised_options_are_accepted() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    let options = fixture::options(&[("probesize", "32"), ("analyzeduration", "0")]);
    let context = AVFormatContext::<Fake>::open(fixture::SOURCE, "", &options).unwrap();
    drop(context);
    fake::assert_no_leaks();
}

#[test]
fn test_unused_options_fail_after_successful_open() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    let options = fixture::options(&[("probesize", "32"), ("probsize", "32"), ("fast", "1")]);
    let error = AVFormatContext::<Fake>::open(fixture::SOURCE, "", &options).unwrap_err();
    let message = error.to_string();

    assert!(message.starts_with("Unexpected options: "), "{}", message);
    assert_eq!(message.matches("\"probsize\"").count(), 1);
    assert_eq!(message.matches("\"fast\"").count(), 1);
    assert!(!message.contains("\"probesize\""));
    assert!(matches!(
        error.downcast_ref::<AVError>(),
        Some(AVError::UnusedOptions { .. })
    ));
    fake::assert_no_leaks();
}

#[test]
fn test_open_failure_wins_over_unused_options() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    let options = fixture::options(&[("typo", "1")]);
    let error = AVFormatContext::<Fake>::open("missing.wav", "", &options).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AVError>(),
        Some(AVError::Open { .. })
    ));
    fake::assert_no_leaks();
}

#[test]
fn test_probe_failure_closes_input() {
    use crate::native::fake::{self, Fake, Kind};
    fixture::setup();
    fake::fail_probe();

    let error = AVFormatContext::<Fake>::open(fixture::SOURCE, "", &Options::new()).unwrap_err();
    assert_eq!(error.to_string(), "Failed to find stream information.");
    assert_eq!(fake::frees(Kind::FormatContext), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_device_hint() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    AVFormatContext::<Fake>::open(fixture::SOURCE, "lavfi", &Options::new()).unwrap();
    assert_eq!(fake::last_input_format().as_deref(), Some("lavfi"));

    // Unknown devices do not constrain detection.
    AVFormatContext::<Fake>::open(fixture::SOURCE, "no-such-device", &Options::new()).unwrap();
    assert_eq!(fake::last_input_format(), None);

    fake::assert_no_leaks();
}

#[test]
fn test_read_frame_until_end() {
    use crate::native::fake::{self, Fake};
    fixture::setup();

    let mut context = AVFormatContext::<Fake>::open(fixture::SOURCE, "", &Options::new()).unwrap();
    let mut packet = AVPacket::<Fake>::new().unwrap();

    let mut count = 0;
    loop {
        let mut guard = packet.auto_unref();
        if !context.read_frame(&mut guard).unwrap() {
            break;
        }
        assert!(!guard.is_empty());
        count += 1;
    }

    assert_eq!(count, 4);
    assert!(packet.is_empty());
    drop(packet);
    drop(context);
    fake::assert_no_leaks();
}
