use anyhow::{anyhow, Result};
use avlife_ffmpeg::{AVMediaType, Options};
use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "avlife-probe",
    version,
    about = "Open a media source, list its streams and decode one of them"
)]
pub struct Args {
    /// File path, URL or device input
    pub input: String,

    /// Input format to force, e.g. a capture device such as `alsa`
    #[arg(long, default_value = "")]
    pub device: String,

    /// Demuxer option as key=value, may be repeated
    #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Decoder to use instead of the one matching the stream's codec
    #[arg(long, default_value = "")]
    pub decoder: String,

    /// Decoder option as key=value, may be repeated
    #[arg(short = 'd', long = "decoder-option", value_parser = parse_key_value)]
    pub decoder_options: Vec<(String, String)>,

    /// Kind of stream to decode
    #[arg(long, value_enum, default_value_t = Media::Audio)]
    pub media: Media,

    /// Stop after reading this many packets
    #[arg(long, default_value_t = 500)]
    pub max_packets: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Media {
    Audio,
    Video,
}

impl From<Media> for AVMediaType {
    fn from(value: Media) -> Self {
        match value {
            Media::Audio => AVMediaType::AUDIO,
            Media::Video => AVMediaType::VIDEO,
        }
    }
}

impl Args {
    pub fn format_options(&self) -> Options {
        self.options.iter().cloned().collect()
    }

    pub fn decoder_options(&self) -> Options {
        self.decoder_options.iter().cloned().collect()
    }
}

fn parse_key_value(value: &str) -> Result<(String, String)> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got \"{}\"", value))?;

    if key.is_empty() {
        return Err(anyhow!("option key must not be empty"));
    }

    Ok((key.to_string(), value.to_string()))
}

#[test]
fn test_parse_key_value() {
    assert_eq!(
        parse_key_value("probesize=32").unwrap(),
        ("probesize".to_string(), "32".to_string())
    );
    assert_eq!(
        parse_key_value("filter=a=b").unwrap(),
        ("filter".to_string(), "a=b".to_string())
    );
    assert!(parse_key_value("probesize").is_err());
    assert!(parse_key_value("=1").is_err());
}

#[test]
fn test_repeated_options() {
    let args = Args::parse_from([
        "avlife-probe",
        "song.flac",
        "-o",
        "probesize=32",
        "--option",
        "analyzeduration=0",
        "-d",
        "threads=2",
        "--media",
        "video",
    ]);

    assert_eq!(args.format_options().len(), 2);
    assert_eq!(args.decoder_options().get("threads").map(String::as_str), Some("2"));
    assert!(matches!(args.media, Media::Video));
    assert_eq!(args.device, "");
}
