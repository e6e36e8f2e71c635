use anyhow::Result;
use avlife_ffmpeg::ffmpeg::{CodecContext, FormatContext, Frame, Packet};
use avlife_ffmpeg::AVMediaType;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use avlife_probe::args::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let target: AVMediaType = args.media.into();

    let mut format = FormatContext::open(&args.input, &args.device, &args.format_options())?;
    for index in 0..format.nb_streams() {
        let parameters = format.codec_parameters(index)?;
        println!(
            "stream {}: {:?} codec={}",
            index,
            parameters.media_type(),
            parameters.codec_name()
        );
    }

    let stream_index = format.find_best_stream(target)?;
    let mut decoder = {
        let mut parameters = format.codec_parameters(stream_index)?;
        let decoder = CodecContext::open(&mut parameters, &args.decoder, &args.decoder_options())?;
        if target == AVMediaType::AUDIO {
            println!(
                "stream {}: {} channels, layout {:#x}",
                stream_index,
                decoder.channels(),
                parameters.channel_layout()
            );
        }
        decoder
    };

    let mut packet = Packet::new()?;
    let mut frame = Frame::new()?;
    let (mut packets, mut frames) = (0usize, 0usize);

    while packets < args.max_packets {
        let mut packet = packet.auto_unref();
        if !format.read_frame(&mut *packet)? {
            break;
        }
        packets += 1;

        if packet.stream_index() != stream_index {
            continue;
        }

        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut frame)? {
            frames += 1;
        }
    }

    info!("Read {} packets, decoded {} frames", packets, frames);
    println!("packets={} frames={}", packets, frames);

    Ok(())
}
