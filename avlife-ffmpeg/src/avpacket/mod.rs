use avlife_proc_macro::wrap_ffmpeg;

pub mod auto_unref;
pub mod new_packet;

pub use auto_unref::AutoPacketUnref;

wrap_ffmpeg!(
    AVPacket<Packet> drop+ [av_packet_free]
);
