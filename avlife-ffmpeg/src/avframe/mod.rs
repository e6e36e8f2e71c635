use avlife_proc_macro::wrap_ffmpeg;

pub mod open_frame;

wrap_ffmpeg!(
    AVFrame<Frame> drop+ [av_frame_free]
);
