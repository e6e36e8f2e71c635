use avlife_proc_macro::wrap_ffmpeg;

pub mod alloc;

wrap_ffmpeg!(
    AVFilterGraph<FilterGraph> drop+ [avfilter_graph_free]
);
