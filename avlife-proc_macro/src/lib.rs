use proc_macro::TokenStream;

mod keyword;
mod native_wrapper;

/// Declares an owned wrapper over one native handle type.
///
/// ```ignore
/// wrap_ffmpeg!(
///     AVPacket<Packet> drop+ [av_packet_free]
/// );
/// ```
///
/// expands to `pub struct AVPacket<N: Native> { pub(crate) inner: *mut N::Packet }`
/// with a `Drop` that hands `&mut inner` to `N::av_packet_free` once. Extra
/// fields go in braces between the handle type and `drop+`. Without `drop+` the
/// wrapper only borrows the handle.
#[proc_macro]
pub fn wrap_ffmpeg(token_stream: TokenStream) -> TokenStream {
    native_wrapper::wrap_ffmpeg(token_stream)
}
