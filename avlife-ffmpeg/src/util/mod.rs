#[macro_use]
mod error_handler_macros;
pub mod error_handler;
