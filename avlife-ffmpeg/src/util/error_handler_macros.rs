/// Calls a status-returning native function and bails on any non-zero code.
macro_rules! ffmpeg {
    { $native:ident :: $name:ident ( $( $arg:expr ),* $(,)? ) } => {
        ffmpeg! {
            $native::$name($( $arg ),*) or format!("Error when calling native function `{}`", stringify!($name))
        }
    };
    { $native:ident :: $name:ident ( $( $arg:expr ),* $(,)? ) or $error_message:expr } => {
        {
            let tmp: std::ffi::c_int = unsafe {
                $native::$name($( $arg ),*)
            };
            if tmp != 0 {
                return Err($crate::util::error_handler::native_error::<$native>($error_message, tmp));
            }
        }
    };
}

/// Calls a native function whose negative return is an error and yields the
/// non-negative value otherwise.
macro_rules! native {
    { $native:ident :: $name:ident ( $( $arg:expr ),* $(,)? ) } => {
        native! {
            $native::$name($( $arg ),*) or format!("Error when calling native function `{}`", stringify!($name))
        }
    };
    { $native:ident :: $name:ident ( $( $arg:expr ),* $(,)? ) or $error_message:expr } => {
        {
            let tmp: std::ffi::c_int = unsafe {
                $native::$name($( $arg ),*)
            };
            if tmp < 0 {
                return Err($crate::util::error_handler::native_error::<$native>($error_message, tmp));
            };
            tmp
        }
    };
}
