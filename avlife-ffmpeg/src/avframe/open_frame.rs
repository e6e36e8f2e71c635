use crate::avframe::AVFrame;
use crate::native::Native;
use crate::util::error_handler::AVError;
use anyhow::Result;

impl<N: Native> AVFrame<N> {
    pub fn new() -> Result<Self> {
        let frame = unsafe { N::av_frame_alloc() };

        if frame.is_null() {
            Err(AVError::Allocation("AVFrame object").into())
        } else {
            Ok(AVFrame { inner: frame })
        }
    }
}

#[test]
fn test_frame_freed_once() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let frames = (0..3)
        .map(|_| AVFrame::<Fake>::new())
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(fake::live(Kind::Frame), 3);

    drop(frames);
    assert_eq!(fake::allocations(Kind::Frame), 3);
    assert_eq!(fake::frees(Kind::Frame), 3);
}

#[test]
fn test_frame_allocation_failure() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();
    fake::fail_next_allocation(Kind::Frame);

    let error = AVFrame::<Fake>::new().unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AVError>(),
        Some(AVError::Allocation("AVFrame object"))
    ));
    assert_eq!(error.to_string(), "Failed to allocate AVFrame object.");
    fake::assert_no_leaks();
}
