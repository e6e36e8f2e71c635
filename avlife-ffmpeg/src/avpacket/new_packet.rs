use crate::avpacket::{AVPacket, AutoPacketUnref};
use crate::native::Native;
use crate::util::error_handler::AVError;
use anyhow::Result;

impl<N: Native> AVPacket<N> {
    /// Allocates an empty packet that can be filled and reused.
    pub fn new() -> Result<Self> {
        let packet = unsafe { N::av_packet_alloc() };

        if packet.is_null() {
            return Err(AVError::Allocation("AVPacket object").into());
        }

        Ok(AVPacket { inner: packet })
    }

    /// Drops the buffer reference, leaving the packet empty but allocated.
    pub fn release(&mut self) {
        unsafe {
            N::av_packet_unref(self.inner);
        }
    }

    /// Borrows the packet until the returned guard goes out of scope, then
    /// releases its buffer.
    pub fn auto_unref(&mut self) -> AutoPacketUnref<'_, N> {
        AutoPacketUnref::new(self)
    }

    pub fn size(&self) -> usize {
        unsafe { N::packet_size(self.inner) }.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stream_index(&self) -> usize {
        unsafe { N::packet_stream_index(self.inner) }.max(0) as usize
    }
}

#[test]
fn test_packet_freed_once() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    {
        let packet = AVPacket::<Fake>::new().unwrap();
        assert!(packet.is_empty());
        assert_eq!(fake::live(Kind::Packet), 1);
    }

    assert_eq!(fake::allocations(Kind::Packet), 1);
    assert_eq!(fake::frees(Kind::Packet), 1);
}

#[test]
fn test_packet_allocation_failure() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();
    fake::fail_next_allocation(Kind::Packet);

    let error = AVPacket::<Fake>::new().unwrap_err();
    assert_eq!(error.to_string(), "Failed to allocate AVPacket object.");
    fake::assert_no_leaks();
}

#[test]
fn test_packet_freed_when_error_unwinds() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    fn fails_after_allocating() -> Result<()> {
        let _packet = AVPacket::<Fake>::new()?;
        anyhow::bail!("downstream failure");
    }

    assert!(fails_after_allocating().is_err());
    assert_eq!(fake::frees(Kind::Packet), 1);
    fake::assert_no_leaks();
}

#[test]
fn test_release_keeps_handle() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let mut packet = AVPacket::<Fake>::new().unwrap();
    fake::fill_packet(packet.inner, 32);
    assert_eq!(packet.size(), 32);

    packet.release();
    assert!(packet.is_empty());
    assert_eq!(fake::frees(Kind::Packet), 0);
}
