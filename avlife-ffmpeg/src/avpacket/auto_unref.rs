use crate::avpacket::AVPacket;
use crate::native::Native;
use std::ops::{Deref, DerefMut};

/// Scoped buffer release for a borrowed packet.
///
/// Does not own the packet: dropping the guard only unreferences the buffer,
/// on every way out of the scope, so the packet is ready for the next read.
pub struct AutoPacketUnref<'a, N: Native> {
    packet: &'a mut AVPacket<N>,
}

impl<'a, N: Native> AutoPacketUnref<'a, N> {
    pub fn new(packet: &'a mut AVPacket<N>) -> Self {
        AutoPacketUnref { packet }
    }
}

impl<N: Native> Deref for AutoPacketUnref<'_, N> {
    type Target = AVPacket<N>;

    fn deref(&self) -> &Self::Target {
        self.packet
    }
}

impl<N: Native> DerefMut for AutoPacketUnref<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.packet
    }
}

impl<N: Native> Drop for AutoPacketUnref<'_, N> {
    fn drop(&mut self) {
        self.packet.release();
    }
}

#[test]
fn test_guard_clears_buffer_on_scope_exit() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let mut packet = AVPacket::<Fake>::new().unwrap();
    {
        let guard = packet.auto_unref();
        fake::fill_packet(guard.inner, 128);
        assert_eq!(guard.size(), 128);
    }

    assert!(packet.is_empty());
    assert_eq!(fake::live(Kind::Packet), 1);

    // Still usable after the guard is gone.
    fake::fill_packet(packet.inner, 16);
    assert_eq!(packet.size(), 16);
    drop(packet);
    fake::assert_no_leaks();
}

#[test]
fn test_guard_clears_buffer_on_error() {
    use crate::native::fake::{self, Fake};
    fake::reset();

    fn consume(packet: &mut AVPacket<Fake>) -> anyhow::Result<()> {
        let guard = AutoPacketUnref::new(packet);
        fake::fill_packet(guard.inner, 64);
        anyhow::bail!("decoder rejected packet of {} bytes", guard.size());
    }

    let mut packet = AVPacket::<Fake>::new().unwrap();
    assert!(consume(&mut packet).is_err());
    assert!(packet.is_empty());
}

#[test]
fn test_guard_clears_buffer_on_panic() {
    use crate::native::fake::{self, Fake};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    fake::reset();

    let mut packet = AVPacket::<Fake>::new().unwrap();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let guard = packet.auto_unref();
        fake::fill_packet(guard.inner, 8);
        panic!("decoder crashed");
    }));

    assert!(result.is_err());
    assert!(packet.is_empty());
}
