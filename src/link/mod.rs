pub mod exchange;
pub mod network_interface;
pub mod raw_socket;

use std::io;
use std::time::Duration;

/// A facility that moves whole Ethernet frames on one interface.
pub trait FrameLink {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Waits at most `timeout` for the next inbound frame and copies it into `buf`.
    ///
    /// Returns `Ok(None)` when the timeout passes with nothing received.
    fn recv_frame(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

impl<L: FrameLink + ?Sized> FrameLink for &mut L {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send_frame(frame)
    }

    fn recv_frame(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        (**self).recv_frame(buf, timeout)
    }
}
