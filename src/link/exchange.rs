use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::raw_socket::RawSocket;
use super::FrameLink;
use crate::api::error::ExchangeError;
use crate::api::packet::Frame;

/// Receive buffer size; larger frames are truncated by the link.
pub const MAX_FRAME_LEN: usize = 2048;

/// Sends one frame and waits for one reply.
///
/// There is no retransmission, no sequencing and no deduplication: the first
/// inbound frame with the expected ethertype is the reply, everything after it
/// is left unread.
pub struct ExchangeDriver<L> {
    link: L,
    ethertype: u16,
    buffer: Vec<u8>,
}

impl ExchangeDriver<RawSocket> {
    /// Binds a raw socket on `interface`. Fails if the interface does not exist
    /// or the process lacks the privilege to open packet sockets.
    pub fn open(interface: &str, ethertype: u16) -> io::Result<Self> {
        let socket = RawSocket::open(interface, ethertype)?;
        Ok(ExchangeDriver::new(socket, ethertype))
    }
}

impl<L: FrameLink> ExchangeDriver<L> {
    pub fn new(link: L, ethertype: u16) -> Self {
        ExchangeDriver {
            link,
            ethertype,
            buffer: vec![0; MAX_FRAME_LEN],
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_inner(self) -> L {
        self.link
    }

    pub fn send_and_await(&mut self, frame: &Frame, timeout: Duration) -> Result<Frame, ExchangeError> {
        let bytes = frame.to_bytes();
        self.link.send_frame(&bytes)?;
        debug!(len = bytes.len(), ethertype = frame.ethertype(), "frame sent");

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ExchangeError::NoReply { timeout });
            }

            let len = match self.link.recv_frame(&mut self.buffer, remaining)? {
                Some(len) => len,
                None => return Err(ExchangeError::NoReply { timeout }),
            };

            match Frame::parse(&self.buffer[..len]) {
                Ok(reply) if reply.ethertype() == self.ethertype => {
                    debug!(len, "reply received");
                    return Ok(reply);
                }
                Ok(other) => trace!(ethertype = other.ethertype(), "skipping frame"),
                Err(err) => trace!(%err, "skipping runt frame"),
            }
        }
    }
}
