//! AF_PACKET raw socket bound to one interface and one ethertype.
//!
//! Linux only. Opening a packet socket needs `CAP_NET_RAW`.
use std::ffi::CString;
use std::io;
use std::mem;
use std::time::{Duration, Instant};

use tracing::trace;

use super::FrameLink;

const SIOCGIFHWADDR: libc::Ioctl = 0x8927;
/// `sll_pkttype` of frames this host transmitted, looped back to packet sockets.
const PACKET_OUTGOING: u8 = 4;

/// `struct ifreq` carrying a hardware address; padded to the kernel's size.
#[repr(C)]
struct HwAddrRequest {
    ifr_name: [libc::c_char; libc::IF_NAMESIZE],
    ifr_hwaddr: libc::sockaddr,
    _pad: [u8; 8],
}

#[derive(Debug)]
pub struct RawSocket {
    fd: libc::c_int,
    ifindex: libc::c_int,
    name: String,
    hardware_address: [u8; 6],
}

fn check(res: libc::c_int) -> io::Result<libc::c_int> {
    if res == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res)
    }
}

fn check_len(res: libc::ssize_t) -> io::Result<usize> {
    if res == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res as usize)
    }
}

impl RawSocket {
    /// Opens a packet socket on `name` that only receives `ethertype` frames.
    pub fn open(name: &str, ethertype: u16) -> io::Result<RawSocket> {
        if name.is_empty() || name.len() >= libc::IF_NAMESIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid interface name {:?}", name),
            ));
        }
        let cname = CString::new(name).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "interface name contains NUL")
        })?;

        let ifindex = unsafe { libc::if_nametoindex(cname.as_ptr()) };
        if ifindex == 0 {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such interface: {}", name),
            ));
        }

        let protocol = ethertype.to_be();
        let fd = check(unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                protocol as libc::c_int,
            )
        })?;

        let mut socket = RawSocket {
            fd,
            ifindex: ifindex as libc::c_int,
            name: name.to_string(),
            hardware_address: [0; 6],
        };
        socket.bind(protocol)?;
        socket.hardware_address = socket.query_hardware_address()?;
        Ok(socket)
    }

    /// MAC address of the bound interface, used as the source of outgoing frames.
    pub fn hardware_address(&self) -> [u8; 6] {
        self.hardware_address
    }

    fn bind(&mut self, protocol: u16) -> io::Result<()> {
        let sockaddr = libc::sockaddr_ll {
            sll_family: libc::AF_PACKET as u16,
            sll_protocol: protocol,
            sll_ifindex: self.ifindex,
            sll_hatype: 0,
            sll_pkttype: 0,
            sll_halen: 0,
            sll_addr: [0; 8],
        };

        check(unsafe {
            libc::bind(
                self.fd,
                &sockaddr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        })?;
        Ok(())
    }

    fn query_hardware_address(&self) -> io::Result<[u8; 6]> {
        let mut request: HwAddrRequest = unsafe { mem::zeroed() };
        for (slot, byte) in request.ifr_name.iter_mut().zip(self.name.as_bytes()) {
            *slot = *byte as libc::c_char;
        }

        check(unsafe { libc::ioctl(self.fd, SIOCGIFHWADDR, &mut request as *mut HwAddrRequest) })?;

        let mut mac = [0u8; 6];
        for (slot, byte) in mac.iter_mut().zip(request.ifr_hwaddr.sa_data.iter()) {
            *slot = *byte as u8;
        }
        Ok(mac)
    }

    /// Blocks until the socket is readable or `timeout` passes.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // round up so a sub-millisecond remainder does not spin
        let millis = timeout.as_micros().div_ceil(1000).min(libc::c_int::MAX as u128) as libc::c_int;

        match check(unsafe { libc::poll(&mut pollfd, 1, millis) }) {
            Ok(ready) => Ok(ready > 0),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl FrameLink for RawSocket {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let sent = check_len(unsafe {
            libc::send(self.fd, frame.as_ptr() as *const libc::c_void, frame.len(), 0)
        })?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }

    fn recv_frame(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.wait_readable(remaining)? {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                continue;
            }

            let mut from: libc::sockaddr_ll = unsafe { mem::zeroed() };
            let mut from_len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
            let len = check_len(unsafe {
                libc::recvfrom(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    &mut from as *mut libc::sockaddr_ll as *mut libc::sockaddr,
                    &mut from_len,
                )
            })?;

            if from.sll_pkttype == PACKET_OUTGOING {
                trace!(len, "skipping own outgoing frame");
                continue;
            }
            return Ok(Some(len));
        }
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
