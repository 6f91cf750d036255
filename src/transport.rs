//! Byte channels and receive-side buffering shared by both engines.
//!
//! ```text
//!  UART ISR ──push_byte──▶ ResultCell ──take (critical section)──▶ RapiEngine
//!  UART rx ring ──read──▶ LineBuffer ──read_line──▶ WifiEngine
//! ```
//!
//! Each engine is generic over [`Transport`], so tests drive them with an
//! in-memory mock and the firmware with the ESP-IDF UART driver.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{Deque, Vec};
use log::warn;

// ───────────────────────────────────────────────────────────────
// Transport
// ───────────────────────────────────────────────────────────────

/// Non-blocking byte-oriented duplex channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Queue `data` for transmission. Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// True when the previous transmission has fully left the transmitter.
    fn is_send_done(&self) -> bool;

    /// Bytes still waiting to be transmitted.
    fn remaining_send_bytes(&self) -> usize;
}

/// A transport that discards all writes and never reads.
/// Used when a module is not fitted.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn is_send_done(&self) -> bool {
        true
    }

    fn remaining_send_bytes(&self) -> usize {
        0
    }
}

// ───────────────────────────────────────────────────────────────
// In-flight result cell (ISR producer / poll consumer)
// ───────────────────────────────────────────────────────────────

/// A completed response handed from the receive path to the poll routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed<const N: usize> {
    /// Response bytes without the terminating CR.
    pub data: Vec<u8, N>,
    /// The response overflowed the buffer and is unusable.
    pub overflow: bool,
}

struct ResultBuffer<const N: usize, const M: usize> {
    data: Vec<u8, N>,
    waiting: bool,
    done: bool,
    overflow: bool,
    /// Bytes received while nothing was outstanding.
    unsolicited: Deque<u8, M>,
}

/// In-flight result buffer for a CR-terminated request/response link.
///
/// The receive interrupt calls [`push_byte`](Self::push_byte); the poll
/// routine arms it before sending and collects the answer with
/// [`take`](Self::take). Every access runs inside a critical section, so
/// the consumer never observes a half-written response. `const fn new`
/// lets the cell live in a `static` the ISR can reach.
pub struct ResultCell<const N: usize, const M: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<ResultBuffer<N, M>>>,
}

impl<const N: usize, const M: usize> ResultCell<N, M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ResultBuffer {
                data: Vec::new(),
                waiting: false,
                done: false,
                overflow: false,
                unsolicited: Deque::new(),
            })),
        }
    }

    /// Receive path. While a response is awaited, bytes accumulate until
    /// CR; otherwise they go to the unsolicited ring (oldest dropped).
    pub fn push_byte(&self, byte: u8) {
        self.inner.lock(|cell| {
            let mut buf = cell.borrow_mut();
            if buf.waiting && !buf.done {
                if byte == b'\r' {
                    buf.done = true;
                } else if buf.data.push(byte).is_err() {
                    buf.overflow = true;
                }
            } else {
                if buf.unsolicited.is_full() {
                    buf.unsolicited.pop_front();
                }
                let _ = buf.unsolicited.push_back(byte);
            }
        });
    }

    /// Start waiting for a new response, discarding any previous one.
    pub fn arm(&self) {
        self.inner.lock(|cell| {
            let mut buf = cell.borrow_mut();
            buf.data.clear();
            buf.overflow = false;
            buf.done = false;
            buf.waiting = true;
        });
    }

    /// Stop waiting; late bytes become unsolicited.
    pub fn disarm(&self) {
        self.inner.lock(|cell| {
            let mut buf = cell.borrow_mut();
            buf.data.clear();
            buf.waiting = false;
            buf.done = false;
            buf.overflow = false;
        });
    }

    pub fn is_waiting(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().waiting)
    }

    /// Collect a finished response and clear the buffer in one step.
    pub fn take(&self) -> Option<Completed<N>> {
        self.inner.lock(|cell| {
            let mut buf = cell.borrow_mut();
            if !(buf.waiting && buf.done) {
                return None;
            }
            let data = core::mem::take(&mut buf.data);
            let overflow = buf.overflow;
            buf.waiting = false;
            buf.done = false;
            buf.overflow = false;
            Some(Completed { data, overflow })
        })
    }

    /// Copy out and remove unsolicited bytes. Returns the count copied.
    pub fn drain_unsolicited(&self, out: &mut [u8]) -> usize {
        self.inner.lock(|cell| {
            let mut buf = cell.borrow_mut();
            let mut n = 0;
            while n < out.len() {
                match buf.unsolicited.pop_front() {
                    Some(b) => {
                        out[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            n
        })
    }

    pub fn unsolicited_len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().unsolicited.len())
    }
}

impl<const N: usize, const M: usize> Default for ResultCell<N, M> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// CRLF line buffer
// ───────────────────────────────────────────────────────────────

/// Accumulates received bytes and hands them out line by line.
pub struct LineBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Pull whatever the transport has into the free space.
    pub fn fill<T: Transport>(&mut self, transport: &mut T) -> Result<usize, T::Error> {
        if self.len == N {
            return Ok(0);
        }
        let n = transport.read(&mut self.buf[self.len..])?;
        self.len += n.min(N - self.len);
        Ok(n)
    }

    /// Append bytes directly (receive path without a transport).
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(N - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Copy the next line into `out`.
    ///
    /// Normal mode returns a complete line including its CRLF and removes
    /// it from the buffer; it returns 0 when no CRLF has arrived yet. A
    /// buffer that filled up without any CRLF is discarded. Pending mode
    /// copies whatever is buffered without consuming it, for requests that
    /// must be answered before their terminator arrives.
    pub fn read_line(&mut self, out: &mut [u8], pending: bool) -> usize {
        if pending {
            let n = self.len.min(out.len());
            out[..n].copy_from_slice(&self.buf[..n]);
            return n;
        }

        match self.buf[..self.len].windows(2).position(|w| w == b"\r\n") {
            Some(pos) => {
                let line_len = pos + 2;
                let n = line_len.min(out.len());
                out[..n].copy_from_slice(&self.buf[..n]);
                self.buf.copy_within(line_len..self.len, 0);
                self.len -= line_len;
                n
            }
            None => {
                if self.len == N {
                    warn!("wifi rx: {} bytes without line end, discarded", N);
                    self.len = 0;
                }
                0
            }
        }
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
