//! UART byte-source adapter.
//!
//! Implements [`ByteSource`] over the console UART.  Incoming bytes are
//! drained from the driver into a fixed ring without blocking; the settings
//! engine then peeks and reads from the ring.
//!
//! - **`target_os = "espidf"`**: pulls from the ESP-IDF UART driver
//!   installed by hw_init (`uart_read_bytes` with a zero timeout).
//! - **`not(target_os = "espidf")`**: bytes are pushed in with
//!   [`UartSource::inject`] for host-side simulation.

use heapless::Deque;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::ByteSource;

/// Receive ring capacity.
pub const RX_CAPACITY: usize = 256;

pub struct UartSource {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    port: i32,
    rx: Deque<u8, RX_CAPACITY>,
}

impl UartSource {
    pub fn new(port: i32) -> Self {
        Self {
            port,
            rx: Deque::new(),
        }
    }

    /// Move whatever the driver has buffered into the ring.
    #[cfg(target_os = "espidf")]
    fn fill(&mut self) {
        use esp_idf_svc::sys::{ESP_OK, uart_get_buffered_data_len, uart_read_bytes};

        let room = self.rx.capacity() - self.rx.len();
        if room == 0 {
            return;
        }
        let mut pending: usize = 0;
        // SAFETY: the UART driver was installed in hw_init before the loop.
        let ret = unsafe { uart_get_buffered_data_len(self.port, &mut pending) };
        if ret != ESP_OK as i32 || pending == 0 {
            return;
        }

        let mut buf = [0u8; RX_CAPACITY];
        let want = pending.min(room);
        // SAFETY: `buf` outlives the call and holds at least `want` bytes.
        let got = unsafe {
            uart_read_bytes(self.port, buf.as_mut_ptr().cast(), want as u32, 0)
        };
        if got < 0 {
            warn!("UART{} read failed ({})", self.port, got);
            return;
        }
        for &b in &buf[..got as usize] {
            // Cannot overflow: at most `room` bytes were read.
            let _ = self.rx.push_back(b);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn fill(&mut self) {}

    /// Queue bytes as if they had arrived on the wire.  Returns how many
    /// fit in the ring.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.rx.push_back(b).is_ok())
            .count()
    }
}

impl ByteSource for UartSource {
    fn available(&mut self) -> usize {
        self.fill();
        self.rx.len()
    }

    fn peek(&mut self) -> Option<u8> {
        if self.rx.is_empty() {
            self.fill();
        }
        self.rx.front().copied()
    }

    fn read(&mut self) -> Option<u8> {
        if self.rx.is_empty() {
            self.fill();
        }
        self.rx.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_bytes_are_read_in_order() {
        let mut uart = UartSource::new(0);
        assert_eq!(uart.available(), 0);
        assert_eq!(uart.peek(), None);

        assert_eq!(uart.inject(b"S1;"), 3);
        assert_eq!(uart.available(), 3);
        assert_eq!(uart.peek(), Some(b'S'));
        assert_eq!(uart.read(), Some(b'S'));
        assert_eq!(uart.read(), Some(b'1'));
        assert_eq!(uart.read(), Some(b';'));
        assert_eq!(uart.read(), None);
    }

    #[test]
    fn inject_stops_when_ring_is_full() {
        let mut uart = UartSource::new(0);
        let flood = [b' '; RX_CAPACITY + 10];
        assert_eq!(uart.inject(&flood), RX_CAPACITY);
        assert_eq!(uart.available(), RX_CAPACITY);
    }
}
