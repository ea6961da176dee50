//! Mock UART implementation for testing

use crate::platform::{
    traits::{UartConfig, UartInterface},
    Result,
};
use core::cell::RefCell;
use std::vec::Vec;

/// Mock UART implementation
///
/// Provides in-memory buffers for transmit and receive data, allowing unit
/// tests to verify UART traffic without hardware. The buffers sit behind
/// `RefCell`, and `UartInterface` is also implemented for `&MockUart`, so a
/// test can hand a borrow to the code under test and keep injecting/reading
/// on the side.
///
/// # Example
///
/// ```
/// use spieluhr::platform::mock::MockUart;
/// use spieluhr::platform::traits::UartInterface;
///
/// let mut uart = MockUart::new(Default::default());
///
/// uart.write(b"Hello").unwrap();
/// assert_eq!(uart.tx_data(), b"Hello");
///
/// uart.inject_rx_data(b"World");
/// let mut buf = [0u8; 5];
/// uart.read(&mut buf).unwrap();
/// assert_eq!(&buf, b"World");
/// ```
#[derive(Debug)]
pub struct MockUart {
    config: UartConfig,
    tx_buffer: RefCell<Vec<u8>>,
    rx_buffer: RefCell<Vec<u8>>,
}

impl MockUart {
    /// Create a new mock UART
    pub fn new(config: UartConfig) -> Self {
        Self {
            config,
            tx_buffer: RefCell::new(Vec::new()),
            rx_buffer: RefCell::new(Vec::new()),
        }
    }

    /// Get transmitted data (for test verification)
    pub fn tx_data(&self) -> Vec<u8> {
        self.tx_buffer.borrow().clone()
    }

    /// Clear transmit buffer
    pub fn clear_tx(&self) {
        self.tx_buffer.borrow_mut().clear();
    }

    /// Inject receive data (for test setup)
    pub fn inject_rx_data(&self, data: &[u8]) {
        self.rx_buffer.borrow_mut().extend_from_slice(data);
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }

    fn push_tx(&self, data: &[u8]) -> usize {
        self.tx_buffer.borrow_mut().extend_from_slice(data);
        data.len()
    }

    fn pull_rx(&self, buffer: &mut [u8]) -> usize {
        let mut rx = self.rx_buffer.borrow_mut();
        let to_read = core::cmp::min(buffer.len(), rx.len());

        buffer[..to_read].copy_from_slice(&rx[..to_read]);
        rx.drain(..to_read);

        to_read
    }

    fn rx_pending(&self) -> bool {
        !self.rx_buffer.borrow().is_empty()
    }
}

impl Default for MockUart {
    fn default() -> Self {
        Self::new(UartConfig::default())
    }
}

impl UartInterface for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.push_tx(data))
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        Ok(self.pull_rx(buffer))
    }

    fn available(&self) -> bool {
        self.rx_pending()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl UartInterface for &MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.push_tx(data))
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        Ok(self.pull_rx(buffer))
    }

    fn available(&self) -> bool {
        self.rx_pending()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
