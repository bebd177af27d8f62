//! Transport layer for I/O abstraction
//!
//! A [`Transport`] is one end of a byte stream to a controller. The reader
//! thread owns one handle and the command sender owns a second handle obtained
//! through [`Transport::try_clone`], so reading never waits on the write lock.

use crate::error::Result;

mod mock;
mod probe;
mod resolver;
mod serial;

pub use mock::MockTransport;
pub use probe::{PROBE_LISTEN, ProbeReport, probe_ports, probe_with};
pub use resolver::{resolve_port, resolve_with};
pub use serial::SerialTransport;

/// Transport trait for controller communication
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read (0 on timeout)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> Result<usize>;

    /// Second handle to the same underlying channel
    fn try_clone(&self) -> Result<Box<dyn Transport>>;

    /// Port path or other human-readable identifier
    fn name(&self) -> &str;
}
