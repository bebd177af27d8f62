//! Mock transport for testing
//!
//! Clones share one buffer pair, so a test keeps a handle to inject inbound
//! bytes and inspect outbound frames while the rig owns the others.

use super::Transport;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// In-memory transport for unit and integration tests
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    /// Number of upcoming `available`/`read` calls that fail
    read_faults: usize,
    /// Writes fail while set
    fail_writes: bool,
    /// Every operation fails once set
    disconnected: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new(name: &str) -> Self {
        MockTransport {
            name: name.to_string(),
            inner: Arc::new(Mutex::new(MockTransportInner::default())),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().read_buffer.extend(data);
    }

    /// Inject one text line, appending the newline
    pub fn inject_line(&self, line: &str) {
        let mut inner = self.inner.lock();
        inner.read_buffer.extend(line.as_bytes());
        inner.read_buffer.push_back(b'\n');
    }

    /// Bytes not yet consumed by a reader
    pub fn pending_read(&self) -> usize {
        self.inner.lock().read_buffer.len()
    }

    /// Get all written data
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().write_buffer.clone()
    }

    /// Written data split into newline-terminated frames
    pub fn written_frames(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written())
            .split_inclusive('\n')
            .map(str::to_string)
            .collect()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        self.inner.lock().write_buffer.clear();
    }

    /// Make the next `count` read-side calls fail
    pub fn fail_next_reads(&self, count: usize) {
        self.inner.lock().read_faults = count;
    }

    /// Make writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Simulate the device being unplugged
    pub fn disconnect(&self) {
        self.inner.lock().disconnected = true;
    }

    fn read_fault(inner: &mut MockTransportInner) -> Option<io::Error> {
        if inner.disconnected {
            return Some(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        if inner.read_faults > 0 {
            inner.read_faults -= 1;
            return Some(io::Error::other("injected read fault"));
        }
        None
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        if let Some(e) = Self::read_fault(&mut inner) {
            return Err(e.into());
        }
        let count = inner.read_buffer.len().min(buffer.len());
        for (slot, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.disconnected {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged").into());
        }
        if inner.fail_writes {
            return Err(io::Error::other("injected write fault").into());
        }
        inner.write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        let mut inner = self.inner.lock();
        if let Some(e) = Self::read_fault(&mut inner) {
            return Err(e.into());
        }
        Ok(inner.read_buffer.len())
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
