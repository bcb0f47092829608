use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Bounded thread-safe byte FIFO.
///
/// Capacity is fixed at construction and the queue never grows past it:
/// `available() + free_space() == capacity()` holds after every operation.
/// Blocking calls take a timeout in milliseconds, with 0 meaning "wait
/// indefinitely"; every mutation wakes waiters on the opposite condition.
#[derive(Debug)]
pub struct ConsoleQueue {
    buf: Mutex<VecDeque<u8>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl ConsoleQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity != 0, "console queue capacity must be non-zero");
        Self {
            buf: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        self.buf.lock().expect("console queue lock poisoned")
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes ready to read.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Number of bytes that can be written before the queue is full.
    pub fn free_space(&self) -> usize {
        self.capacity - self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().len() >= self.capacity
    }

    /// Non-blocking read; `None` if the queue is empty.
    pub fn try_read(&self) -> Option<u8> {
        let mut buf = self.lock();
        let byte = buf.pop_front()?;
        self.not_full.notify_one();
        Some(byte)
    }

    /// Non-blocking write; false if the queue is full (the byte is dropped).
    pub fn try_write(&self, byte: u8) -> bool {
        let mut buf = self.lock();
        if buf.len() >= self.capacity {
            return false;
        }
        buf.push_back(byte);
        self.not_empty.notify_one();
        true
    }

    /// Blocking read. Waits up to `timeout_ms` milliseconds for a byte
    /// (0 = wait indefinitely); `None` on timeout.
    pub fn read(&self, timeout_ms: u64) -> Option<u8> {
        let mut buf = self.lock();
        if timeout_ms == 0 {
            while buf.is_empty() {
                buf = self.not_empty.wait(buf).expect("console queue lock poisoned");
            }
        } else {
            let timeout = Duration::from_millis(timeout_ms);
            let (guard, result) = self
                .not_empty
                .wait_timeout_while(buf, timeout, |buf| buf.is_empty())
                .expect("console queue lock poisoned");
            buf = guard;
            if result.timed_out() && buf.is_empty() {
                return None;
            }
        }
        let byte = buf.pop_front()?;
        self.not_full.notify_one();
        Some(byte)
    }

    /// Blocking write. Waits up to `timeout_ms` milliseconds for free space
    /// (0 = wait indefinitely); false on timeout.
    pub fn write(&self, byte: u8, timeout_ms: u64) -> bool {
        let mut buf = self.lock();
        if timeout_ms == 0 {
            while buf.len() >= self.capacity {
                buf = self.not_full.wait(buf).expect("console queue lock poisoned");
            }
        } else {
            let timeout = Duration::from_millis(timeout_ms);
            let (guard, result) = self
                .not_full
                .wait_timeout_while(buf, timeout, |buf| buf.len() >= self.capacity)
                .expect("console queue lock poisoned");
            buf = guard;
            if result.timed_out() && buf.len() >= self.capacity {
                return false;
            }
        }
        buf.push_back(byte);
        self.not_empty.notify_one();
        true
    }

    /// Read as many bytes as are immediately available into `out`,
    /// returning the count transferred.
    pub fn read_some(&self, out: &mut [u8]) -> usize {
        let mut buf = self.lock();
        let mut count = 0;
        while count < out.len() {
            let Some(byte) = buf.pop_front() else {
                break;
            };
            out[count] = byte;
            count += 1;
        }
        if count > 0 {
            self.not_full.notify_one();
        }
        count
    }

    /// Write as many bytes of `data` as currently fit, returning the count
    /// transferred.
    pub fn write_some(&self, data: &[u8]) -> usize {
        let mut buf = self.lock();
        let mut count = 0;
        while count < data.len() && buf.len() < self.capacity {
            buf.push_back(data[count]);
            count += 1;
        }
        if count > 0 {
            self.not_empty.notify_one();
        }
        count
    }

    /// Drop all queued bytes and wake every blocked writer.
    pub fn clear(&self) {
        let mut buf = self.lock();
        buf.clear();
        self.not_full.notify_all();
    }
}
