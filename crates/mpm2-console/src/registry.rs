use std::sync::Arc;

use crate::queue::ConsoleQueue;

/// Number of virtual consoles MP/M II's poll-device map addresses
/// (output devices 1-4, input devices 5-8).
pub const DEFAULT_CONSOLE_COUNT: u8 = 4;

/// Per-direction queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// One virtual console: an input queue (transport -> guest) and an output
/// queue (guest -> transport).
///
/// The guest-facing methods are non-blocking; a full output queue drops the
/// byte rather than stalling trap dispatch. Transports reach the blocking
/// queue API through [`Console::input`] / [`Console::output`].
#[derive(Debug)]
pub struct Console {
    input: ConsoleQueue,
    output: ConsoleQueue,
}

impl Console {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            input: ConsoleQueue::new(queue_capacity),
            output: ConsoleQueue::new(queue_capacity),
        }
    }

    /// Console-status byte: 0xFF when input is pending, 0x00 otherwise.
    pub fn status(&self) -> u8 {
        if self.input.is_empty() {
            0x00
        } else {
            0xFF
        }
    }

    /// Non-blocking read of the next input byte.
    pub fn read_char(&self) -> Option<u8> {
        self.input.try_read()
    }

    /// Non-blocking write of an output byte; false if the queue was full.
    pub fn write_char(&self, ch: u8) -> bool {
        self.output.try_write(ch)
    }

    /// Transport -> guest queue.
    pub fn input(&self) -> &ConsoleQueue {
        &self.input
    }

    /// Guest -> transport queue.
    pub fn output(&self) -> &ConsoleQueue {
        &self.output
    }

    pub fn clear(&self) {
        self.input.clear();
        self.output.clear();
    }
}

/// The configured set of virtual consoles, one per console index.
///
/// Constructed once per emulation session and handed to the dispatcher;
/// transports clone `Arc` handles out of it. There is deliberately no global
/// instance.
#[derive(Debug)]
pub struct ConsoleRegistry {
    consoles: Vec<Arc<Console>>,
}

impl ConsoleRegistry {
    pub fn new(count: u8, queue_capacity: usize) -> Self {
        let consoles = (0..count)
            .map(|_| Arc::new(Console::new(queue_capacity)))
            .collect();
        Self { consoles }
    }

    /// Re-establish the configured console set.
    ///
    /// Queues are cleared in place rather than reallocated so transport
    /// handles obtained before system-init stay valid across it.
    pub fn init(&self) {
        for console in &self.consoles {
            console.clear();
        }
    }

    pub fn get(&self, index: u8) -> Option<&Arc<Console>> {
        self.consoles.get(usize::from(index))
    }

    pub fn max_consoles(&self) -> u8 {
        self.consoles.len() as u8
    }
}

impl Default for ConsoleRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CONSOLE_COUNT, DEFAULT_QUEUE_CAPACITY)
    }
}
