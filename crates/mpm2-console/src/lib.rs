//! Thread-safe console plumbing shared between the guest-CPU thread and
//! host transport threads.
//!
//! Each virtual console is a pair of bounded byte queues: `input` carries
//! bytes from a host transport (terminal session, pty, socket) toward the
//! guest's console-input calls, `output` carries bytes the guest wrote out
//! toward the transport. The guest side only ever uses the non-blocking
//! operations, so trap dispatch can never stall the emulated machine; the
//! host side may block with a per-call timeout.
#![forbid(unsafe_code)]

mod queue;
mod registry;

pub use queue::ConsoleQueue;
pub use registry::{Console, ConsoleRegistry, DEFAULT_CONSOLE_COUNT, DEFAULT_QUEUE_CAPACITY};
