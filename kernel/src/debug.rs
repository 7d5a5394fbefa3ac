// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Support for in-kernel debugging.
//!
//! For printing, this module uses an output sink that the board installs
//! once during initialization. Until a sink is installed, debug output is
//! dropped.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! // Somewhere in board initialization
//! let buffer = static_init!(DebugBuffer<1024>, DebugBuffer::new());
//! unsafe { kernel::debug::set_debug_sink(buffer) };
//! ```
//!
//! ```rust,ignore
//! debug!("Yes the code gets here with value {}", 42);
//! debug_verbose!("got here"); // includes message count, file, and line
//! ```
//!
//! ```text
//! Yes the code gets here with value 42
//! TOCK_DEBUG(0): /tock/capsules/src/sensys.rs:24: got here
//! ```

use core::cell::{Cell, UnsafeCell};
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicUsize, Ordering};

/// A destination for debug output, e.g. a UART or a RAM buffer.
pub trait DebugSink {
    /// Write `buf` to the sink. Sinks never block; bytes they cannot accept
    /// are dropped.
    fn write(&self, buf: &[u8]);
}

struct DebugSinkSlot(UnsafeCell<Option<&'static dyn DebugSink>>);

// SAFETY: The slot is only written by `set_debug_sink`, whose contract
// requires that no other code runs concurrently. Afterwards it is only read.
unsafe impl Sync for DebugSinkSlot {}

static DEBUG_SINK: DebugSinkSlot = DebugSinkSlot(UnsafeCell::new(None));

/// Number of `debug_verbose!` messages printed so far.
static DEBUG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Install the sink that receives all debug output.
///
/// # Safety
///
/// Must be called during single-threaded board initialization, before any
/// code can print debug output.
pub unsafe fn set_debug_sink(sink: &'static dyn DebugSink) {
    *DEBUG_SINK.0.get() = Some(sink);
}

fn debug_sink() -> Option<&'static dyn DebugSink> {
    // SAFETY: See `DebugSinkSlot`; there is no concurrent writer.
    unsafe { *DEBUG_SINK.0.get() }
}

struct SinkWriter(&'static dyn DebugSink);

impl Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write(s.as_bytes());
        Ok(())
    }
}

/// Print one line of debug output. Used by the `debug!` macro.
pub fn debug_println(args: fmt::Arguments) {
    if let Some(sink) = debug_sink() {
        let mut writer = SinkWriter(sink);
        let _ = writer.write_fmt(args);
        let _ = writer.write_str("\r\n");
    }
}

/// Print one line of debug output prefixed with a message count and the
/// source location. Used by the `debug_verbose!` macro.
pub fn debug_verbose_println(args: fmt::Arguments, file_line: &(&'static str, u32)) {
    let count = DEBUG_COUNT.load(Ordering::Relaxed);
    DEBUG_COUNT.store(count.wrapping_add(1), Ordering::Relaxed);

    if let Some(sink) = debug_sink() {
        let (file, line) = *file_line;
        let mut writer = SinkWriter(sink);
        let _ = writer.write_fmt(format_args!("TOCK_DEBUG({}): {}:{}: ", count, file, line));
        let _ = writer.write_fmt(args);
        let _ = writer.write_str("\r\n");
    }
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        // Allow an empty debug!() to print the location when hit
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_println(format_args!($msg))
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_println(format_args!($fmt, $($arg)+))
    });
}

/// In-kernel `println()` debugging with message count, file, and line.
#[macro_export]
macro_rules! debug_verbose {
    () => ({
        // Allow an empty debug_verbose!() to print the location when hit
        $crate::debug_verbose!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_verbose_println(format_args!($msg), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_verbose_println(format_args!($fmt, $($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}

/// A debug sink that keeps the most recent `N` bytes of output in RAM.
///
/// Useful on boards without a console, where the buffer can be inspected with
/// a debugger, and for capturing output on a host.
pub struct DebugBuffer<const N: usize> {
    buffer: [Cell<u8>; N],
    /// Index of the next byte to write.
    head: Cell<usize>,
    /// Number of valid bytes, saturating at `N`.
    len: Cell<usize>,
}

impl<const N: usize> DebugBuffer<N> {
    pub const fn new() -> Self {
        const EMPTY: Cell<u8> = Cell::new(0);
        DebugBuffer {
            buffer: [EMPTY; N],
            head: Cell::new(0),
            len: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    /// Copy the buffered output, oldest byte first, into `out`. Returns the
    /// number of bytes copied.
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        let len = self.len.get();
        let start = (self.head.get() + N - len) % N.max(1);
        let count = len.min(out.len());
        for (i, byte) in out.iter_mut().take(count).enumerate() {
            *byte = self.buffer[(start + i) % N].get();
        }
        count
    }

    pub fn clear(&self) {
        self.head.set(0);
        self.len.set(0);
    }
}

impl<const N: usize> DebugSink for DebugBuffer<N> {
    fn write(&self, buf: &[u8]) {
        if N == 0 {
            return;
        }
        for &byte in buf {
            let head = self.head.get();
            self.buffer[head].set(byte);
            self.head.set((head + 1) % N);
            self.len.set((self.len.get() + 1).min(N));
        }
    }
}
