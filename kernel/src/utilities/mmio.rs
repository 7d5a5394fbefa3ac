// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Memory-mapped I/O windows.
//!
//! A driver never holds raw pointers to its device. It holds an [`Mmio`]
//! handle: an opaque capability to issue 32-bit reads and writes at byte
//! offsets inside one mapped register window. The handle is handed out by the
//! platform bus when the device's memory resource is mapped.
//!
//! Individual registers are accessed through [`MmioRegister`], which
//! implements the `tock-registers` [`Readable`] and [`Writeable`] interfaces,
//! so the usual `read`, `write`, `modify`, and `is_set` operations work
//! against bitfields declared with `register_bitfields!`.
//!
//! ```rust,ignore
//! let ctrl: MmioRegister<_, CTRL::Register> = MmioRegister::new(window, 0x0C);
//! ctrl.modify(CTRL::EN::SET);
//! ```

use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::{read_volatile, write_volatile};

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::RegisterLongName;

use crate::config::CONFIG;

/// A mapped register window that supports 32-bit wide accesses.
///
/// Implementations must perform every access exactly once and in program
/// order; the compiler may not elide, merge, or reorder them.
pub trait Mmio: Copy {
    /// Size of the window in bytes.
    fn len(&self) -> usize;

    /// Read the 32-bit register at byte `offset`.
    fn read32(&self, offset: usize) -> u32;

    /// Write `value` to the 32-bit register at byte `offset`.
    fn write32(&self, offset: usize, value: u32);
}

/// A window onto real device memory, accessed with volatile loads and stores.
#[derive(Clone, Copy)]
pub struct MmioWindow {
    base: *mut u32,
    len: usize,
}

impl MmioWindow {
    /// Create a window of `len` bytes starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be 4-byte aligned and the range `base..base + len` must be
    /// device memory mapped for the whole lifetime of the window and of every
    /// copy of it. No other code may access the range while the window is in
    /// use.
    pub const unsafe fn new(base: usize, len: usize) -> MmioWindow {
        MmioWindow {
            base: base as *mut u32,
            len,
        }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }
}

impl Mmio for MmioWindow {
    fn len(&self) -> usize {
        self.len
    }

    fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.len);
        // SAFETY: `new` guarantees the window is mapped, and the offset was
        // checked to be aligned and inside the window.
        unsafe { read_volatile(self.base.add(offset / 4)) }
    }

    fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.len);
        // SAFETY: See `read32`.
        unsafe { write_volatile(self.base.add(offset / 4), value) }
    }
}

/// A window backed by ordinary memory, one `Cell` per 32-bit word.
///
/// Used to emulate a device on a host, or to stage register images.
#[derive(Clone, Copy)]
pub struct RamWindow<'a> {
    words: &'a [Cell<u32>],
}

impl<'a> RamWindow<'a> {
    pub fn new(words: &'a [Cell<u32>]) -> RamWindow<'a> {
        RamWindow { words }
    }

    /// The word at byte `offset`, without going through a register.
    pub fn peek(&self, offset: usize) -> u32 {
        self.words[offset / 4].get()
    }
}

impl Mmio for RamWindow<'_> {
    fn len(&self) -> usize {
        self.words.len() * 4
    }

    fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0);
        self.words[offset / 4].get()
    }

    fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0);
        self.words[offset / 4].set(value);
    }
}

/// A single 32-bit register inside an [`Mmio`] window.
///
/// `R` names the bitfield layout of the register, as declared with
/// `register_bitfields!`; plain value registers use `()`.
pub struct MmioRegister<W: Mmio, R: RegisterLongName = ()> {
    window: W,
    offset: usize,
    _register: PhantomData<R>,
}

impl<W: Mmio, R: RegisterLongName> MmioRegister<W, R> {
    pub fn new(window: W, offset: usize) -> MmioRegister<W, R> {
        debug_assert!(offset % 4 == 0 && offset + 4 <= window.len());
        MmioRegister {
            window,
            offset,
            _register: PhantomData,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<W: Mmio, R: RegisterLongName> Readable for MmioRegister<W, R> {
    type T = u32;
    type R = R;

    fn get(&self) -> u32 {
        let value = self.window.read32(self.offset);
        if CONFIG.trace_mmio {
            debug!("mmio: read {:08x} from +{:#04x}", value, self.offset);
        }
        value
    }
}

impl<W: Mmio, R: RegisterLongName> Writeable for MmioRegister<W, R> {
    type T = u32;
    type R = R;

    fn set(&self, value: u32) {
        if CONFIG.trace_mmio {
            debug!("mmio: write {:08x} to +{:#04x}", value, self.offset);
        }
        self.window.write32(self.offset, value);
    }
}
