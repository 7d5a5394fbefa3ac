// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Data structure for storing compile-time configuration options in the kernel.
//!
//! Configuration lives in a typed `const` object rather than behind `#[cfg]`
//! attributes. Code gated on a `CONFIG` field is always type-checked, even
//! when the option is turned off, and the compiler folds the constant so a
//! disabled option costs nothing in the resulting binary.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching cargo feature of the
/// kernel crate from the board crate.
pub struct Config {
    /// Whether every 32-bit MMIO register access should be traced to the
    /// debug output.
    ///
    /// If enabled, each read and write through
    /// [`MmioRegister`](crate::utilities::mmio::MmioRegister) prints the
    /// register offset and value. This is very verbose and slows down
    /// drivers considerably; it is intended for bring-up only.
    pub trace_mmio: bool,

    /// Whether PWM drivers should show how a requested waveform was
    /// quantised onto the hardware.
    ///
    /// If enabled, drivers print each configuration request together with the
    /// resulting counter ticks and register values.
    pub debug_pwm: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined. Notably, this is the only location where we permit `#[cfg(x)]` to
/// be used to configure code based on Cargo features.
pub const CONFIG: Config = Config {
    trace_mmio: cfg!(feature = "trace_mmio"),
    debug_pwm: cfg!(feature = "debug_pwm"),
};
