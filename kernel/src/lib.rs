// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Core Kernel
//!
//! The kernel crate implements the shared code that chips, capsules, and
//! boards use: the standard error type, compile-time configuration, the
//! debug output path, the MMIO capability, the platform bus and device-tree
//! node model, and the Hardware Interface Layer (HIL) definitions.
//!
//! Most `unsafe` code is in this kernel crate.

#![warn(unreachable_pub)]
#![no_std]

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
#[macro_use]
pub mod debug;
pub mod hil;
pub mod platform;
pub mod utilities;

mod errorcode;

pub use crate::errorcode::ErrorCode;
