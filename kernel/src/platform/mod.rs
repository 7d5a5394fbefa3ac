// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces for binding device drivers to platform devices.
//!
//! Boards describe their memory-mapped peripherals as device-tree style nodes
//! ([`of`]) with memory resources attached ([`device`]). Drivers register with
//! a [`bus::PlatformBus`], which matches them against devices by compatible
//! string and calls their probe and remove hooks.

use core::fmt;

use crate::ErrorCode;

pub mod bus;
pub mod device;
pub mod of;

pub use self::bus::{PlatformBus, PlatformDriver};
pub use self::device::{
    MemoryResource, PhysicalWindows, PlatformDevice, RamWindows, StaticPlatformDevice,
    WindowFactory,
};
pub use self::of::{of_match_device, DeviceNode, OfDeviceId, Property, StaticDeviceNode};

/// Reasons a driver can fail to bind to a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeError {
    /// A required device-tree property is absent or malformed.
    MissingProperty(&'static str),
    /// No storage is left for another driver instance.
    NoMemory,
    /// The device's register window could not be mapped.
    Mapping(ErrorCode),
    /// The device could not be registered with its subsystem.
    Registration(ErrorCode),
}

impl From<ProbeError> for ErrorCode {
    fn from(err: ProbeError) -> ErrorCode {
        match err {
            ProbeError::MissingProperty(_) => ErrorCode::NODEVICE,
            ProbeError::NoMemory => ErrorCode::NOMEM,
            ProbeError::Mapping(code) | ProbeError::Registration(code) => code,
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeError::MissingProperty(name) => write!(f, "missing property {}", name),
            ProbeError::NoMemory => write!(f, "out of driver instances"),
            ProbeError::Mapping(code) => write!(f, "cannot map registers: {}", code),
            ProbeError::Registration(code) => write!(f, "cannot register: {}", code),
        }
    }
}
