// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Platform devices: a device-tree node plus the memory resources the board
//! assigned to it.
//!
//! Drivers never dereference resource addresses themselves. They ask the
//! device to map a resource, which claims it and returns an [`Mmio`] window.
//! How a resource becomes a window is decided by the board through a
//! [`WindowFactory`]: [`PhysicalWindows`] on hardware, [`RamWindows`] when
//! the device is emulated.

use core::cell::Cell;

use crate::platform::of::{DeviceNode, StaticDeviceNode};
use crate::utilities::mmio::{Mmio, MmioWindow, RamWindow};
use crate::ErrorCode;

/// A physical memory range assigned to a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryResource {
    pub start: usize,
    pub size: usize,
}

/// A device a platform driver can bind to.
pub trait PlatformDevice {
    /// The register window handed out when a resource is mapped.
    type Window: Mmio;

    fn name(&self) -> &str;

    fn of_node(&self) -> &dyn DeviceNode;

    /// Memory resource `index`, if the device has one.
    fn resource(&self, index: usize) -> Option<MemoryResource>;

    /// Claim and map memory resource `index`.
    ///
    /// Returns `NODEVICE` if the resource does not exist, `BUSY` if it is
    /// already claimed, and `INVAL` if it is empty.
    fn ioremap_resource(&self, index: usize) -> Result<Self::Window, ErrorCode>;

    /// Release a resource claimed with `ioremap_resource`. Windows obtained
    /// for it must no longer be used.
    fn release_resource(&self, index: usize);

    /// Attach a driver-defined value to the device.
    fn set_drvdata(&self, data: usize);

    fn drvdata(&self) -> Option<usize>;

    fn clear_drvdata(&self);
}

/// Turns memory resources into register windows.
pub trait WindowFactory {
    type Window: Mmio;

    fn map(&self, resource: MemoryResource) -> Result<Self::Window, ErrorCode>;
}

/// Maps resources to the device memory at their physical address.
pub struct PhysicalWindows {
    _private: (),
}

impl PhysicalWindows {
    /// # Safety
    ///
    /// Every resource mapped through this factory must describe device
    /// memory that is valid for the lifetime of the system. Resource claiming
    /// in [`PlatformDevice`] then guarantees exclusive access.
    pub const unsafe fn new() -> PhysicalWindows {
        PhysicalWindows { _private: () }
    }
}

impl WindowFactory for PhysicalWindows {
    type Window = MmioWindow;

    fn map(&self, resource: MemoryResource) -> Result<MmioWindow, ErrorCode> {
        if resource.start % 4 != 0 {
            return Err(ErrorCode::INVAL);
        }
        // SAFETY: The caller of `PhysicalWindows::new` promised that
        // resources describe mapped device memory, and the device only hands
        // out a window for an unclaimed resource.
        Ok(unsafe { MmioWindow::new(resource.start, resource.size) })
    }
}

/// Maps every resource onto the same block of emulated registers.
///
/// The window covers `resource.size` bytes, so a board or test controls the
/// window size through the resource it declares.
pub struct RamWindows<'a> {
    words: &'a [Cell<u32>],
}

impl<'a> RamWindows<'a> {
    pub fn new(words: &'a [Cell<u32>]) -> RamWindows<'a> {
        RamWindows { words }
    }
}

impl<'a> WindowFactory for RamWindows<'a> {
    type Window = RamWindow<'a>;

    fn map(&self, resource: MemoryResource) -> Result<RamWindow<'a>, ErrorCode> {
        let words = self
            .words
            .get(..resource.size / 4)
            .ok_or(ErrorCode::SIZE)?;
        Ok(RamWindow::new(words))
    }
}

/// Resources past this index cannot be claimed.
const MAX_RESOURCES: usize = u32::BITS as usize;

/// A platform device described by static tables.
pub struct StaticPlatformDevice<'a, F: WindowFactory> {
    node: &'a StaticDeviceNode<'a>,
    resources: &'a [MemoryResource],
    windows: F,
    /// Bit `i` is set while resource `i` is claimed.
    claimed: Cell<u32>,
    drvdata: Cell<Option<usize>>,
}

impl<'a, F: WindowFactory> StaticPlatformDevice<'a, F> {
    pub fn new(
        node: &'a StaticDeviceNode<'a>,
        resources: &'a [MemoryResource],
        windows: F,
    ) -> StaticPlatformDevice<'a, F> {
        StaticPlatformDevice {
            node,
            resources,
            windows,
            claimed: Cell::new(0),
            drvdata: Cell::new(None),
        }
    }

    /// Whether resource `index` is currently claimed by a driver.
    pub fn is_claimed(&self, index: usize) -> bool {
        index < MAX_RESOURCES && self.claimed.get() & (1 << index) != 0
    }
}

impl<F: WindowFactory> PlatformDevice for StaticPlatformDevice<'_, F> {
    type Window = F::Window;

    fn name(&self) -> &str {
        self.node.name()
    }

    fn of_node(&self) -> &dyn DeviceNode {
        self.node
    }

    fn resource(&self, index: usize) -> Option<MemoryResource> {
        self.resources.get(index).copied()
    }

    fn ioremap_resource(&self, index: usize) -> Result<F::Window, ErrorCode> {
        let resource = self.resource(index).ok_or(ErrorCode::NODEVICE)?;
        if index >= MAX_RESOURCES {
            return Err(ErrorCode::NODEVICE);
        }
        if self.is_claimed(index) {
            return Err(ErrorCode::BUSY);
        }
        if resource.size == 0 {
            return Err(ErrorCode::INVAL);
        }
        let window = self.windows.map(resource)?;
        self.claimed.set(self.claimed.get() | (1 << index));
        Ok(window)
    }

    fn release_resource(&self, index: usize) {
        if index < MAX_RESOURCES {
            self.claimed.set(self.claimed.get() & !(1 << index));
        }
    }

    fn set_drvdata(&self, data: usize) {
        self.drvdata.set(Some(data));
    }

    fn drvdata(&self) -> Option<usize> {
        self.drvdata.get()
    }

    fn clear_drvdata(&self) {
        self.drvdata.set(None);
    }
}
