// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Matching of platform drivers to platform devices.
//!
//! A driver registers once, when its module is initialised, and is bound to
//! every present device whose node is compatible with an entry of its match
//! table. Devices can appear and disappear at any time; a device that shows
//! up is offered to the registered drivers in registration order and bound to
//! the first matching one whose probe succeeds.
//!
//! A failed probe leaves the device present but unbound. The failure is
//! logged with the driver and device names.

use core::cell::Cell;

use crate::platform::device::PlatformDevice;
use crate::platform::of::{of_match_device, OfDeviceId};
use crate::platform::ProbeError;
use crate::ErrorCode;

/// A driver for devices on the platform bus.
pub trait PlatformDriver<D: PlatformDevice> {
    /// Unique name of the driver.
    fn name(&self) -> &'static str;

    /// Compatible strings this driver handles.
    fn of_match_table(&self) -> &'static [OfDeviceId];

    /// Bind to `device`. On error the driver must leave no state behind.
    fn probe(&self, device: &D) -> Result<(), ProbeError>;

    /// Unbind from `device`. On error the device stays bound.
    fn remove(&self, device: &D) -> Result<(), ErrorCode>;
}

struct DeviceEntry<'a, D> {
    device: &'a D,
    /// Index of the bound driver in the driver table.
    driver: Option<usize>,
}

impl<D> Clone for DeviceEntry<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DeviceEntry<'_, D> {}

/// A bus with room for `N_DRIVERS` drivers and `N_DEVICES` devices.
pub struct PlatformBus<'a, D: PlatformDevice, const N_DRIVERS: usize, const N_DEVICES: usize> {
    drivers: [Cell<Option<&'a dyn PlatformDriver<D>>>; N_DRIVERS],
    devices: [Cell<Option<DeviceEntry<'a, D>>>; N_DEVICES],
}

impl<'a, D: PlatformDevice, const N_DRIVERS: usize, const N_DEVICES: usize>
    PlatformBus<'a, D, N_DRIVERS, N_DEVICES>
{
    pub fn new() -> Self {
        PlatformBus {
            drivers: core::array::from_fn(|_| Cell::new(None)),
            devices: core::array::from_fn(|_| Cell::new(None)),
        }
    }

    /// Register `driver` and bind it to every unbound matching device.
    ///
    /// Returns `ALREADY` if a driver with the same name is registered and
    /// `NOMEM` if the driver table is full.
    pub fn register_driver(&self, driver: &'a dyn PlatformDriver<D>) -> Result<(), ErrorCode> {
        if self.find_driver(driver.name()).is_some() {
            return Err(ErrorCode::ALREADY);
        }
        let index = self
            .drivers
            .iter()
            .position(|d| d.get().is_none())
            .ok_or(ErrorCode::NOMEM)?;
        self.drivers[index].set(Some(driver));

        for slot in self.devices.iter() {
            if let Some(entry) = slot.get() {
                if entry.driver.is_none() && self.try_bind(driver, entry.device) {
                    slot.set(Some(DeviceEntry {
                        driver: Some(index),
                        ..entry
                    }));
                }
            }
        }
        Ok(())
    }

    /// Unbind the driver called `name` from all its devices and unregister
    /// it.
    ///
    /// Returns `INVAL` if no such driver is registered. If the driver refuses
    /// to unbind a device, that device stays bound, the driver stays
    /// registered, and the first refusal is returned.
    pub fn unregister_driver(&self, name: &str) -> Result<(), ErrorCode> {
        let index = self.find_driver(name).ok_or(ErrorCode::INVAL)?;
        let driver = self.drivers[index].get().ok_or(ErrorCode::INVAL)?;

        let mut result = Ok(());
        for slot in self.devices.iter() {
            if let Some(entry) = slot.get() {
                if entry.driver != Some(index) {
                    continue;
                }
                match driver.remove(entry.device) {
                    Ok(()) => slot.set(Some(DeviceEntry {
                        driver: None,
                        ..entry
                    })),
                    Err(e) => {
                        debug!(
                            "{}: cannot unbind {}: {}",
                            driver.name(),
                            entry.device.name(),
                            e
                        );
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
            }
        }

        if result.is_ok() {
            self.drivers[index].set(None);
        }
        result
    }

    /// Add `device` to the bus and offer it to the registered drivers.
    ///
    /// Returns `ALREADY` if the device is already present and `NOMEM` if the
    /// device table is full. A device no driver accepts is still added.
    pub fn add_device(&self, device: &'a D) -> Result<(), ErrorCode> {
        if self.find_device(device).is_some() {
            return Err(ErrorCode::ALREADY);
        }
        let slot = self
            .devices
            .iter()
            .find(|d| d.get().is_none())
            .ok_or(ErrorCode::NOMEM)?;

        let bound = self.drivers.iter().enumerate().find_map(|(index, d)| {
            d.get()
                .filter(|driver| self.try_bind(*driver, device))
                .map(|_| index)
        });
        slot.set(Some(DeviceEntry {
            device,
            driver: bound,
        }));
        Ok(())
    }

    /// Unbind `device` from its driver, if any, and remove it from the bus.
    ///
    /// Returns `INVAL` if the device is not present. If the driver refuses to
    /// unbind, the device stays present and bound and the error is returned.
    pub fn remove_device(&self, device: &D) -> Result<(), ErrorCode> {
        let slot = self.find_device(device).ok_or(ErrorCode::INVAL)?;
        if let Some(entry) = slot.get() {
            if let Some(driver) = entry.driver.and_then(|i| self.drivers[i].get()) {
                driver.remove(device).map_err(|e| {
                    debug!("{}: cannot unbind {}: {}", driver.name(), device.name(), e);
                    e
                })?;
            }
        }
        slot.set(None);
        Ok(())
    }

    /// Name of the driver bound to `device`.
    pub fn bound_driver(&self, device: &D) -> Option<&'static str> {
        let entry = self.find_device(device)?.get()?;
        entry
            .driver
            .and_then(|i| self.drivers[i].get())
            .map(|driver| driver.name())
    }

    fn find_driver(&self, name: &str) -> Option<usize> {
        self.drivers
            .iter()
            .position(|d| d.get().is_some_and(|driver| driver.name() == name))
    }

    fn find_device(&self, device: &D) -> Option<&Cell<Option<DeviceEntry<'a, D>>>> {
        self.devices.iter().find(|d| {
            d.get()
                .is_some_and(|entry| core::ptr::eq(entry.device, device))
        })
    }

    /// Probe `driver` on `device` if the device is compatible. Returns
    /// whether the driver bound.
    fn try_bind(&self, driver: &'a dyn PlatformDriver<D>, device: &D) -> bool {
        if of_match_device(driver.of_match_table(), device.of_node()).is_none() {
            return false;
        }
        match driver.probe(device) {
            Ok(()) => {
                debug!("{}: bound {}", driver.name(), device.name());
                true
            }
            Err(e) => {
                debug!(
                    "{}: probe of {} failed: {} ({})",
                    driver.name(),
                    device.name(),
                    e,
                    ErrorCode::from(e)
                );
                false
            }
        }
    }
}

impl<D: PlatformDevice, const N_DRIVERS: usize, const N_DEVICES: usize> Default
    for PlatformBus<'_, D, N_DRIVERS, N_DEVICES>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::platform::device::{MemoryResource, RamWindows, StaticPlatformDevice};
    use crate::platform::of::StaticDeviceNode;

    type Device<'a> = StaticPlatformDevice<'a, RamWindows<'a>>;

    const MATCH: [OfDeviceId; 1] = [OfDeviceId {
        compatible: "test,timer",
    }];

    /// A driver that counts its bindings and can be told to fail.
    struct CountingDriver {
        name: &'static str,
        probe_result: Cell<Result<(), ProbeError>>,
        remove_result: Cell<Result<(), ErrorCode>>,
        bound: Cell<usize>,
    }

    impl CountingDriver {
        fn new(name: &'static str) -> CountingDriver {
            CountingDriver {
                name,
                probe_result: Cell::new(Ok(())),
                remove_result: Cell::new(Ok(())),
                bound: Cell::new(0),
            }
        }
    }

    impl<'a> PlatformDriver<Device<'a>> for CountingDriver {
        fn name(&self) -> &'static str {
            self.name
        }

        fn of_match_table(&self) -> &'static [OfDeviceId] {
            &MATCH
        }

        fn probe(&self, device: &Device<'a>) -> Result<(), ProbeError> {
            self.probe_result.get()?;
            device.set_drvdata(self.bound.get());
            self.bound.set(self.bound.get() + 1);
            Ok(())
        }

        fn remove(&self, device: &Device<'a>) -> Result<(), ErrorCode> {
            self.remove_result.get()?;
            device.clear_drvdata();
            self.bound.set(self.bound.get() - 1);
            Ok(())
        }
    }

    const RESOURCES: [MemoryResource; 1] = [MemoryResource {
        start: 0xF800_1000,
        size: 0x20,
    }];

    #[test]
    fn driver_registered_after_device_binds_it() {
        let words: [Cell<u32>; 8] = Default::default();
        let node = StaticDeviceNode::new("timer@f8001000", &["test,timer"], &[]);
        let other = StaticDeviceNode::new("uart@e0000000", &["test,uart"], &[]);
        let timer = Device::new(&node, &RESOURCES, RamWindows::new(&words));
        let uart = Device::new(&other, &RESOURCES, RamWindows::new(&words));
        let driver = CountingDriver::new("timer");

        let bus: PlatformBus<Device, 2, 4> = PlatformBus::new();
        bus.add_device(&timer).unwrap();
        bus.add_device(&uart).unwrap();
        assert_eq!(bus.bound_driver(&timer), None);

        bus.register_driver(&driver).unwrap();
        assert_eq!(bus.bound_driver(&timer), Some("timer"));
        assert_eq!(bus.bound_driver(&uart), None);
        assert_eq!(driver.bound.get(), 1);
        assert_eq!(timer.drvdata(), Some(0));

        assert_eq!(bus.register_driver(&driver), Err(ErrorCode::ALREADY));
    }

    #[test]
    fn failed_probe_leaves_device_unbound() {
        let words: [Cell<u32>; 8] = Default::default();
        let node = StaticDeviceNode::new("timer@f8001000", &["test,timer"], &[]);
        let timer = Device::new(&node, &RESOURCES, RamWindows::new(&words));
        let driver = CountingDriver::new("timer");
        driver
            .probe_result
            .set(Err(ProbeError::MissingProperty("clock-frequency")));

        let bus: PlatformBus<Device, 1, 1> = PlatformBus::new();
        bus.register_driver(&driver).unwrap();
        bus.add_device(&timer).unwrap();
        assert_eq!(bus.bound_driver(&timer), None);
        assert_eq!(driver.bound.get(), 0);

        // The device is present, so it can be removed without a driver.
        assert_eq!(bus.remove_device(&timer), Ok(()));
        assert_eq!(bus.remove_device(&timer), Err(ErrorCode::INVAL));
    }

    #[test]
    fn refused_remove_keeps_device_bound() {
        let words: [Cell<u32>; 8] = Default::default();
        let node = StaticDeviceNode::new("timer@f8001000", &["test,timer"], &[]);
        let timer = Device::new(&node, &RESOURCES, RamWindows::new(&words));
        let driver = CountingDriver::new("timer");

        let bus: PlatformBus<Device, 1, 1> = PlatformBus::new();
        bus.register_driver(&driver).unwrap();
        bus.add_device(&timer).unwrap();

        driver.remove_result.set(Err(ErrorCode::BUSY));
        assert_eq!(bus.remove_device(&timer), Err(ErrorCode::BUSY));
        assert_eq!(bus.unregister_driver("timer"), Err(ErrorCode::BUSY));
        assert_eq!(bus.bound_driver(&timer), Some("timer"));

        driver.remove_result.set(Ok(()));
        assert_eq!(bus.unregister_driver("timer"), Ok(()));
        assert_eq!(bus.bound_driver(&timer), None);
        assert_eq!(driver.bound.get(), 0);
        assert_eq!(bus.unregister_driver("timer"), Err(ErrorCode::INVAL));
    }

    #[test]
    fn full_tables_report_nomem() {
        let words: [Cell<u32>; 8] = Default::default();
        let node = StaticDeviceNode::new("timer@f8001000", &["test,timer"], &[]);
        let first = Device::new(&node, &RESOURCES, RamWindows::new(&words));
        let second = Device::new(&node, &RESOURCES, RamWindows::new(&words));
        let a = CountingDriver::new("a");
        let b = CountingDriver::new("b");

        let bus: PlatformBus<Device, 1, 1> = PlatformBus::new();
        bus.register_driver(&a).unwrap();
        assert_eq!(bus.register_driver(&b), Err(ErrorCode::NOMEM));
        bus.add_device(&first).unwrap();
        assert_eq!(bus.add_device(&first), Err(ErrorCode::ALREADY));
        assert_eq!(bus.add_device(&second), Err(ErrorCode::NOMEM));
    }
}
