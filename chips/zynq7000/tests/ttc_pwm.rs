// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Binds the TTC PWM driver through the platform bus, registers it with the
//! PWM core, and drives it by global PWM number against emulated registers.

use core::cell::Cell;

use capsules_core::pwm_core::PwmCore;
use kernel::hil::pwm::PwmWaveform;
use kernel::platform::{
    MemoryResource, PlatformBus, PlatformDevice, PlatformDriver, ProbeError, Property, RamWindows,
    StaticDeviceNode, StaticPlatformDevice,
};
use kernel::utilities::mmio::RamWindow;
use kernel::ErrorCode;
use zynq7000::ttc::{Channel, TtcRegister};
use zynq7000::ttc_pwm::{ChannelState, ClockSource, TtcPwm, TtcPwmDriver, DRIVER_NAME};

type Device<'a> = StaticPlatformDevice<'a, RamWindows<'a>>;

const COMPATIBLE: &[&str] = &["xlnx,ps7-ttc-1.00.a", "cdns,ttc"];

const PROPERTIES: &[Property<'static>] = &[
    Property::u32("xlnx,ttc-clk0-freq-hz", 111_111_111),
    Property::u32("xlnx,ttc-clk0-clksrc", 0),
    Property::u32("xlnx,ttc-clk1-freq-hz", 111_111_111),
    Property::u32("xlnx,ttc-clk1-clksrc", 0),
    Property::u32("xlnx,ttc-clk2-freq-hz", 32_768),
    Property::u32("xlnx,ttc-clk2-clksrc", 1),
    Property::flag("xlnx,ttc-clk2-falling-edge"),
];

const WITHOUT_CLK2_CLKSRC: &[Property<'static>] = &[
    Property::u32("xlnx,ttc-clk0-freq-hz", 111_111_111),
    Property::u32("xlnx,ttc-clk0-clksrc", 0),
    Property::u32("xlnx,ttc-clk1-freq-hz", 111_111_111),
    Property::u32("xlnx,ttc-clk1-clksrc", 0),
    Property::u32("xlnx,ttc-clk2-freq-hz", 111_111_111),
];

const TTC0: &[MemoryResource] = &[MemoryResource {
    start: 0xF800_1000,
    size: 0x84,
}];

const TTC1: &[MemoryResource] = &[MemoryResource {
    start: 0xF800_2000,
    size: 0x84,
}];

fn registers() -> [Cell<u32>; 33] {
    core::array::from_fn(|_| Cell::new(0))
}

fn word(words: &[Cell<u32>], register: TtcRegister, channel: Channel) -> u32 {
    words[register.offset(channel) / 4].get()
}

#[test]
fn bound_ttc_drives_pwm_outputs() {
    let words = registers();
    let node = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let device = Device::new(&node, TTC0, RamWindows::new(&words));
    let instances: [TtcPwm<RamWindow>; 2] = [TtcPwm::new(), TtcPwm::new()];
    let pwm: PwmCore<2> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);
    let bus: PlatformBus<Device, 1, 2> = PlatformBus::new();

    bus.add_device(&device).unwrap();
    bus.register_driver(&driver).unwrap();
    assert_eq!(bus.bound_driver(&device), Some(DRIVER_NAME));
    assert_eq!(device.drvdata(), Some(0));
    assert!(device.is_claimed(0));

    let ttc = driver.instance(&device).unwrap();
    let chip = ttc.chip().unwrap();
    assert_eq!((chip.base, chip.npwm), (0, 3));
    assert_eq!(
        ttc.clock(Channel::Ch2).source,
        ClockSource::External { falling_edge: true }
    );

    pwm.request(1, "backlight").unwrap();
    pwm.config(1, 250_000, 1_000_000).unwrap();
    pwm.enable(1).unwrap();
    assert_eq!(word(&words, TtcRegister::ClockControl, Channel::Ch1), 0b0101);
    assert_eq!(word(&words, TtcRegister::Interval, Channel::Ch1), 13_888);
    assert_eq!(word(&words, TtcRegister::Match1, Channel::Ch1), 3_472);
    assert_eq!(word(&words, TtcRegister::CounterControl, Channel::Ch1), 0x0A);
    assert_eq!(ttc.channel_state(Channel::Ch1), ChannelState::Running);
    assert_eq!(
        pwm.get_state(1),
        Ok(PwmWaveform {
            period_ns: 999_937,
            duty_ns: 249_985,
        })
    );

    pwm.free(1).unwrap();
    assert_eq!(word(&words, TtcRegister::CounterControl, Channel::Ch1), 0x2B);
    assert_eq!(ttc.channel_state(Channel::Ch1), ChannelState::Configured);

    bus.remove_device(&device).unwrap();
    assert_eq!(device.drvdata(), None);
    assert!(!device.is_claimed(0));
    assert!(!instances[0].is_in_use());
    assert_eq!(instances[0].channel_state(Channel::Ch1), ChannelState::Unconfigured);
    assert_eq!(pwm.state(0), Err(ErrorCode::NODEVICE));
}

#[test]
fn two_ttcs_get_consecutive_pwm_numbers() {
    let (words0, words1) = (registers(), registers());
    let node0 = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let node1 = StaticDeviceNode::new("timer@f8002000", &["cdns,ttc"], PROPERTIES);
    let ttc0 = Device::new(&node0, TTC0, RamWindows::new(&words0));
    let ttc1 = Device::new(&node1, TTC1, RamWindows::new(&words1));
    let instances: [TtcPwm<RamWindow>; 2] = [TtcPwm::new(), TtcPwm::new()];
    let pwm: PwmCore<2> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);
    let bus: PlatformBus<Device, 1, 2> = PlatformBus::new();

    bus.register_driver(&driver).unwrap();
    bus.add_device(&ttc0).unwrap();
    bus.add_device(&ttc1).unwrap();
    assert_eq!(driver.instance(&ttc1).and_then(|ttc| ttc.chip()).map(|c| c.base), Some(3));

    pwm.request(4, "fan").unwrap();
    pwm.config(4, 500, 1_000).unwrap();
    assert_eq!(word(&words1, TtcRegister::Interval, Channel::Ch1), 55);
    assert_eq!(word(&words1, TtcRegister::Match1, Channel::Ch1), 27);
    assert!(words0.iter().all(|w| w.get() == 0));
}

#[test]
fn missing_property_leaves_no_state() {
    let words = registers();
    let node = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, WITHOUT_CLK2_CLKSRC);
    let device = Device::new(&node, TTC0, RamWindows::new(&words));
    let instances: [TtcPwm<RamWindow>; 1] = [TtcPwm::new()];
    let pwm: PwmCore<1> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);

    let err = driver.probe(&device).unwrap_err();
    assert_eq!(err, ProbeError::MissingProperty("xlnx,ttc-clk2-clksrc"));
    assert_eq!(ErrorCode::from(err), ErrorCode::NODEVICE);

    assert!(!device.is_claimed(0));
    assert_eq!(device.drvdata(), None);
    assert!(!instances[0].is_in_use());
    assert_eq!(pwm.state(0), Err(ErrorCode::NODEVICE));
    assert!(words.iter().all(|w| w.get() == 0));

    // Through the bus the device stays present but unbound.
    let bus: PlatformBus<Device, 1, 1> = PlatformBus::new();
    bus.register_driver(&driver).unwrap();
    bus.add_device(&device).unwrap();
    assert_eq!(bus.bound_driver(&device), None);
}

#[test]
fn short_register_window_fails_probe() {
    let words = registers();
    let node = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let short = [MemoryResource {
        start: 0xF800_1000,
        size: 0x80,
    }];
    let device = Device::new(&node, &short, RamWindows::new(&words));
    let instances: [TtcPwm<RamWindow>; 1] = [TtcPwm::new()];
    let pwm: PwmCore<1> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);

    assert_eq!(
        driver.probe(&device),
        Err(ProbeError::Mapping(ErrorCode::SIZE))
    );
    assert!(!device.is_claimed(0));
    assert!(!instances[0].is_in_use());
}

#[test]
fn instance_pool_exhaustion_reports_nomem() {
    let (words0, words1) = (registers(), registers());
    let node0 = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let node1 = StaticDeviceNode::new("timer@f8002000", COMPATIBLE, PROPERTIES);
    let ttc0 = Device::new(&node0, TTC0, RamWindows::new(&words0));
    let ttc1 = Device::new(&node1, TTC1, RamWindows::new(&words1));
    let instances: [TtcPwm<RamWindow>; 1] = [TtcPwm::new()];
    let pwm: PwmCore<2> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);

    driver.probe(&ttc0).unwrap();
    let err = driver.probe(&ttc1).unwrap_err();
    assert_eq!(err, ProbeError::NoMemory);
    assert_eq!(ErrorCode::from(err), ErrorCode::NOMEM);
    assert!(!ttc1.is_claimed(0));

    driver.remove(&ttc0).unwrap();
    driver.probe(&ttc1).unwrap();
    assert_eq!(ttc1.drvdata(), Some(0));
    assert_eq!(instances[0].chip().map(|c| c.base), Some(0));
}

#[test]
fn rejected_registration_releases_the_instance() {
    let (words0, words1) = (registers(), registers());
    let node0 = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let node1 = StaticDeviceNode::new("timer@f8002000", COMPATIBLE, PROPERTIES);
    let ttc0 = Device::new(&node0, TTC0, RamWindows::new(&words0));
    let ttc1 = Device::new(&node1, TTC1, RamWindows::new(&words1));
    let instances: [TtcPwm<RamWindow>; 2] = [TtcPwm::new(), TtcPwm::new()];
    // Room for a single chip only.
    let pwm: PwmCore<1> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);

    driver.probe(&ttc0).unwrap();
    assert_eq!(
        driver.probe(&ttc1),
        Err(ProbeError::Registration(ErrorCode::NOMEM))
    );
    assert!(!ttc1.is_claimed(0));
    assert_eq!(ttc1.drvdata(), None);
    assert!(!instances[1].is_in_use());
    assert_eq!(instances[1].chip(), None);
}

#[test]
fn remove_is_refused_while_a_pwm_is_requested() {
    let words = registers();
    let node = StaticDeviceNode::new("timer@f8001000", COMPATIBLE, PROPERTIES);
    let device = Device::new(&node, TTC0, RamWindows::new(&words));
    let instances: [TtcPwm<RamWindow>; 1] = [TtcPwm::new()];
    let pwm: PwmCore<1> = PwmCore::new();
    let driver: TtcPwmDriver<Device> = TtcPwmDriver::new(&pwm, &instances);
    let bus: PlatformBus<Device, 1, 1> = PlatformBus::new();

    bus.register_driver(&driver).unwrap();
    bus.add_device(&device).unwrap();
    pwm.request(0, "fan").unwrap();
    pwm.config(0, 0, 1_000_000).unwrap();

    assert_eq!(bus.remove_device(&device), Err(ErrorCode::BUSY));
    assert_eq!(bus.bound_driver(&device), Some(DRIVER_NAME));
    assert!(device.is_claimed(0));
    assert!(instances[0].is_in_use());

    pwm.free(0).unwrap();
    assert_eq!(bus.remove_device(&device), Ok(()));
    assert!(!instances[0].is_in_use());
}
