// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! PWM output on the Cadence Triple Timer Counter.
//!
//! Each of the three TTC counters drives one PWM line. The counter runs in
//! interval mode from 0 to INTERVAL, and the waveform output toggles when the
//! counter passes MATCH_1, so the period is set by INTERVAL and the active
//! time by MATCH_1. Both are 16 bits wide; longer periods are reached with the
//! prescaler, which divides the source clock by 2^(P+1).
//!
//! The driver binds through the platform bus to nodes compatible with
//! `xlnx,ps7-ttc-1.00.a` or `cdns,ttc`. Every node must provide the source
//! clock of each counter:
//!
//! ```text
//! xlnx,ttc-clk<c>-freq-hz       u32, source clock frequency in Hz
//! xlnx,ttc-clk<c>-clksrc        u32, 0 for PCLK, anything else for the
//!                               external clock pin
//! xlnx,ttc-clk<c>-falling-edge  optional flag, count on the falling edge of
//!                               the external clock
//! ```
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let ttc_instances = static_init!(
//!     [zynq7000::ttc_pwm::TtcPwm<MmioWindow>; 2],
//!     [zynq7000::ttc_pwm::TtcPwm::new(), zynq7000::ttc_pwm::TtcPwm::new()]
//! );
//! let ttc_pwm_driver = static_init!(
//!     zynq7000::ttc_pwm::TtcPwmDriver<'static, Device>,
//!     zynq7000::ttc_pwm::TtcPwmDriver::new(pwm_core, ttc_instances)
//! );
//! platform_bus.register_driver(ttc_pwm_driver)?;
//! ```

use core::cell::Cell;

use kernel::config::CONFIG;
use kernel::debug;
use kernel::hil::pwm::{PwmChip, PwmChipOps, PwmChipRegistrar, PwmWaveform};
use kernel::platform::{DeviceNode, OfDeviceId, PlatformDevice, PlatformDriver, ProbeError};
use kernel::utilities::math::{cycles_to_ns, ns_to_cycles, significant_bits};
use kernel::utilities::mmio::{Mmio, MmioRegister};
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::RegisterLongName;
use kernel::ErrorCode;

use crate::ttc::{
    Channel, TtcRegister, CLOCK_CONTROL, COUNTER_CONTROL, INTERRUPT, INTERVAL, MATCH,
    TTC_NUM_CHANNELS, TTC_REGISTER_SPAN,
};

pub const DRIVER_NAME: &str = "pwm-cadence";

pub static TTC_PWM_OF_MATCH: [OfDeviceId; 2] = [
    OfDeviceId {
        compatible: "xlnx,ps7-ttc-1.00.a",
    },
    OfDeviceId {
        compatible: "cdns,ttc",
    },
];

const FREQ_PROPERTIES: [&str; TTC_NUM_CHANNELS] = [
    "xlnx,ttc-clk0-freq-hz",
    "xlnx,ttc-clk1-freq-hz",
    "xlnx,ttc-clk2-freq-hz",
];

const CLKSRC_PROPERTIES: [&str; TTC_NUM_CHANNELS] = [
    "xlnx,ttc-clk0-clksrc",
    "xlnx,ttc-clk1-clksrc",
    "xlnx,ttc-clk2-clksrc",
];

const FALLING_EDGE_PROPERTIES: [&str; TTC_NUM_CHANNELS] = [
    "xlnx,ttc-clk0-falling-edge",
    "xlnx,ttc-clk1-falling-edge",
    "xlnx,ttc-clk2-falling-edge",
];

/// Largest value of the prescaler exponent.
const MAX_PRESCALER: u32 = 15;

/// Largest INTERVAL and MATCH value.
const MAX_COUNT: u64 = 0xFFFF;

/// Tick counts of up to this many bits use the smallest prescaler.
const UNSCALED_BITS: u32 = 15;

/// Where a counter's clock comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    Pclk,
    External { falling_edge: bool },
}

/// The source clock of one counter, as described by the device tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelClock {
    pub freq_hz: u32,
    pub source: ClockSource,
}

impl ChannelClock {
    const UNSET: ChannelClock = ChannelClock {
        freq_hz: 0,
        source: ClockSource::Pclk,
    };

    /// Read the clock of `channel` from `node`.
    pub fn from_node(node: &dyn DeviceNode, channel: Channel) -> Result<ChannelClock, ProbeError> {
        let read = |name: &'static str| {
            node.property_read_u32(name).map_err(|e| {
                debug!(
                    "{}: {}: cannot read {}: {}",
                    DRIVER_NAME,
                    node.name(),
                    name,
                    e
                );
                ProbeError::MissingProperty(name)
            })
        };

        let freq_hz = read(FREQ_PROPERTIES[channel.index()])?;
        let source = match read(CLKSRC_PROPERTIES[channel.index()])? {
            0 => ClockSource::Pclk,
            _ => ClockSource::External {
                falling_edge: node.property_present(FALLING_EDGE_PROPERTIES[channel.index()]),
            },
        };
        Ok(ChannelClock { freq_hz, source })
    }
}

/// Counter settings that produce a requested waveform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtcTiming {
    /// Prescaler exponent; the source clock is divided by 2^(prescaler+1).
    pub prescaler: u32,
    pub interval: u32,
    pub match_value: u32,
}

/// Quantise a waveform of `period_ns` with `duty_ns` active time for a
/// counter clocked at `clk_hz`.
///
/// Waveforms the counter cannot represent are saturated: the interval is
/// capped at 0xFFFF, and a duty time at or beyond the period gives a match
/// value equal to the interval. A negative duty time is treated as 0. Only a
/// negative period is rejected, with `INVAL`.
pub fn quantize(clk_hz: u32, duty_ns: i32, period_ns: i32) -> Result<TtcTiming, ErrorCode> {
    if period_ns < 0 {
        return Err(ErrorCode::INVAL);
    }
    let period_ticks = ns_to_cycles(period_ns as u64, clk_hz as u64);
    let prescaler = significant_bits(period_ticks)
        .saturating_sub(UNSCALED_BITS)
        .min(MAX_PRESCALER);
    let shift = prescaler + 1;
    let interval = (period_ticks >> shift).min(MAX_COUNT);

    let match_value = if duty_ns >= period_ns {
        interval
    } else {
        let duty_ticks = ns_to_cycles(duty_ns.max(0) as u64, clk_hz as u64);
        (duty_ticks >> shift).min(interval)
    };

    Ok(TtcTiming {
        prescaler,
        interval: interval as u32,
        match_value: match_value as u32,
    })
}

/// Lifecycle of one counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Unconfigured,
    Configured,
    Running,
}

/// One TTC driven as a three-channel PWM chip.
///
/// Instances are preallocated by the board and handed to a [`TtcPwmDriver`],
/// which binds each to at most one device at a time.
pub struct TtcPwm<W: Mmio> {
    window: Cell<Option<W>>,
    clocks: [Cell<ChannelClock>; TTC_NUM_CHANNELS],
    states: [Cell<ChannelState>; TTC_NUM_CHANNELS],
    chip: Cell<Option<PwmChip>>,
    in_use: Cell<bool>,
}

impl<W: Mmio> TtcPwm<W> {
    pub const fn new() -> TtcPwm<W> {
        TtcPwm {
            window: Cell::new(None),
            clocks: [
                Cell::new(ChannelClock::UNSET),
                Cell::new(ChannelClock::UNSET),
                Cell::new(ChannelClock::UNSET),
            ],
            states: [
                Cell::new(ChannelState::Unconfigured),
                Cell::new(ChannelState::Unconfigured),
                Cell::new(ChannelState::Unconfigured),
            ],
            chip: Cell::new(None),
            in_use: Cell::new(false),
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.get()
    }

    /// The registration record, while bound.
    pub fn chip(&self) -> Option<PwmChip> {
        self.chip.get()
    }

    pub fn clock(&self, channel: Channel) -> ChannelClock {
        self.clocks[channel.index()].get()
    }

    pub fn channel_state(&self, channel: Channel) -> ChannelState {
        self.states[channel.index()].get()
    }

    fn attach(&self, window: W, clocks: [ChannelClock; TTC_NUM_CHANNELS]) {
        self.window.set(Some(window));
        for channel in Channel::ALL {
            self.clocks[channel.index()].set(clocks[channel.index()]);
            self.states[channel.index()].set(ChannelState::Unconfigured);
        }
    }

    /// Forget the device and make the instance available again.
    fn release(&self) {
        self.window.set(None);
        self.chip.set(None);
        for channel in Channel::ALL {
            self.clocks[channel.index()].set(ChannelClock::UNSET);
            self.states[channel.index()].set(ChannelState::Unconfigured);
        }
        self.in_use.set(false);
    }

    fn register<R: RegisterLongName>(
        &self,
        register: TtcRegister,
        channel: Channel,
    ) -> Result<MmioRegister<W, R>, ErrorCode> {
        let window = self.window.get().ok_or(ErrorCode::NODEVICE)?;
        Ok(MmioRegister::new(window, register.offset(channel)))
    }

    fn channel(hwpwm: usize) -> Result<Channel, ErrorCode> {
        Channel::try_from(hwpwm).map_err(|e| {
            debug!("{}: invalid channel {}", DRIVER_NAME, hwpwm);
            e
        })
    }
}

impl<W: Mmio> Default for TtcPwm<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Mmio> PwmChipOps for TtcPwm<W> {
    fn owner(&self) -> &'static str {
        DRIVER_NAME
    }

    fn config(&self, hwpwm: usize, duty_ns: i32, period_ns: i32) -> Result<(), ErrorCode> {
        let channel = Self::channel(hwpwm)?;
        let clock = self.clock(channel);
        let timing = quantize(clock.freq_hz, duty_ns, period_ns).map_err(|e| {
            debug!(
                "{}: channel {}: invalid period {} ns",
                DRIVER_NAME, hwpwm, period_ns
            );
            e
        })?;
        if CONFIG.debug_pwm {
            debug!(
                "{}: channel {}: {}/{} ns at {} Hz -> P={} interval={} match={}",
                DRIVER_NAME,
                hwpwm,
                duty_ns,
                period_ns,
                clock.freq_hz,
                timing.prescaler,
                timing.interval,
                timing.match_value
            );
        }

        let source = match clock.source {
            ClockSource::Pclk => CLOCK_CONTROL::C_SRC::Pclk + CLOCK_CONTROL::EX_E::Rising,
            ClockSource::External { falling_edge } => {
                CLOCK_CONTROL::C_SRC::External
                    + if falling_edge {
                        CLOCK_CONTROL::EX_E::Falling
                    } else {
                        CLOCK_CONTROL::EX_E::Rising
                    }
            }
        };
        let clock_control: MmioRegister<W, CLOCK_CONTROL::Register> =
            self.register(TtcRegister::ClockControl, channel)?;
        let interval: MmioRegister<W, INTERVAL::Register> =
            self.register(TtcRegister::Interval, channel)?;
        let match_1: MmioRegister<W, MATCH::Register> =
            self.register(TtcRegister::Match1, channel)?;
        let interrupt_status: MmioRegister<W, INTERRUPT::Register> =
            self.register(TtcRegister::InterruptStatus, channel)?;

        clock_control.modify(
            CLOCK_CONTROL::PS_EN::SET + CLOCK_CONTROL::PS_V.val(timing.prescaler) + source,
        );
        interval.write(INTERVAL::VALUE.val(timing.interval));
        match_1.write(MATCH::VALUE.val(timing.match_value));
        // Write-1-to-clear anything latched under the old settings.
        interrupt_status.write(INTERRUPT::IV::SET + INTERRUPT::M1::SET);

        if self.channel_state(channel) == ChannelState::Unconfigured {
            self.states[channel.index()].set(ChannelState::Configured);
        }
        Ok(())
    }

    fn enable(&self, hwpwm: usize) -> Result<(), ErrorCode> {
        let channel = Self::channel(hwpwm)?;
        let counter_control: MmioRegister<W, COUNTER_CONTROL::Register> =
            self.register(TtcRegister::CounterControl, channel)?;
        if self.channel_state(channel) == ChannelState::Unconfigured {
            debug!("{}: channel {} enabled before config", DRIVER_NAME, hwpwm);
            return Err(ErrorCode::INVAL);
        }

        counter_control.modify(
            COUNTER_CONTROL::DIS::CLEAR
                + COUNTER_CONTROL::INT::SET
                + COUNTER_CONTROL::DEC::CLEAR
                + COUNTER_CONTROL::MATCH::SET
                + COUNTER_CONTROL::RST::CLEAR
                + COUNTER_CONTROL::WAVE_EN::Enabled,
        );
        self.states[channel.index()].set(ChannelState::Running);
        Ok(())
    }

    fn disable(&self, hwpwm: usize) {
        let Ok(channel) = Self::channel(hwpwm) else {
            return;
        };
        let Ok(counter_control) =
            self.register::<COUNTER_CONTROL::Register>(TtcRegister::CounterControl, channel)
        else {
            return;
        };

        counter_control.modify(COUNTER_CONTROL::DIS::SET + COUNTER_CONTROL::WAVE_EN::Disabled);
        if self.channel_state(channel) == ChannelState::Running {
            self.states[channel.index()].set(ChannelState::Configured);
        }
    }

    fn read_waveform(&self, hwpwm: usize) -> Result<PwmWaveform, ErrorCode> {
        let channel = Self::channel(hwpwm)?;
        let clock_control: MmioRegister<W, CLOCK_CONTROL::Register> =
            self.register(TtcRegister::ClockControl, channel)?;
        let interval: MmioRegister<W, INTERVAL::Register> =
            self.register(TtcRegister::Interval, channel)?;
        let match_1: MmioRegister<W, MATCH::Register> =
            self.register(TtcRegister::Match1, channel)?;

        let clock_control = clock_control.extract();
        let divisor: u64 = if clock_control.is_set(CLOCK_CONTROL::PS_EN) {
            1 << (clock_control.read(CLOCK_CONTROL::PS_V) + 1)
        } else {
            1
        };
        let freq_hz = self.clock(channel).freq_hz as u64;
        let period_ticks = interval.read(INTERVAL::VALUE) as u64 * divisor;
        let duty_ticks = match_1.read(MATCH::VALUE) as u64 * divisor;

        Ok(PwmWaveform {
            period_ns: cycles_to_ns(period_ticks, freq_hz),
            duty_ns: cycles_to_ns(duty_ticks, freq_hz),
        })
    }
}

/// Releases a half-built instance when probe bails out early.
struct ProbeGuard<'g, D: PlatformDevice> {
    instance: &'g TtcPwm<D::Window>,
    device: &'g D,
    mapped: bool,
    armed: bool,
}

impl<D: PlatformDevice> Drop for ProbeGuard<'_, D> {
    fn drop(&mut self) {
        if self.armed {
            if self.mapped {
                self.device.release_resource(0);
            }
            self.instance.release();
        }
    }
}

/// The platform driver binding TTC nodes to [`TtcPwm`] instances and
/// registering them as PWM chips.
pub struct TtcPwmDriver<'a, D: PlatformDevice> {
    registrar: &'a dyn PwmChipRegistrar<'a>,
    instances: &'a [TtcPwm<D::Window>],
}

impl<'a, D: PlatformDevice> TtcPwmDriver<'a, D>
where
    D::Window: 'a,
{
    pub fn new(
        registrar: &'a dyn PwmChipRegistrar<'a>,
        instances: &'a [TtcPwm<D::Window>],
    ) -> TtcPwmDriver<'a, D> {
        TtcPwmDriver {
            registrar,
            instances,
        }
    }

    /// The instance bound to `device`, if any.
    pub fn instance(&self, device: &D) -> Option<&'a TtcPwm<D::Window>> {
        self.instances.get(device.drvdata()?)
    }

    fn reserve(&self) -> Option<(usize, &'a TtcPwm<D::Window>)> {
        let instances = self.instances;
        let (index, instance) = instances
            .iter()
            .enumerate()
            .find(|(_, instance)| !instance.is_in_use())?;
        instance.in_use.set(true);
        Some((index, instance))
    }
}

impl<'a, D: PlatformDevice> PlatformDriver<D> for TtcPwmDriver<'a, D>
where
    D::Window: 'a,
{
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn of_match_table(&self) -> &'static [OfDeviceId] {
        &TTC_PWM_OF_MATCH
    }

    fn probe(&self, device: &D) -> Result<(), ProbeError> {
        let (index, instance) = self.reserve().ok_or_else(|| {
            debug!("{}: {}: no free instance", DRIVER_NAME, device.name());
            ProbeError::NoMemory
        })?;
        let mut guard = ProbeGuard {
            instance,
            device,
            mapped: false,
            armed: true,
        };

        let window = device.ioremap_resource(0).map_err(|e| {
            debug!("{}: {}: cannot map registers: {}", DRIVER_NAME, device.name(), e);
            ProbeError::Mapping(e)
        })?;
        guard.mapped = true;
        if window.len() < TTC_REGISTER_SPAN {
            debug!(
                "{}: {}: register window is {:#x} bytes, need {:#x}",
                DRIVER_NAME,
                device.name(),
                window.len(),
                TTC_REGISTER_SPAN
            );
            return Err(ProbeError::Mapping(ErrorCode::SIZE));
        }

        let node = device.of_node();
        let clocks = [
            ChannelClock::from_node(node, Channel::Ch0)?,
            ChannelClock::from_node(node, Channel::Ch1)?,
            ChannelClock::from_node(node, Channel::Ch2)?,
        ];
        instance.attach(window, clocks);

        let chip = self
            .registrar
            .add(instance, TTC_NUM_CHANNELS)
            .map_err(|e| {
                debug!("{}: {}: cannot add PWM chip: {}", DRIVER_NAME, device.name(), e);
                ProbeError::Registration(e)
            })?;
        instance.chip.set(Some(chip));
        device.set_drvdata(index);
        guard.armed = false;

        debug!(
            "{}: {}: pwm {}-{}",
            DRIVER_NAME,
            device.name(),
            chip.base,
            chip.base + chip.npwm - 1
        );
        Ok(())
    }

    fn remove(&self, device: &D) -> Result<(), ErrorCode> {
        let instance = self.instance(device).ok_or(ErrorCode::INVAL)?;
        let chip = instance.chip().ok_or(ErrorCode::INVAL)?;

        for channel in Channel::ALL {
            self.registrar.disable(chip, channel.index());
        }
        self.registrar.remove(chip).map_err(|e| {
            debug!("{}: {}: cannot remove PWM chip: {}", DRIVER_NAME, device.name(), e);
            e
        })?;

        for channel in Channel::ALL {
            instance.disable(channel.index());
        }
        instance.release();
        device.release_resource(0);
        device.clear_drvdata();
        Ok(())
    }
}
