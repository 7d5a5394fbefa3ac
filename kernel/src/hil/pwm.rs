// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces for Pulse Width Modulation output.
//!
//! A PWM controller ("chip") exposes `npwm` outputs, addressed by the chip as
//! hardware indices `0..npwm`. The chip driver registers its operations with a
//! [`PwmChipRegistrar`] (the PWM framework), which assigns the chip a
//! contiguous range of global PWM numbers starting at `base`. Users only ever
//! talk to the framework; the framework serialises calls per output and
//! validates parameters before invoking [`PwmChipOps`].

use crate::ErrorCode;

/// Number of global PWM numbers the framework can hand out.
pub const MAX_PWMS: usize = 64;

/// The record a framework hands back when a chip is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmChip {
    /// Registration slot inside the framework.
    pub id: usize,
    /// First global PWM number of this chip.
    pub base: usize,
    /// Number of outputs.
    pub npwm: usize,
}

impl PwmChip {
    /// Global PWM number of hardware output `hwpwm`.
    pub fn pwm(&self, hwpwm: usize) -> Option<usize> {
        if hwpwm < self.npwm {
            Some(self.base + hwpwm)
        } else {
            None
        }
    }

    /// Hardware index of global PWM number `pwm`, if this chip owns it.
    pub fn hwpwm(&self, pwm: usize) -> Option<usize> {
        if pwm >= self.base && pwm < self.base + self.npwm {
            Some(pwm - self.base)
        } else {
            None
        }
    }
}

/// A waveform as seen by users: period and active time in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PwmWaveform {
    pub period_ns: u64,
    pub duty_ns: u64,
}

/// Operations a PWM chip driver provides to the framework.
///
/// The framework never calls two operations for the same output
/// concurrently. Calls for different outputs of the same chip may interleave,
/// so implementations must only touch state belonging to `hwpwm`.
pub trait PwmChipOps {
    /// Name of the driver that owns this chip, used in framework diagnostics.
    fn owner(&self) -> &'static str;

    /// Program output `hwpwm` for a waveform of `period_ns` with an active
    /// time of `duty_ns`. Must not change whether the output is enabled.
    ///
    /// Returns `INVAL` for parameters the chip cannot accept at all. Values
    /// the hardware cannot represent exactly are rounded or saturated.
    fn config(&self, hwpwm: usize, duty_ns: i32, period_ns: i32) -> Result<(), ErrorCode>;

    /// Start driving the configured waveform on output `hwpwm`.
    fn enable(&self, hwpwm: usize) -> Result<(), ErrorCode>;

    /// Stop output `hwpwm` and deassert the line.
    fn disable(&self, hwpwm: usize);

    /// Reconstruct the waveform currently programmed into the hardware.
    fn read_waveform(&self, _hwpwm: usize) -> Result<PwmWaveform, ErrorCode> {
        Err(ErrorCode::NOSUPPORT)
    }
}

/// The chip-facing side of a PWM framework.
pub trait PwmChipRegistrar<'a> {
    /// Register `ops` as a chip with `npwm` outputs. The framework picks the
    /// lowest free range of global PWM numbers.
    fn add(&self, ops: &'a dyn PwmChipOps, npwm: usize) -> Result<PwmChip, ErrorCode>;

    /// Unregister `chip`. Fails with `BUSY` while any of its outputs is
    /// requested by a user.
    fn remove(&self, chip: PwmChip) -> Result<(), ErrorCode>;

    /// Disable output `hwpwm` of `chip` through the framework, so that the
    /// framework's view of the output stays consistent with the hardware.
    fn disable(&self, chip: PwmChip, hwpwm: usize);
}

#[cfg(test)]
mod tests {
    use super::PwmChip;

    #[test]
    fn chip_maps_between_global_and_hardware_numbers() {
        let chip = PwmChip {
            id: 1,
            base: 8,
            npwm: 3,
        };
        assert_eq!(chip.pwm(0), Some(8));
        assert_eq!(chip.pwm(2), Some(10));
        assert_eq!(chip.pwm(3), None);
        assert_eq!(chip.hwpwm(7), None);
        assert_eq!(chip.hwpwm(9), Some(1));
        assert_eq!(chip.hwpwm(11), None);
    }
}
