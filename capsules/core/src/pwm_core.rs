// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Shared registry of PWM outputs.
//!
//! `PwmCore` owns the global PWM numbering. Chip drivers register through the
//! [`PwmChipRegistrar`] interface and are given a contiguous range of global
//! numbers. Users request an output by number, configure it, and enable or
//! disable it; the core validates the parameters, tracks per-output state,
//! and forwards the call to the chip that owns the output.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let pwm_core = static_init!(
//!     capsules_core::pwm_core::PwmCore<'static, 4>,
//!     capsules_core::pwm_core::PwmCore::new()
//! );
//! // Chip drivers get `pwm_core` as their `PwmChipRegistrar`.
//!
//! pwm_core.request(0, "backlight")?;
//! pwm_core.config(0, 250_000, 1_000_000)?;
//! pwm_core.enable(0)?;
//! ```

use core::cell::Cell;

use kernel::debug;
use kernel::hil::pwm::{PwmChip, PwmChipOps, PwmChipRegistrar, PwmWaveform, MAX_PWMS};
use kernel::ErrorCode;

/// What the core knows about one global PWM number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PwmState {
    /// Label of the user that requested the output, if any.
    pub label: Option<&'static str>,
    pub enabled: bool,
    /// Last accepted period, 0 if never configured.
    pub period_ns: u32,
    /// Last accepted duty time.
    pub duty_ns: u32,
}

#[derive(Clone, Copy)]
struct ChipEntry<'a> {
    ops: &'a dyn PwmChipOps,
    chip: PwmChip,
}

pub struct PwmCore<'a, const MAX_CHIPS: usize> {
    chips: [Cell<Option<ChipEntry<'a>>>; MAX_CHIPS],
    /// Chip slot owning each global number.
    owners: [Cell<Option<usize>>; MAX_PWMS],
    pwms: [Cell<PwmState>; MAX_PWMS],
}

impl<'a, const MAX_CHIPS: usize> PwmCore<'a, MAX_CHIPS> {
    pub fn new() -> PwmCore<'a, MAX_CHIPS> {
        PwmCore {
            chips: core::array::from_fn(|_| Cell::new(None)),
            owners: core::array::from_fn(|_| Cell::new(None)),
            pwms: core::array::from_fn(|_| Cell::new(PwmState::default())),
        }
    }

    /// Claim `pwm` for the user called `label`.
    pub fn request(&self, pwm: usize, label: &'static str) -> Result<(), ErrorCode> {
        self.lookup(pwm)?;
        let state = self.pwms[pwm].get();
        if state.label.is_some() {
            return Err(ErrorCode::BUSY);
        }
        self.pwms[pwm].set(PwmState {
            label: Some(label),
            ..state
        });
        Ok(())
    }

    /// Release `pwm`, disabling it first if it is running.
    pub fn free(&self, pwm: usize) -> Result<(), ErrorCode> {
        self.requested(pwm)?;
        self.disable(pwm)?;
        let state = self.pwms[pwm].get();
        self.pwms[pwm].set(PwmState {
            label: None,
            ..state
        });
        Ok(())
    }

    /// Set the period and active time of `pwm`.
    ///
    /// Returns `INVAL` unless `0 <= duty_ns <= period_ns` and
    /// `period_ns > 0`. Whether the output is enabled does not change.
    pub fn config(&self, pwm: usize, duty_ns: i32, period_ns: i32) -> Result<(), ErrorCode> {
        let (entry, hwpwm) = self.requested(pwm)?;
        if duty_ns < 0 || period_ns <= 0 || duty_ns > period_ns {
            return Err(ErrorCode::INVAL);
        }
        entry.ops.config(hwpwm, duty_ns, period_ns)?;

        let state = self.pwms[pwm].get();
        self.pwms[pwm].set(PwmState {
            period_ns: period_ns as u32,
            duty_ns: duty_ns as u32,
            ..state
        });
        Ok(())
    }

    /// Start `pwm`. Enabling a running output does nothing.
    pub fn enable(&self, pwm: usize) -> Result<(), ErrorCode> {
        let (entry, hwpwm) = self.requested(pwm)?;
        let state = self.pwms[pwm].get();
        if state.enabled {
            return Ok(());
        }
        entry.ops.enable(hwpwm)?;
        self.pwms[pwm].set(PwmState {
            enabled: true,
            ..state
        });
        Ok(())
    }

    /// Stop `pwm`. Disabling a stopped output does nothing.
    pub fn disable(&self, pwm: usize) -> Result<(), ErrorCode> {
        let (entry, hwpwm) = self.requested(pwm)?;
        self.disable_hw(entry, hwpwm, pwm);
        Ok(())
    }

    /// The state the core recorded for `pwm`.
    pub fn state(&self, pwm: usize) -> Result<PwmState, ErrorCode> {
        self.lookup(pwm)?;
        Ok(self.pwms[pwm].get())
    }

    /// The waveform the hardware is currently programmed with.
    pub fn get_state(&self, pwm: usize) -> Result<PwmWaveform, ErrorCode> {
        let (entry, hwpwm) = self.lookup(pwm)?;
        entry.ops.read_waveform(hwpwm)
    }

    fn lookup(&self, pwm: usize) -> Result<(ChipEntry<'a>, usize), ErrorCode> {
        let entry = self
            .owners
            .get(pwm)
            .and_then(|owner| owner.get())
            .and_then(|id| self.chips[id].get())
            .ok_or(ErrorCode::NODEVICE)?;
        let hwpwm = entry.chip.hwpwm(pwm).ok_or(ErrorCode::NODEVICE)?;
        Ok((entry, hwpwm))
    }

    fn requested(&self, pwm: usize) -> Result<(ChipEntry<'a>, usize), ErrorCode> {
        let found = self.lookup(pwm)?;
        if self.pwms[pwm].get().label.is_none() {
            return Err(ErrorCode::RESERVE);
        }
        Ok(found)
    }

    fn disable_hw(&self, entry: ChipEntry<'a>, hwpwm: usize, pwm: usize) {
        let state = self.pwms[pwm].get();
        if state.enabled {
            entry.ops.disable(hwpwm);
            self.pwms[pwm].set(PwmState {
                enabled: false,
                ..state
            });
        }
    }

    /// Lowest base at which `npwm` consecutive global numbers are free.
    fn find_range(&self, npwm: usize) -> Option<usize> {
        (0..=MAX_PWMS.checked_sub(npwm)?).find(|&base| {
            self.owners[base..base + npwm]
                .iter()
                .all(|owner| owner.get().is_none())
        })
    }

    fn entry(&self, chip: PwmChip) -> Result<ChipEntry<'a>, ErrorCode> {
        self.chips
            .get(chip.id)
            .and_then(|slot| slot.get())
            .filter(|entry| entry.chip == chip)
            .ok_or(ErrorCode::INVAL)
    }
}

impl<const MAX_CHIPS: usize> Default for PwmCore<'_, MAX_CHIPS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const MAX_CHIPS: usize> PwmChipRegistrar<'a> for PwmCore<'a, MAX_CHIPS> {
    fn add(&self, ops: &'a dyn PwmChipOps, npwm: usize) -> Result<PwmChip, ErrorCode> {
        if npwm == 0 {
            return Err(ErrorCode::INVAL);
        }
        let id = self
            .chips
            .iter()
            .position(|slot| slot.get().is_none())
            .ok_or(ErrorCode::NOMEM)?;
        let base = self.find_range(npwm).ok_or(ErrorCode::NOMEM)?;

        let chip = PwmChip { id, base, npwm };
        for pwm in base..base + npwm {
            self.owners[pwm].set(Some(id));
            self.pwms[pwm].set(PwmState::default());
        }
        self.chips[id].set(Some(ChipEntry { ops, chip }));
        debug!(
            "pwm: {} registered as pwm {}-{}",
            ops.owner(),
            base,
            base + npwm - 1
        );
        Ok(chip)
    }

    fn remove(&self, chip: PwmChip) -> Result<(), ErrorCode> {
        let entry = self.entry(chip)?;
        let range = chip.base..chip.base + chip.npwm;
        if let Some(pwm) = range
            .clone()
            .find(|&pwm| self.pwms[pwm].get().label.is_some())
        {
            debug!(
                "pwm: {} cannot be removed, pwm {} is requested",
                entry.ops.owner(),
                pwm
            );
            return Err(ErrorCode::BUSY);
        }
        for pwm in range {
            self.owners[pwm].set(None);
            self.pwms[pwm].set(PwmState::default());
        }
        self.chips[chip.id].set(None);
        Ok(())
    }

    fn disable(&self, chip: PwmChip, hwpwm: usize) {
        if let (Ok(entry), Some(pwm)) = (self.entry(chip), chip.pwm(hwpwm)) {
            self.disable_hw(entry, hwpwm, pwm);
        }
    }
}
