// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register map of the Cadence Triple Timer Counter (TTC).
//!
//! The TTC has three identical counters. Each logical register exists once
//! per counter, and the three copies sit next to each other, so the registers
//! form a grid of rows of three words (Zynq-7000 TRM, UG585, appendix B.32):
//!
//! ```text
//!            channel 0   channel 1   channel 2
//! CLOCK_CTRL   0x00        0x04        0x08
//! CNT_CTRL     0x0C        0x10        0x14
//! ...
//! EVENT        0x78        0x7C        0x80
//! ```

use kernel::utilities::registers::register_bitfields;
use kernel::ErrorCode;

/// Number of counters in one TTC.
pub const TTC_NUM_CHANNELS: usize = 3;

/// Bytes covered by the register grid of one TTC.
pub const TTC_REGISTER_SPAN: usize = 4 * TTC_NUM_CHANNELS * TtcRegister::ALL.len();

/// One of the three counters of a TTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Channel {
    Ch0 = 0,
    Ch1 = 1,
    Ch2 = 2,
}

impl Channel {
    pub const ALL: [Channel; TTC_NUM_CHANNELS] = [Channel::Ch0, Channel::Ch1, Channel::Ch2];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Channel {
    type Error = ErrorCode;

    fn try_from(index: usize) -> Result<Channel, ErrorCode> {
        match index {
            0 => Ok(Channel::Ch0),
            1 => Ok(Channel::Ch1),
            2 => Ok(Channel::Ch2),
            _ => Err(ErrorCode::INVAL),
        }
    }
}

/// The logical registers of a TTC counter, in address order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TtcRegister {
    ClockControl = 0,
    CounterControl = 1,
    CounterValue = 2,
    Interval = 3,
    Match1 = 4,
    Match2 = 5,
    Match3 = 6,
    InterruptStatus = 7,
    InterruptEnable = 8,
    EventControlTimer = 9,
    Event = 10,
}

impl TtcRegister {
    pub const ALL: [TtcRegister; 11] = [
        TtcRegister::ClockControl,
        TtcRegister::CounterControl,
        TtcRegister::CounterValue,
        TtcRegister::Interval,
        TtcRegister::Match1,
        TtcRegister::Match2,
        TtcRegister::Match3,
        TtcRegister::InterruptStatus,
        TtcRegister::InterruptEnable,
        TtcRegister::EventControlTimer,
        TtcRegister::Event,
    ];

    /// Byte offset of this register of `channel` from the start of the TTC.
    pub const fn offset(self, channel: Channel) -> usize {
        4 * (TTC_NUM_CHANNELS * self as usize + channel as usize)
    }
}

register_bitfields![u32,
    pub CLOCK_CONTROL [
        /// Prescaler enable
        PS_EN OFFSET(0) NUMBITS(1) [],
        /// Prescaler value; the clock is divided by 2^(PS_V + 1)
        PS_V OFFSET(1) NUMBITS(4) [],
        /// Clock source
        C_SRC OFFSET(5) NUMBITS(1) [
            Pclk = 0,
            External = 1
        ],
        /// External clock edge
        EX_E OFFSET(6) NUMBITS(1) [
            Rising = 0,
            Falling = 1
        ]
    ],
    pub COUNTER_CONTROL [
        /// Counter disable
        DIS OFFSET(0) NUMBITS(1) [],
        /// Interval mode; the counter wraps at INTERVAL instead of overflowing
        INT OFFSET(1) NUMBITS(1) [],
        /// Count down
        DEC OFFSET(2) NUMBITS(1) [],
        /// Match mode
        MATCH OFFSET(3) NUMBITS(1) [],
        /// Reset the counter; self-clearing
        RST OFFSET(4) NUMBITS(1) [],
        /// Waveform output, active low
        WAVE_EN OFFSET(5) NUMBITS(1) [
            Enabled = 0,
            Disabled = 1
        ],
        /// Waveform polarity
        WAVE_POL OFFSET(6) NUMBITS(1) []
    ],
    pub INTERVAL [
        VALUE OFFSET(0) NUMBITS(16) []
    ],
    pub MATCH [
        VALUE OFFSET(0) NUMBITS(16) []
    ],
    /// Layout shared by INTERRUPT_STATUS and INTERRUPT_ENABLE
    pub INTERRUPT [
        /// Interval
        IV OFFSET(0) NUMBITS(1) [],
        M1 OFFSET(1) NUMBITS(1) [],
        M2 OFFSET(2) NUMBITS(1) [],
        M3 OFFSET(3) NUMBITS(1) [],
        /// Counter overflow
        OV OFFSET(4) NUMBITS(1) [],
        /// Event timer overflow
        EV OFFSET(5) NUMBITS(1) []
    ]
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_the_register_grid() {
        let rows: [(TtcRegister, usize); 11] = [
            (TtcRegister::ClockControl, 0x00),
            (TtcRegister::CounterControl, 0x0C),
            (TtcRegister::CounterValue, 0x18),
            (TtcRegister::Interval, 0x24),
            (TtcRegister::Match1, 0x30),
            (TtcRegister::Match2, 0x3C),
            (TtcRegister::Match3, 0x48),
            (TtcRegister::InterruptStatus, 0x54),
            (TtcRegister::InterruptEnable, 0x60),
            (TtcRegister::EventControlTimer, 0x6C),
            (TtcRegister::Event, 0x78),
        ];
        for (register, base) in rows {
            for channel in Channel::ALL {
                assert_eq!(
                    register.offset(channel),
                    base + 4 * channel.index(),
                    "{:?} of {:?}",
                    register,
                    channel
                );
            }
        }
    }

    #[test]
    fn offsets_are_distinct_and_inside_the_span() {
        let mut seen = std::vec::Vec::new();
        for register in TtcRegister::ALL {
            for channel in Channel::ALL {
                let offset = register.offset(channel);
                assert_eq!(offset % 4, 0);
                assert!(offset + 4 <= TTC_REGISTER_SPAN);
                assert!(!seen.contains(&offset), "{:#x} mapped twice", offset);
                seen.push(offset);
            }
        }
        assert_eq!(seen.len(), 33);
        assert_eq!(TTC_REGISTER_SPAN, 0x84);
    }

    #[test]
    fn channel_indices() {
        assert_eq!(Channel::try_from(2), Ok(Channel::Ch2));
        assert_eq!(Channel::try_from(3), Err(ErrorCode::INVAL));
        assert_eq!(Channel::Ch1.index(), 1);
    }
}
