// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Helper functions for common mathematical operations.

/// Nanoseconds in one second.
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Number of significant bits in `num`, i.e. the position of the highest set
/// bit plus one. An input of 0 results in an output of 0.
pub fn significant_bits(num: u64) -> u32 {
    u64::BITS - num.leading_zeros()
}

/// Get log base 2 of a number.
///
/// Note: this is the floor of the result. Also, an input of 0 results in an
/// output of 0.
pub fn log_base_two_u64(num: u64) -> u32 {
    significant_bits(num).saturating_sub(1)
}

/// Number of whole clock cycles of a `rate_hz` clock that elapse in `ns`
/// nanoseconds, rounded down.
///
/// The product is computed in 64 bits; it saturates instead of wrapping for
/// inputs beyond `u64::MAX / rate_hz`.
pub fn ns_to_cycles(ns: u64, rate_hz: u64) -> u64 {
    ns.saturating_mul(rate_hz) / NSEC_PER_SEC
}

/// Duration in nanoseconds of `cycles` periods of a `rate_hz` clock, rounded
/// up so that converting the result back with [`ns_to_cycles`] yields at
/// least `cycles`. A zero rate yields 0.
pub fn cycles_to_ns(cycles: u64, rate_hz: u64) -> u64 {
    if rate_hz == 0 {
        return 0;
    }
    cycles
        .saturating_mul(NSEC_PER_SEC)
        .saturating_add(rate_hz - 1)
        / rate_hz
}
