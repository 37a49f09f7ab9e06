//! Fixed-point arithmetic for the ncore per-core runtime
//!
//! Every value that flows through the timestep loop is fixed-point: synaptic
//! input and weights are signed 16.15 accumulators, decay and injection
//! factors are unsigned 0.32 fractions, and weight scales are unsigned 32.32.
//! The types are the `fixed` crate's, so overflow and rounding are defined
//! and identical on every target.
//!
//! ```
//! use ncore_fixed::{decay_s1615, Accum, Decay};
//!
//! let input = Accum::from_num(2);
//! let half = Decay::from_bits(1 << 31);
//! assert_eq!(decay_s1615(input, half), Accum::from_num(1));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod decay;

pub use decay::{decay_s1615, ExpSynapseParams};

/// Signed 16.15 accumulator (`s1615`): synaptic input, weights, delays
pub type Accum = fixed::types::I17F15;

/// Unsigned 0.32 fraction used for decay and injection factors
pub type Decay = fixed::types::U0F32;

/// Unsigned 32.32 value used for weight scales
pub type LongAccum = fixed::types::U32F32;

/// Build an [`Accum`] from its raw bit pattern
#[inline(always)]
pub const fn kbits(bits: i32) -> Accum {
    Accum::from_bits(bits)
}

/// Convert a raw ring-buffer weight into an input value
///
/// The raw value is shifted left by `left_shift` and reinterpreted as the
/// bits of an `s1615`; results that do not fit saturate at [`Accum::MAX`].
#[inline]
pub fn convert_weight_to_input(weight: u32, left_shift: u32) -> Accum {
    let shifted = (weight as u64).checked_shl(left_shift).unwrap_or(u64::MAX);
    if shifted > i32::MAX as u64 {
        Accum::MAX
    } else {
        kbits(shifted as i32)
    }
}

/// Round `|weight| * scale` to the nearest integer, saturating at `u16::MAX`
///
/// This is the storage encoding of a synaptic weight in a matrix row.
#[inline]
pub fn scale_weight(weight: Accum, scale: LongAccum) -> u16 {
    let magnitude = (weight.to_bits() as i64).unsigned_abs() as u128;
    // 15 + 32 fractional bits in the product
    let product = magnitude * scale.to_bits() as u128;
    let rounded = (product + (1u128 << 46)) >> 47;
    if rounded > u16::MAX as u128 {
        u16::MAX
    } else {
        rounded as u16
    }
}

/// Convert a delay drawn in milliseconds into whole timesteps
///
/// Rounds to the nearest step. Negative delays become zero and delays too
/// large for a `u16` saturate.
#[inline]
pub fn rescale_delay(delay: Accum, timestep_per_delay: Accum) -> u16 {
    let product = delay.to_bits() as i64 * timestep_per_delay.to_bits() as i64;
    if product <= 0 {
        return 0;
    }
    // 30 fractional bits in the product
    let rounded = (product + (1i64 << 29)) >> 30;
    if rounded > u16::MAX as i64 {
        u16::MAX
    } else {
        rounded as u16
    }
}
