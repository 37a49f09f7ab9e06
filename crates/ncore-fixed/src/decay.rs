//! Exponential decay on fixed-point values
//!
//! A first-order exponential synapse decays its input each timestep by
//! `exp(-dt / tau)`. On the core this is a single 32x32 multiply of the
//! `s1615` value against a precomputed `u0.32` factor.

use crate::{Accum, Decay};

/// Multiply `value` by the fraction `decay`, rounding to nearest
///
/// The 64-bit product carries 47 fractional bits; it is rounded half-up
/// before dropping the 32 bits that belong to the decay factor.
#[inline(always)]
pub fn decay_s1615(value: Accum, decay: Decay) -> Accum {
    let product = value.to_bits() as i64 * decay.to_bits() as i64;
    Accum::from_bits(((product + (1i64 << 31)) >> 32) as i32)
}

/// Decay and injection factors of a current-based exponential synapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpSynapseParams {
    /// Per-timestep multiplier applied to the channel input
    pub decay: Decay,
    /// Multiplier applied to newly arriving input before it is added
    pub init: Decay,
}

impl ExpSynapseParams {
    /// Compute factors from a time constant and a timestep, both in ms
    ///
    /// `decay = exp(-dt / tau)` and `init = tau / dt * (1 - decay)`, the
    /// latter saturating just below one.
    pub fn from_tau(tau_ms: f64, timestep_ms: f64) -> Self {
        if tau_ms <= 0.0 || timestep_ms <= 0.0 {
            return Self::passthrough();
        }
        let decay = libm::exp(-timestep_ms / tau_ms);
        let init = tau_ms / timestep_ms * (1.0 - decay);
        Self {
            decay: Decay::saturating_from_num(decay),
            init: Decay::saturating_from_num(init),
        }
    }

    /// Factors that inject input unchanged and discard it after one step
    pub const fn passthrough() -> Self {
        Self {
            decay: Decay::ZERO,
            init: Decay::MAX,
        }
    }
}

impl Default for ExpSynapseParams {
    fn default() -> Self {
        Self::passthrough()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decay_halves() {
        let half = Decay::from_bits(1 << 31);
        assert_eq!(decay_s1615(Accum::from_num(2), half), Accum::from_num(1));
        assert_eq!(decay_s1615(Accum::from_num(-1), half), Accum::from_num(-0.5));
    }

    #[test]
    fn test_decay_zero_factor_clears() {
        assert_eq!(decay_s1615(Accum::from_num(100), Decay::ZERO), Accum::ZERO);
    }

    #[test]
    fn test_decay_max_factor_keeps_value() {
        // 1 - 2^-32 rounds back to the original value
        let v = Accum::from_num(12.5);
        assert_eq!(decay_s1615(v, Decay::MAX), v);
    }

    #[test]
    fn test_from_tau() {
        let params = ExpSynapseParams::from_tau(5.0, 1.0);
        let decay: f64 = params.decay.to_num();
        let init: f64 = params.init.to_num();
        assert!((decay - 0.818_730_75).abs() < 1e-6);
        assert!((init - 0.906_346_23).abs() < 1e-6);
    }

    #[test]
    fn test_from_tau_degenerate() {
        assert_eq!(ExpSynapseParams::from_tau(0.0, 1.0), ExpSynapseParams::passthrough());
    }

    proptest! {
        #[test]
        fn decay_never_grows_magnitude(bits in any::<i32>(), factor in any::<u32>()) {
            let value = Accum::from_bits(bits);
            let decayed = decay_s1615(value, Decay::from_bits(factor));
            prop_assert!((decayed.to_bits() as i64).abs() <= (bits as i64).abs());
        }
    }
}
