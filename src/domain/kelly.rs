//! Kelly Criterion stake sizing for lay bets.
//!
//! A lay of under 0.5 first-half goals at odds `o` with commission `c`
//! wins `s * (1 - c)` with probability `p` and loses `s * (o - 1)` with
//! probability `q = 1 - p`. Maximising expected log growth gives
//!
//!   f* = (p * (1 - c) - q * (o - 1)) / ((o - 1) * (1 - c))
//!
//! as the backer's stake per unit of bankroll. The sized fraction scales
//! `f*` by the Kelly multiplier, a confidence weight and a value weight,
//! then caps it:
//!
//!   confidence = max(0, 1 - ci_width / tau_conf)
//!   value      = min(1, edge / target_edge)   (0 when edge <= 0)
//!   fraction   = min(stake_cap, kelly_fraction * f* * confidence * value)

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::types::ValueSignal;

/// Dynamic fractional Kelly for lay bets (Decimal API).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayKelly {
    /// Multiplier on full Kelly (0.5 = half-Kelly).
    fraction: Decimal,
    /// CI width at which confidence weight reaches zero.
    tau_conf: Decimal,
    /// Edge (probability points) at which value weight saturates.
    target_edge: Decimal,
    /// Maximum stake as fraction of bankroll.
    stake_cap: Decimal,
}

impl LayKelly {
    pub const fn new(
        fraction: Decimal,
        tau_conf: Decimal,
        target_edge: Decimal,
        stake_cap: Decimal,
    ) -> Self {
        Self {
            fraction,
            tau_conf,
            target_edge,
            stake_cap,
        }
    }

    /// Full Kelly stake fraction for a lay, floored at zero.
    pub fn full_kelly(probability: Decimal, odds: Decimal, commission: Decimal) -> Decimal {
        let liability = odds - Decimal::ONE;
        let net_win = Decimal::ONE - commission;
        if liability <= Decimal::ZERO
            || net_win <= Decimal::ZERO
            || probability <= Decimal::ZERO
            || probability >= Decimal::ONE
        {
            return Decimal::ZERO;
        }

        let q = Decimal::ONE - probability;
        let full_kelly = (probability * net_win - q * liability) / (liability * net_win);
        full_kelly.max(Decimal::ZERO)
    }

    /// Shrinks the stake as the projected interval widens.
    pub fn confidence_weight(&self, ci_width: Decimal) -> Decimal {
        if ci_width <= Decimal::ZERO {
            return Decimal::ONE;
        }
        (Decimal::ONE - ci_width / self.tau_conf).max(Decimal::ZERO)
    }

    /// Grows the stake with edge until `target_edge`.
    pub fn value_weight(&self, edge: Decimal) -> Decimal {
        if edge <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (edge / self.target_edge).min(Decimal::ONE)
    }

    /// Bankroll fraction to stake on `signal`, in `[0, stake_cap]`.
    pub fn stake_fraction(&self, signal: &ValueSignal, commission: Decimal) -> Decimal {
        let (Some(p), Some(odds), Some(width), Some(edge)) = (
            Decimal::from_f64(signal.projected_probability),
            Decimal::from_f64(signal.odds),
            Decimal::from_f64(signal.ci_width),
            Decimal::from_f64(signal.edge),
        ) else {
            return Decimal::ZERO;
        };

        let sized = Self::full_kelly(p, odds, commission)
            * self.fraction
            * self.confidence_weight(width)
            * self.value_weight(edge);
        sized.min(self.stake_cap)
    }
}

impl Default for LayKelly {
    /// Half-Kelly, zero confidence at CI width 0.20, full value at five
    /// points of edge, at most 3% of bankroll per bet.
    fn default() -> Self {
        Self {
            fraction: dec!(0.5),
            tau_conf: dec!(0.20),
            target_edge: dec!(0.05),
            stake_cap: dec!(0.03),
        }
    }
}
