//! Parser switches.

use serde::{Deserialize, Serialize};
use tico_types::ast::BinOp;

/// Operator tiers, tightest first. Every tier is left-associative.
const TIERS: [&[BinOp]; 7] = [
    &[BinOp::Mul, BinOp::Div, BinOp::Mod],
    &[BinOp::Pow],
    &[BinOp::FloorDiv, BinOp::UnsignedMod],
    &[BinOp::Add, BinOp::Sub],
    &[BinOp::Greater, BinOp::Less, BinOp::GreaterEq, BinOp::LessEq],
    &[BinOp::Eq, BinOp::NotEq],
    &[BinOp::And, BinOp::Or],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Bind `**` tighter than `* / %`. Off by default, which keeps the
    /// multiplicative tier first so `2*3**2` is `(2*3)**2`.
    pub power_binds_tightest: bool,
    /// How deeply bodies, members and operator chains may nest.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            power_binds_tightest: false,
            max_depth: 256,
        }
    }
}

impl ParseOptions {
    /// Binding power of `op`: higher binds tighter, always at least 1.
    pub fn binding_power(&self, op: BinOp) -> u8 {
        let mut tiers = TIERS;
        if self.power_binds_tightest {
            tiers.swap(0, 1);
        }
        let tier = tiers
            .iter()
            .position(|ops| ops.contains(&op))
            .unwrap_or(tiers.len() - 1);
        (tiers.len() - tier) as u8
    }
}
