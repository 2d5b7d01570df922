//! Dice expressions like "2d6+3".
//!
//! Used by strike actions and anything else that rolls damage from content
//! data. Parsing accepts an optional dice count ("d8" means "1d8") and an
//! optional signed modifier. Whitespace is ignored.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::GameRng;

/// Largest dice count a single expression may roll.
pub const MAX_DICE: u32 = 1000;

static DICE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d*)d(\d+)([+-]\d+)?$").ok());

/// Error when parsing a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice expression: {0}")]
    InvalidFormat(String),

    #[error("Dice count must be between 1 and {MAX_DICE}")]
    InvalidDiceCount,

    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl DiceExpr {
    /// Parse an expression such as "1d20+5", "2d6-1" or "d8".
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let pattern = DICE_PATTERN
            .as_ref()
            .ok_or_else(|| DiceError::InvalidFormat(input.to_string()))?;
        let caps = pattern
            .captures(&compact)
            .ok_or_else(|| DiceError::InvalidFormat(input.to_string()))?;

        let count = match caps.get(1).map(|m| m.as_str()) {
            Some("") | None => 1,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| DiceError::InvalidFormat(input.to_string()))?,
        };
        let sides = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .parse::<u32>()
            .map_err(|_| DiceError::InvalidFormat(input.to_string()))?;
        let modifier = match caps.get(3) {
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .map_err(|_| DiceError::InvalidFormat(input.to_string()))?,
            None => 0,
        };

        if count == 0 || count > MAX_DICE {
            return Err(DiceError::InvalidDiceCount);
        }
        if sides < 2 {
            return Err(DiceError::InvalidDieSize);
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Roll the expression. Totals saturate at the `i64` limits.
    pub fn roll(&self, rng: &mut GameRng) -> i64 {
        let count = self.count.min(MAX_DICE);
        let dice: i64 = (0..count).map(|_| rng.roll_die(self.sides)).sum();
        dice.saturating_add(self.modifier)
    }

    /// Lowest possible total.
    #[must_use]
    pub fn min_total(&self) -> i64 {
        i64::from(self.count.min(MAX_DICE)).saturating_add(self.modifier)
    }

    /// Highest possible total.
    #[must_use]
    pub fn max_total(&self) -> i64 {
        (i64::from(self.count.min(MAX_DICE)) * i64::from(self.sides)).saturating_add(self.modifier)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            DiceExpr::parse("2d6+3").unwrap(),
            DiceExpr { count: 2, sides: 6, modifier: 3 }
        );
        assert_eq!(
            DiceExpr::parse("1d20-1").unwrap(),
            DiceExpr { count: 1, sides: 20, modifier: -1 }
        );
        assert_eq!(
            DiceExpr::parse("d8").unwrap(),
            DiceExpr { count: 1, sides: 8, modifier: 0 }
        );
        assert_eq!(
            DiceExpr::parse(" 3 D 4 + 2 ").unwrap(),
            DiceExpr { count: 3, sides: 4, modifier: 2 }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(DiceExpr::parse(""), Err(DiceError::InvalidFormat(_))));
        assert!(matches!(DiceExpr::parse("fireball"), Err(DiceError::InvalidFormat(_))));
        assert_eq!(DiceExpr::parse("0d6"), Err(DiceError::InvalidDiceCount));
        assert_eq!(DiceExpr::parse("2d1"), Err(DiceError::InvalidDieSize));
        assert_eq!(DiceExpr::parse("4000000000d6"), Err(DiceError::InvalidDiceCount));
        assert!(matches!(DiceExpr::parse("99999999999d6"), Err(DiceError::InvalidFormat(_))));
        assert_eq!(DiceExpr::parse("1001d6"), Err(DiceError::InvalidDiceCount));
        assert!(DiceExpr::parse("1000d6").is_ok());
    }

    #[test]
    fn test_roll_saturates_modifier() {
        let mut rng = GameRng::new(11);
        let huge = DiceExpr { count: 2, sides: 6, modifier: i64::MAX };
        assert_eq!(huge.roll(&mut rng), i64::MAX);
        assert_eq!(huge.max_total(), i64::MAX);
        let deep = DiceExpr { count: 1, sides: 4, modifier: i64::MIN };
        assert!(deep.roll(&mut rng) < 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceExpr::parse("2d6+3").unwrap().to_string(), "2d6+3");
        assert_eq!(DiceExpr::parse("d4-1").unwrap().to_string(), "1d4-1");
        assert_eq!(DiceExpr::parse("1d12").unwrap().to_string(), "1d12");
    }

    proptest! {
        #[test]
        fn roll_stays_within_bounds(count in 1u32..6, sides in 2u32..30, modifier in -10i64..10, seed in any::<u64>()) {
            let expr = DiceExpr { count, sides, modifier };
            let mut rng = GameRng::new(seed);
            let total = expr.roll(&mut rng);
            prop_assert!(total >= expr.min_total());
            prop_assert!(total <= expr.max_total());
        }
    }
}
