// rules.rs - Life-like birth/survival rules and the B/S rule string grammar

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleParseError;

/// Neighbour-count sets of a life-like automaton, stored as 9-bit masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    birth: u16,
    survival: u16,
}

impl RuleSet {
    /// Conway's rule, `B3/S23`.
    pub const CONWAY: RuleSet = RuleSet {
        birth: 1 << 3,
        survival: (1 << 2) | (1 << 3),
    };

    /// Build from neighbour counts; counts above 8 are ignored.
    pub fn new(birth: &[u8], survival: &[u8]) -> Self {
        Self {
            birth: mask_of(birth),
            survival: mask_of(survival),
        }
    }

    pub fn births_on(&self, neighbors: u8) -> bool {
        neighbors <= 8 && self.birth & (1 << neighbors) != 0
    }

    pub fn survives_on(&self, neighbors: u8) -> bool {
        neighbors <= 8 && self.survival & (1 << neighbors) != 0
    }

    /// Next state of a cell.
    pub fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        match alive {
            true => self.survives_on(neighbors),   // Survival
            false => self.births_on(neighbors),    // Birth
        }
    }

    pub fn birth(&self) -> Vec<u8> {
        counts_of(self.birth)
    }

    pub fn survival(&self) -> Vec<u8> {
        counts_of(self.survival)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::CONWAY
    }
}

fn mask_of(counts: &[u8]) -> u16 {
    counts
        .iter()
        .filter(|&&n| n <= 8)
        .fold(0, |mask, &n| mask | (1 << n))
}

fn counts_of(mask: u16) -> Vec<u8> {
    (0..=8).filter(|n| mask & (1 << n) != 0).collect()
}

// Digits of one half, e.g. "23" out of "S23"
fn parse_counts(digits: &str) -> Result<u16, RuleParseError> {
    let mut mask = 0u16;
    for ch in digits.chars() {
        let n = match ch.to_digit(10) {
            Some(n) if n <= 8 => n as u8,
            _ => return Err(RuleParseError::BadDigit(ch)),
        };
        if mask & (1 << n) != 0 {
            return Err(RuleParseError::Duplicate(n));
        }
        mask |= 1 << n;
    }
    Ok(mask)
}

impl FromStr for RuleSet {
    type Err = RuleParseError;

    /// Parses `B<digits>/S<digits>`, case-insensitive. Either digit list may be empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RuleParseError::Empty);
        }

        let shape = || RuleParseError::Shape(trimmed.to_string());
        let (b, s) = trimmed.split_once('/').ok_or_else(shape)?;
        let birth = b
            .strip_prefix(['B', 'b'])
            .ok_or_else(shape)?;
        let survival = s
            .strip_prefix(['S', 's'])
            .ok_or_else(shape)?;

        Ok(Self {
            birth: parse_counts(birth)?,
            survival: parse_counts(survival)?,
        })
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        for n in self.birth() {
            write!(f, "{n}")?;
        }
        f.write_str("/S")?;
        for n in self.survival() {
            write!(f, "{n}")?;
        }
        Ok(())
    }
}

/// Rule lists as they appear in stored recording settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRules {
    pub birth_rules: Vec<u8>,
    pub survival_rules: Vec<u8>,
}

impl From<RuleSet> for CustomRules {
    fn from(rules: RuleSet) -> Self {
        Self {
            birth_rules: rules.birth(),
            survival_rules: rules.survival(),
        }
    }
}

impl From<&CustomRules> for RuleSet {
    fn from(custom: &CustomRules) -> Self {
        RuleSet::new(&custom.birth_rules, &custom.survival_rules)
    }
}
