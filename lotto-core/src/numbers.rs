//! Number selections and the winning-number draw.

use crate::error::{LotteryError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const PICK_COUNT: usize = 6;
pub const NUMBER_MIN: u8 = 1;
pub const NUMBER_MAX: u8 = 99;

/// Exactly six distinct numbers in `1..=99`, kept in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Selection([u8; PICK_COUNT]);

impl Selection {
    pub fn new(numbers: &[u8]) -> Result<Self> {
        if numbers.len() != PICK_COUNT {
            return Err(LotteryError::invalid_selection(format!(
                "select exactly {} numbers, got {}",
                PICK_COUNT,
                numbers.len()
            )));
        }

        if let Some(n) = numbers
            .iter()
            .find(|n| !(NUMBER_MIN..=NUMBER_MAX).contains(*n))
        {
            return Err(LotteryError::invalid_selection(format!(
                "{} is outside {}..={}",
                n, NUMBER_MIN, NUMBER_MAX
            )));
        }

        let unique: BTreeSet<u8> = numbers.iter().copied().collect();
        if unique.len() != PICK_COUNT {
            return Err(LotteryError::invalid_selection(
                "numbers must be distinct",
            ));
        }

        let mut sorted = [0u8; PICK_COUNT];
        for (slot, n) in sorted.iter_mut().zip(unique) {
            *slot = n;
        }
        Ok(Self(sorted))
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn contains(&self, n: u8) -> bool {
        self.0.binary_search(&n).is_ok()
    }

    /// Size of the intersection with another selection.
    pub fn match_count(&self, other: &Selection) -> usize {
        self.0.iter().filter(|n| other.contains(**n)).count()
    }

    /// Six distinct uniform picks: repeated draws from `1..=99`, rejecting
    /// values already taken.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut picked = BTreeSet::new();
        while picked.len() < PICK_COUNT {
            picked.insert(rng.gen_range(NUMBER_MIN..=NUMBER_MAX));
        }

        let mut numbers = [0u8; PICK_COUNT];
        for (slot, n) in numbers.iter_mut().zip(picked) {
            *slot = n;
        }
        Self(numbers)
    }
}

impl TryFrom<Vec<u8>> for Selection {
    type Error = LotteryError;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        Self::new(&numbers)
    }
}

impl From<Selection> for Vec<u8> {
    fn from(selection: Selection) -> Self {
        selection.0.to_vec()
    }
}

impl FromStr for Selection {
    type Err = LotteryError;

    /// Accepts numbers separated by commas and/or whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let numbers = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u8>().map_err(|_| {
                    LotteryError::invalid_selection(format!("'{}' is not a number", part))
                })
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::new(&numbers)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| format!("{:02}", n)).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Source of winning numbers for a draw.
pub trait NumberSource: Send + Sync {
    fn draw(&mut self) -> Selection;
}

impl<F> NumberSource for F
where
    F: FnMut() -> Selection + Send + Sync,
{
    fn draw(&mut self) -> Selection {
        self()
    }
}

/// Uniform random draws.
pub struct RandomNumbers<R = StdRng> {
    rng: R,
}

impl RandomNumbers<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send + Sync> NumberSource for RandomNumbers<R> {
    fn draw(&mut self) -> Selection {
        Selection::random(&mut self.rng)
    }
}

/// Six random distinct numbers picked on a player's behalf.
pub fn quick_pick() -> Selection {
    Selection::random(&mut rand::thread_rng())
}
