use crate::error::{LotteryError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Money in currency minor units (1/100 of the display unit).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MINOR_PER_MAJOR: u64 = 100;

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole units. Takes `u32` so the conversion cannot overflow.
    pub const fn from_major(major: u32) -> Self {
        Self(major as u64 * Self::MINOR_PER_MAJOR)
    }

    pub const fn to_minor(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / Self::MINOR_PER_MAJOR,
            self.0 % Self::MINOR_PER_MAJOR
        )
    }
}

impl FromStr for Amount {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) || frac.len() > 2 {
            return Err(LotteryError::invalid_amount(format!(
                "'{}' is not a valid amount",
                s
            )));
        }

        let overflow = || LotteryError::invalid_amount(format!("'{}' is too large", s));
        let major: u64 = whole.parse().map_err(|_| overflow())?;
        let minor: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| overflow())? * 10,
            _ => frac.parse().map_err(|_| overflow())?,
        };

        major
            .checked_mul(Self::MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Amount)
            .ok_or_else(overflow)
    }
}

/// Customer account number: 11 decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNo(String);

impl AccountNo {
    pub const LEN: usize = 11;

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let digits: String = (0..Self::LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(digits)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != Self::LEN || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(LotteryError::InvalidAccountNumber(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNo {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-ordered bet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(Uuid);

impl BetId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Time-ordered draw identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawId(Uuid);

impl DrawId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DrawId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse() {
        assert_eq!("100".parse::<Amount>().unwrap(), Amount::from_major(100));
        assert_eq!("100.5".parse::<Amount>().unwrap(), Amount::from_minor(10050));
        assert_eq!("0.07".parse::<Amount>().unwrap(), Amount::from_minor(7));
        assert!("".parse::<Amount>().is_err());
        assert!("-5".parse::<Amount>().is_err());
        assert!("1.234".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!("99999999999999999999".parse::<Amount>().is_err());
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from_major(100900).to_string(), "100900.00");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
    }

    #[test]
    fn test_from_major_largest() {
        let largest = Amount::from_major(u32::MAX);
        assert_eq!(largest.to_minor(), u64::from(u32::MAX) * 100);
        assert_eq!(largest.to_string(), "4294967295.00");
    }

    #[test]
    fn test_account_no() {
        let mut rng = rand::thread_rng();
        let acct = AccountNo::generate(&mut rng);
        assert_eq!(acct.as_str().len(), AccountNo::LEN);
        assert_eq!(AccountNo::parse(acct.as_str()).unwrap(), acct);

        assert!(AccountNo::parse("1234").is_err());
        assert!(AccountNo::parse("1234567890a").is_err());
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = BetId::new();
        let second = BetId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }
}
