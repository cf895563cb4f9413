use std::{fmt, str::FromStr};

use alloy::primitives::{utils::parse_ether, U256};
use eyre::WrapErr;
use rand::Rng;

/// Number of decimal places transfer amounts are rounded to.
pub const AMOUNT_DECIMALS: u32 = 6;

const MICROS_PER_UNIT: u64 = 10u64.pow(AMOUNT_DECIMALS);
const WEI_PER_MICRO: u64 = 1_000_000_000_000;

/// Native token amount with a fixed precision of six decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(u64);

impl Amount {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> u64 {
        self.0
    }

    pub fn to_wei(self) -> U256 {
        U256::from(self.0) * U256::from(WEI_PER_MICRO)
    }

    /// Draws a uniformly distributed amount from the inclusive range.
    pub fn random(range: &AmountRange, rng: &mut impl Rng) -> Self {
        Self(rng.gen_range(range.min.micros()..=range.max.micros()))
    }
}

impl FromStr for Amount {
    type Err = eyre::Report;

    /// Parses a decimal ether string, rounding half up to six decimal places.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            eyre::bail!("Amount must not be negative: {s}");
        }

        let wei = parse_ether(s).wrap_err_with(|| format!("Invalid amount '{s}'"))?;
        let micros = (wei + U256::from(WEI_PER_MICRO / 2)) / U256::from(WEI_PER_MICRO);
        let micros = u64::try_from(micros).map_err(|_| eyre::eyre!("Amount is too large: {s}"))?;

        Ok(Self::from_micros(micros))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / MICROS_PER_UNIT,
            self.0 % MICROS_PER_UNIT
        )
    }
}

/// Inclusive bounds for randomly drawn transfer amounts. `min <= max` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountRange {
    min: Amount,
    max: Amount,
}

impl AmountRange {
    pub fn new(min: Amount, max: Amount) -> eyre::Result<Self> {
        if min > max {
            eyre::bail!("MIN_AMOUNT ({min}) must not exceed MAX_AMOUNT ({max})");
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> Amount {
        self.min
    }

    pub fn max(&self) -> Amount {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(amount("0.001").micros(), 1_000);
        assert_eq!(amount("0.01").micros(), 10_000);
        assert_eq!(amount(" 2.5 ").micros(), 2_500_000);
        assert_eq!(amount("0").micros(), 0);
    }

    #[test]
    fn rounds_to_six_decimals() {
        assert_eq!(amount("0.0000005").micros(), 1);
        assert_eq!(amount("0.0000004").micros(), 0);
        assert_eq!(amount("0.1234567").micros(), 123_457);
    }

    #[test]
    fn rejects_negative_and_malformed_amounts() {
        assert!("-0.1".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn displays_six_decimals() {
        assert_eq!(amount("0.01").to_string(), "0.010000");
        assert_eq!(amount("12.000042").to_string(), "12.000042");
    }

    #[test]
    fn converts_to_wei() {
        assert_eq!(Amount::from_micros(1).to_wei(), U256::from(1_000_000_000_000u64));
        assert_eq!(
            amount("1").to_wei(),
            U256::from(1_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn range_rejects_min_above_max() {
        assert!(AmountRange::new(amount("0.02"), amount("0.01")).is_err());
        assert!(AmountRange::new(amount("0.01"), amount("0.01")).is_ok());
    }

    #[test]
    fn random_amount_stays_within_range() {
        let range = AmountRange::new(amount("0.001"), amount("0.01")).unwrap();

        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drawn = Amount::random(&range, &mut rng);
            assert!(drawn >= range.min() && drawn <= range.max(), "{drawn}");
        }
    }

    #[test]
    fn random_amount_with_equal_bounds_is_constant() {
        let range = AmountRange::new(amount("0.005"), amount("0.005")).unwrap();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(Amount::random(&range, &mut rng), amount("0.005"));
        }
    }
}
