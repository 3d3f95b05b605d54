use std::fmt;
use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// 約数探索の上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DivisorBound {
    /// `2..=n/2` を順に調べる
    Half,
    /// `i * i <= n` の範囲だけ調べる（判定結果は Half と同じ）
    #[default]
    Sqrt,
}

/// 素数判定器
///
/// 状態を持たない純粋な計算なので、同じ入力には常に同じ結果を返す。
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimalityChecker {
    bound: DivisorBound,
}

impl PrimalityChecker {
    pub fn new(bound: DivisorBound) -> Self {
        Self { bound }
    }

    pub fn bound(&self) -> DivisorBound {
        self.bound
    }

    /// `n` が素数かどうか。負数・0・1 はすべて false
    pub fn is_prime(&self, n: i64) -> bool {
        n >= 2 && self.smallest_divisor(n).is_none()
    }

    /// 2 から昇順に探索して最初に見つかった約数を返す
    ///
    /// 素数および `n < 2` の場合は `None`。
    pub fn smallest_divisor(&self, n: i64) -> Option<i64> {
        if n < 2 {
            return None;
        }

        match self.bound {
            DivisorBound::Half => {
                let mut i = 2;
                while i <= n / 2 {
                    if n % i == 0 {
                        return Some(i);
                    }
                    i += 1;
                }
                None
            }
            DivisorBound::Sqrt => {
                if n % 2 == 0 {
                    return if n == 2 { None } else { Some(2) };
                }
                // i * i はオーバーフローし得るので割り算で比較する
                let mut i = 3;
                while i <= n / i {
                    if n % i == 0 {
                        return Some(i);
                    }
                    i += 2;
                }
                None
            }
        }
    }

    pub fn classify(&self, n: i64) -> Classification {
        Classification {
            number: n,
            is_prime: self.is_prime(n),
        }
    }

    /// `[2, limit]` の素数を昇順で返す
    pub fn primes_up_to(&self, limit: i64) -> Vec<i64> {
        (2..=limit).filter(|&n| self.is_prime(n)).collect()
    }

    pub fn count_primes(&self, limit: i64) -> usize {
        (2..=limit).filter(|&n| self.is_prime(n)).count()
    }
}

/// デフォルト設定（Sqrt）での素数判定
pub fn is_prime(n: i64) -> bool {
    PrimalityChecker::default().is_prime(n)
}

pub fn classify(n: i64) -> Classification {
    PrimalityChecker::default().classify(n)
}

/// 判定結果。Display で判定文を出力する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub number: i64,
    pub is_prime: bool,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_prime {
            write!(f, "{} is a prime number.", self.number)
        } else {
            write!(f, "{} is not a prime number.", self.number)
        }
    }
}

/// CLI引数や標準入力の1行を整数に変換
pub fn parse_number(text: &str) -> Result<i64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    trimmed.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            InputError::OutOfRange(trimmed.to_string())
        }
        _ => InputError::NotAnInteger(trimmed.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 元の定義そのもの: `[2, n/2]` に約数が無ければ素数
    fn reference_is_prime(n: i64) -> bool {
        n > 1 && !(2..=n / 2).any(|i| n % i == 0)
    }

    #[test]
    fn test_known_values() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(!is_prime(4));
        assert!(is_prime(17));
        assert!(!is_prime(18));
        assert!(is_prime(997));
        assert!(!is_prime(1001));
    }

    #[test]
    fn test_negative_numbers_are_not_prime() {
        for n in [-1, -2, -3, -17, -997, i64::MIN] {
            assert!(!is_prime(n), "{n} should not be prime");
            assert!(!PrimalityChecker::new(DivisorBound::Half).is_prime(n));
        }
    }

    #[test]
    fn test_matches_reference_definition() {
        let half = PrimalityChecker::new(DivisorBound::Half);
        let sqrt = PrimalityChecker::new(DivisorBound::Sqrt);
        for n in -20..=2000 {
            let expected = reference_is_prime(n);
            assert_eq!(half.is_prime(n), expected, "half bound disagrees on {n}");
            assert_eq!(sqrt.is_prime(n), expected, "sqrt bound disagrees on {n}");
        }
    }

    #[test]
    fn test_smallest_divisor_is_same_for_both_bounds() {
        let half = PrimalityChecker::new(DivisorBound::Half);
        let sqrt = PrimalityChecker::new(DivisorBound::Sqrt);
        for n in 0..=1000 {
            assert_eq!(half.smallest_divisor(n), sqrt.smallest_divisor(n), "n = {n}");
        }
        assert_eq!(sqrt.smallest_divisor(91), Some(7));
        assert_eq!(sqrt.smallest_divisor(97), None);
        assert_eq!(sqrt.smallest_divisor(1), None);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        // i64::MAX = 7^2 * 73 * 127 * 337 * 92737 * 649657
        assert!(!is_prime(i64::MAX));
        assert_eq!(PrimalityChecker::default().smallest_divisor(i64::MAX), Some(7));
        assert!(is_prime(1_000_000_007));
        assert!(is_prime(4_294_967_291));
        assert!(!is_prime(4_294_967_297)); // 641 * 6700417
    }

    #[test]
    fn test_is_idempotent() {
        let checker = PrimalityChecker::default();
        for n in [0, 1, 2, 17, 18, 997, 7919] {
            let first = checker.is_prime(n);
            for _ in 0..3 {
                assert_eq!(checker.is_prime(n), first);
            }
        }
    }

    #[test]
    fn test_classification_sentence() {
        assert_eq!(classify(17).to_string(), "17 is a prime number.");
        assert_eq!(classify(18).to_string(), "18 is not a prime number.");
        assert_eq!(classify(-5).to_string(), "-5 is not a prime number.");
    }

    #[test]
    fn test_primes_up_to() {
        let checker = PrimalityChecker::default();
        let primes = checker.primes_up_to(30);
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(checker.primes_up_to(100).len(), 25);
        assert!(checker.primes_up_to(1).is_empty());
        assert!(checker.primes_up_to(-10).is_empty());
    }

    #[test]
    fn test_count_primes() {
        let checker = PrimalityChecker::default();
        assert_eq!(checker.count_primes(1000), 168);
        assert_eq!(checker.count_primes(2), 1);
        assert_eq!(checker.count_primes(0), 0);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("  997\n"), Ok(997));
        assert_eq!(parse_number("-3"), Ok(-3));
        assert_eq!(parse_number(""), Err(InputError::Empty));
        assert_eq!(parse_number("   \n"), Err(InputError::Empty));
        assert_eq!(
            parse_number("seven"),
            Err(InputError::NotAnInteger("seven".to_string()))
        );
        assert_eq!(
            parse_number("99999999999999999999"),
            Err(InputError::OutOfRange("99999999999999999999".to_string()))
        );
    }
}
