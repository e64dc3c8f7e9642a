//! 定价引擎 - 折扣价与账单总额的纯计算
//!
//! 舍入规则固定为「半进位、保留两位小数」(half-up, 2 dp)，且先对每个
//! 商品行舍入、再求和。任何重新实现都必须保持这一顺序，否则同一组
//! fixture 会产生不同的分位。

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half-up
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a discount specification like `"5%"` into a percentage.
///
/// An absent, empty or unparseable spec yields zero; a missing discount
/// must never fail a scan.
pub fn discount_percent(spec: &str) -> Decimal {
    let trimmed = spec.trim();
    let Some(number) = trimmed.strip_suffix('%') else {
        return Decimal::ZERO;
    };
    number.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Price after discount: `round2(original − original × percent / 100)`
pub fn final_price(original: Decimal, discount_spec: &str) -> Decimal {
    let percent = discount_percent(discount_spec);
    round2(original - original * percent / Decimal::ONE_HUNDRED)
}

/// Bill total: `round2(Σ final_price × qty)`
///
/// Inputs are the already-rounded per-line final prices.
pub fn total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, u32)>,
{
    let sum = lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, (price, qty)| {
            acc + price * Decimal::from(qty)
        });
    round2(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_ten_percent_off() {
        assert_eq!(final_price(d("100"), "10%"), d("90.00"));
    }

    #[test]
    fn test_five_percent_off() {
        assert_eq!(final_price(d("200"), "5%"), d("190.00"));
    }

    #[test]
    fn test_missing_or_zero_discount_keeps_price() {
        assert_eq!(final_price(d("42.50"), ""), d("42.50"));
        assert_eq!(final_price(d("42.50"), "0%"), d("42.50"));
        assert_eq!(final_price(d("42.50"), "abc"), d("42.50"));
        assert_eq!(final_price(d("42.50"), "12"), d("42.50"));
    }

    #[test]
    fn test_half_up_rounding_per_line() {
        // 33.335 rounds up to 33.34 before summation
        assert_eq!(final_price(d("33.335"), ""), d("33.34"));
        assert_eq!(final_price(d("99.99"), "33.33%"), d("66.66"));
    }

    #[test]
    fn test_total_fixture() {
        let lines = vec![(d("90.00"), 2u32), (d("50.00"), 1u32)];
        assert_eq!(total(lines), d("230.00"));
    }

    #[test]
    fn test_total_rounds_after_summation() {
        let lines = vec![(d("0.33"), 3u32)];
        assert_eq!(total(lines), d("0.99"));
    }
}
