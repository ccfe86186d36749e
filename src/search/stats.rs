use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::dto::PriceStats;

/// Median of an ascending slice; the mean of the middle pair when even.
pub fn median(sorted: &[Decimal]) -> Option<Decimal> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO)
    }
}

/// Min, max, mean and median over ascending prices. Empty input yields all `None`.
pub fn price_summary(sorted: &[Decimal]) -> PriceStats {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return PriceStats::default();
    };
    let sum: Decimal = sorted.iter().copied().sum();
    let mean = sum / Decimal::from(sorted.len());

    PriceStats {
        min_price: first.to_f64(),
        max_price: last.to_f64(),
        average_price: mean.round_dp(2).to_f64(),
        median_price: median(sorted).and_then(|m| m.to_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(
            median(&[d(50), d(75), d(100), d(150)]),
            Some(Decimal::new(875, 1))
        );
        assert_eq!(median(&[d(50), d(75), d(100)]), Some(d(75)));
        assert_eq!(median(&[d(42)]), Some(d(42)));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn summary_over_prices() {
        let s = price_summary(&[d(50), d(75), d(100), d(150)]);
        assert_eq!(s.min_price, Some(50.0));
        assert_eq!(s.max_price, Some(150.0));
        assert_eq!(s.average_price, Some(93.75));
        assert_eq!(s.median_price, Some(87.5));
    }

    #[test]
    fn empty_summary_is_all_none() {
        assert_eq!(price_summary(&[]), PriceStats::default());
    }
}
