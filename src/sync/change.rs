use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on a stored change percentage
const CHANGE_SCALE: u32 = 4;

/// Percent change from `previous` to `current`, rounded half-up to 4 decimal places
///
/// Returns `None` when `previous` is zero (or the arithmetic overflows).
pub fn change_percent(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }

    let mut pct = (current - previous)
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(CHANGE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(CHANGE_SCALE);

    Some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ten_percent_gain() {
        let pct = change_percent(dec!(100), dec!(110)).unwrap();
        assert_eq!(pct, dec!(10.0000));
        assert_eq!(pct.to_string(), "10.0000");
    }

    #[test]
    fn test_loss_and_repeating_fraction() {
        assert_eq!(change_percent(dec!(3), dec!(4)), Some(dec!(33.3333)));
        assert_eq!(change_percent(dec!(3), dec!(2)), Some(dec!(-33.3333)));
        assert_eq!(change_percent(dec!(50), dec!(50)), Some(dec!(0.0000)));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(change_percent(dec!(200), dec!(200.0001)), Some(dec!(0.0001)));
        assert_eq!(change_percent(dec!(200), dec!(199.9999)), Some(dec!(-0.0001)));
    }

    #[test]
    fn test_zero_previous_has_no_change() {
        assert_eq!(change_percent(Decimal::ZERO, dec!(10)), None);
    }
}
