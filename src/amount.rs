//! Limits on monetary amounts and budget goals.

/// The largest magnitude accepted for an amount or goal, in currency units.
///
/// At this size every value is still exact to the cent and the sum of
/// millions of them fits in whole cents.
pub const MAX_AMOUNT: f64 = 1e13;

/// Whether `amount` is a finite number no larger in magnitude than [MAX_AMOUNT].
pub fn is_within_limit(amount: f64) -> bool {
    amount.is_finite() && amount.abs() <= MAX_AMOUNT
}

#[cfg(test)]
mod tests {
    use super::{MAX_AMOUNT, is_within_limit};

    #[test]
    fn accepts_up_to_the_maximum() {
        assert!(is_within_limit(MAX_AMOUNT));
        assert!(is_within_limit(-MAX_AMOUNT));
        assert!(is_within_limit(0.01));
    }

    #[test]
    fn rejects_beyond_the_maximum() {
        assert!(!is_within_limit(MAX_AMOUNT * 10.0));
        assert!(!is_within_limit(-1e300));
        assert!(!is_within_limit(f64::INFINITY));
        assert!(!is_within_limit(f64::NAN));
    }
}
