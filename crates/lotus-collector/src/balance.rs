use crate::{Error, Result};
use lotus_api::types::TokenAmount;

/// Sum wallet balances in attoFIL without leaving decimal arithmetic.
///
/// Addition is commutative and associative, so the order the wallet
/// addresses arrive in is irrelevant. An empty input yields zero.
pub fn reduce(balances: impl IntoIterator<Item = TokenAmount>) -> TokenAmount {
    balances
        .into_iter()
        .fold(TokenAmount::zero(), TokenAmount::saturating_add)
}

/// Render the reduced total as whole FIL for a sink that only takes f64.
///
/// Goes through the decimal-string form rather than converting the mantissa
/// directly, so the conversion stays auditable and deterministic. A parse
/// failure here means the upstream balance data is corrupt and is escalated
/// rather than zeroed.
pub fn to_display_unit(total: &TokenAmount) -> Result<f64> {
    let unitless = total.to_fil_string();
    unitless
        .parse::<f64>()
        .map_err(|_| Error::Conversion { value: unitless })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atto(s: &str) -> TokenAmount {
        s.parse().unwrap()
    }

    #[test]
    fn reduce_of_empty_is_zero() {
        let total = reduce(Vec::new());
        assert_eq!(total, TokenAmount::zero());
        assert_eq!(to_display_unit(&total).unwrap(), 0.0);
    }

    #[test]
    fn reduce_is_permutation_invariant() {
        let a = atto("1000000000000000000");
        let b = atto("2500000000000000000");
        let c = atto("17");

        let forward = reduce([a, b, c]);
        let backward = reduce([c, b, a]);
        let grouped = reduce([reduce([a, b]), c]);

        assert_eq!(forward, backward);
        assert_eq!(forward, grouped);
    }

    #[test]
    fn display_unit_converts_atto_to_fil() {
        let total = reduce([atto("1000000000000000000"), atto("2000000000000000000")]);
        assert_eq!(to_display_unit(&total).unwrap(), 3.0);
    }

    #[test]
    fn display_unit_round_trip_is_close() {
        use rust_decimal::prelude::ToPrimitive;

        // Documented tolerance: better than one part in 1e9.
        let total = reduce([atto("123456789123456789123456"), atto("987654321")]);
        let displayed = to_display_unit(&total).unwrap();
        let expected = total.atto().to_f64().unwrap() / 1e18;
        assert!(((displayed - expected) / expected).abs() < 1e-9);
    }

    #[test]
    fn large_balances_keep_precision_through_reduce() {
        // Summing in f64 first would already have lost the trailing digits.
        let total = reduce([atto("100000000000000000000000001"), atto("1")]);
        assert_eq!(total.atto().to_string(), "100000000000000000000000002");
    }
}
