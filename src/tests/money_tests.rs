use rust_decimal::Decimal;

use crate::money::{Currency, Money};
use crate::tests::{dec, xaf};
use crate::LedgerError;

#[test]
fn decimal_addition_is_exact() {
    // The classic float trap: 0.10 + 0.20 must be exactly 0.30.
    let a = Money::new(dec("0.10"), Currency::Xaf).unwrap();
    let b = Money::new(dec("0.20"), Currency::Xaf).unwrap();
    assert_eq!(a.try_add(&b).unwrap(), Money::new(dec("0.30"), Currency::Xaf).unwrap());
}

#[test]
fn rejects_more_than_two_decimal_places() {
    let err = Money::new(dec("10.005"), Currency::Xaf).unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));
}

#[test]
fn half_up_rounding_to_minor_unit() {
    assert_eq!(
        Money::from_decimal_half_up(dec("849.995"), Currency::Xaf),
        Money::new(dec("850.00"), Currency::Xaf).unwrap()
    );
    assert_eq!(
        Money::from_decimal_half_up(dec("0.005"), Currency::Xaf),
        Money::new(dec("0.01"), Currency::Xaf).unwrap()
    );
    assert_eq!(
        Money::from_decimal_half_up(dec("0.004"), Currency::Xaf),
        Money::zero(Currency::Xaf)
    );
}

#[test]
fn minor_unit_round_trip() {
    let m = Money::from_minor_units(1_666_667, Currency::Xaf);
    assert_eq!(m.amount(), dec("16666.67"));
    assert_eq!(m.to_minor_units(), 1_666_667);
}

#[test]
fn cross_currency_arithmetic_is_rejected() {
    let a = xaf(100);
    let b = Money::new(Decimal::from(100), Currency::Eur).unwrap();
    assert!(matches!(
        a.try_add(&b),
        Err(LedgerError::CurrencyMismatch { .. })
    ));
    assert!(matches!(
        a.try_cmp(&b),
        Err(LedgerError::CurrencyMismatch { .. })
    ));
}

#[test]
fn serializes_amount_as_decimal_string() {
    let value = serde_json::to_value(xaf(50850)).unwrap();
    assert_eq!(value["amount"], serde_json::json!("50850.00"));
    assert_eq!(value["currency"], serde_json::json!("XAF"));
}

#[test]
fn comparison_and_sign_checks() {
    assert_eq!(
        xaf(100).try_cmp(&xaf(200)).unwrap(),
        std::cmp::Ordering::Less
    );
    assert!(xaf(1).is_positive());
    assert!(Money::zero(Currency::Xaf).is_zero());
    assert!(xaf(10).try_sub(&xaf(20)).unwrap().is_negative());
}
