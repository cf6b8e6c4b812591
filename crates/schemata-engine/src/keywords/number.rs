//! Numeric keywords.
//!
//! `multipleOf` scales both operands by 10^d, where d is the number of
//! decimal digits of the divisor, and compares the scaled integers. A value
//! with more decimal digits than the divisor cannot be a multiple. When the
//! scaled operands leave the exactly representable `f64` range the check
//! falls back to "the quotient is a finite integer".

use std::cmp::Ordering;

use serde_json::{Number, Value};

use schemata_core::compare_numbers;

use super::KeywordCx;
use crate::error::{ErrorCode, ValidationError};

/// 2^53: integers below this magnitude are exact in `f64`.
const EXACT_F64: f64 = 9_007_199_254_740_992.0;

pub(super) fn maximum(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    bound(cx, "maximum", "exclusiveMaximum", Ordering::Greater, ErrorCode::MaximumError)
}

pub(super) fn minimum(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    bound(cx, "minimum", "exclusiveMinimum", Ordering::Less, ErrorCode::MinimumError)
}

pub(super) fn exclusive_maximum(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    exclusive_bound(cx, "exclusiveMaximum", Ordering::Greater, ErrorCode::MaximumError, "maximum")
}

pub(super) fn exclusive_minimum(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    exclusive_bound(cx, "exclusiveMinimum", Ordering::Less, ErrorCode::MinimumError, "minimum")
}

fn bound(
    cx: &KeywordCx<'_>,
    keyword: &str,
    exclusive_keyword: &str,
    violation: Ordering,
    code: ErrorCode,
) -> Vec<ValidationError> {
    let (Some(value), Some(Value::Number(limit))) = (cx.data.as_number(), cx.keyword(keyword)) else {
        return Vec::new();
    };
    // Draft 4: `exclusiveMaximum: true` turns `maximum` exclusive.
    let exclusive =
        cx.ctx.caps.boolean_exclusive_bounds() && cx.keyword(exclusive_keyword) == Some(&Value::Bool(true));
    match compare_numbers(value, limit) {
        Some(ordering) if ordering == violation || (exclusive && ordering == Ordering::Equal) => {
            vec![cx.error(code).with(keyword, limit.clone()).with("exclusive", exclusive)]
        }
        _ => Vec::new(),
    }
}

fn exclusive_bound(
    cx: &KeywordCx<'_>,
    keyword: &str,
    violation: Ordering,
    code: ErrorCode,
    label: &str,
) -> Vec<ValidationError> {
    let (Some(value), Some(Value::Number(limit))) = (cx.data.as_number(), cx.keyword(keyword)) else {
        return Vec::new();
    };
    match compare_numbers(value, limit) {
        Some(ordering) if ordering == violation || ordering == Ordering::Equal => {
            vec![cx.error(code).with(label, limit.clone()).with("exclusive", true)]
        }
        _ => Vec::new(),
    }
}

pub(super) fn multiple_of(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(value), Some(Value::Number(divisor))) = (cx.data.as_number(), cx.keyword("multipleOf")) else {
        return Vec::new();
    };
    if is_multiple_of(value, divisor) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MultipleOfError).with("multipleOf", divisor.clone())]
}

/// Whether `value` is an integral multiple of `divisor`.
pub(crate) fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        // `i64::MIN % -1` overflows; every integer is a multiple of -1.
        return d != 0 && v.checked_rem(d).map_or(true, |r| r == 0);
    }
    if let (Some(v), Some(d)) = (value.as_u64(), divisor.as_u64()) {
        return d != 0 && v % d == 0;
    }
    let (Some(v), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 || !v.is_finite() || !d.is_finite() {
        return false;
    }
    let digits = decimal_digits(divisor);
    if decimal_digits(value) > digits {
        return false;
    }
    let scale = 10f64.powi(digits as i32);
    let (scaled_value, scaled_divisor) = ((v * scale).round(), (d * scale).round());
    if scaled_value.abs() < EXACT_F64 && scaled_divisor.abs() < EXACT_F64 && scaled_divisor != 0.0 {
        return scaled_value % scaled_divisor == 0.0;
    }
    let quotient = v / d;
    quotient.is_finite() && quotient.fract() == 0.0
}

/// Number of digits after the decimal point in the shortest representation.
fn decimal_digits(n: &Number) -> u32 {
    let text = n.to_string();
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], text[at + 1..].parse::<i32>().unwrap_or(0)),
        None => (text.as_str(), 0),
    };
    let fraction = mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len() as i32);
    (fraction - exponent).max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, SchemaCompiler};
    use schemata_core::Draft;
    use serde_json::json;

    fn num(value: Value) -> Number {
        value.as_number().unwrap().clone()
    }

    fn multiple(value: Value, divisor: Value) -> bool {
        is_multiple_of(&num(value), &num(divisor))
    }

    #[test]
    fn test_decimal_digits() {
        assert_eq!(decimal_digits(&num(json!(3))), 0);
        assert_eq!(decimal_digits(&num(json!(0.01))), 2);
        assert_eq!(decimal_digits(&num(json!(1.5))), 1);
        assert_eq!(decimal_digits(&num(json!(1e-7))), 7);
        assert_eq!(decimal_digits(&num(json!(1.5e3))), 0);
    }

    #[test]
    fn test_multiple_of_integers() {
        assert!(multiple(json!(10), json!(5)));
        assert!(!multiple(json!(10), json!(3)));
        assert!(!multiple(json!(10), json!(0)));
        assert!(multiple(json!(u64::MAX), json!(5)));
    }

    #[test]
    fn test_multiple_of_decimal_divisors() {
        assert!(multiple(json!(0.3), json!(0.1)));
        assert!(multiple(json!(4.5), json!(1.5)));
        assert!(multiple(json!(19.99), json!(0.01)));
        assert!(multiple(json!(7), json!(0.5)));
        assert!(!multiple(json!(0.35), json!(0.1)));
    }

    #[test]
    fn test_more_decimals_than_divisor_fails() {
        assert!(!multiple(json!(0.0075), json!(0.001)));
        assert!(multiple(json!(0.0075), json!(0.0001)));
    }

    #[test]
    fn test_multiple_of_overflow_falls_back() {
        assert!(!multiple(json!(1e308), json!(0.123456789)));
        assert!(multiple(json!(1e300), json!(1e290)));
    }

    #[test]
    fn test_multiple_of_negative_one_at_i64_min() {
        assert!(multiple(json!(i64::MIN), json!(-1)));
        let root = compile(&json!({"multipleOf": -1})).unwrap();
        assert!(root.validate(&json!(i64::MIN)).is_empty());
        assert!(!root.is_valid(&json!(1.5)));
    }

    #[test]
    fn test_maximum_and_minimum() {
        let root = compile(&json!({"minimum": 1, "maximum": 3})).unwrap();
        assert!(root.is_valid(&json!(1)));
        assert!(root.is_valid(&json!(3.0)));
        let errors = root.validate(&json!(3.5));
        assert_eq!(errors[0].code, ErrorCode::MaximumError);
        assert_eq!(errors[0].data["maximum"], 3);
        assert_eq!(root.validate(&json!(0))[0].code, ErrorCode::MinimumError);
    }

    #[test]
    fn test_numeric_exclusive_bounds() {
        let root = compile(&json!({"exclusiveMinimum": 0, "exclusiveMaximum": 10})).unwrap();
        assert!(root.is_valid(&json!(5)));
        assert!(!root.is_valid(&json!(0)));
        assert!(!root.is_valid(&json!(10)));
    }

    #[test]
    fn test_draft4_boolean_exclusive_bounds() {
        let schema = json!({"maximum": 10, "exclusiveMaximum": true, "minimum": 0});
        let root = SchemaCompiler::new().draft(Draft::Draft4).compile(&schema).unwrap();
        assert!(!root.is_valid(&json!(10)));
        assert!(root.is_valid(&json!(9.9)));
        assert!(root.is_valid(&json!(0)));
        let errors = root.validate(&json!(10));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data["exclusive"], true);
    }

    #[test]
    fn test_draft6_ignores_boolean_exclusive() {
        let schema = json!({"maximum": 10, "exclusiveMaximum": true});
        let root = SchemaCompiler::new().draft(Draft::Draft6).compile(&schema).unwrap();
        assert!(root.is_valid(&json!(10)));
    }

    #[test]
    fn test_multiple_of_keyword() {
        let root = compile(&json!({"multipleOf": 0.01})).unwrap();
        assert!(root.is_valid(&json!(12.34)));
        let errors = root.validate(&json!(12.345));
        assert_eq!(errors[0].code, ErrorCode::MultipleOfError);
        assert!(root.is_valid(&json!("not a number")));
    }
}
