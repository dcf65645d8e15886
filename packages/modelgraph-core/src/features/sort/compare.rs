//! Natural ordering of plain values
//!
//! - nulls sort after every non-null value, in either argument position
//! - integers and floats compare numerically with each other
//! - strings compare number-tolerantly: digit runs compare by numeric value,
//!   other characters case-insensitively; strings that only differ in case
//!   or leading zeros are still distinct
//! - values of unrelated kinds order by kind

use std::cmp::Ordering;

use crate::shared::models::Value;

pub fn natural_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (a.as_float().unwrap_or_default(), b.as_float().unwrap_or_default());
            x.total_cmp(&y)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => compare_number_tolerant(x, y),
        (Value::List(xs), Value::List(ys)) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| natural_compare(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (
            Value::Record { type_name: tx, fields: fx },
            Value::Record { type_name: ty, fields: fy },
        ) => tx.cmp(ty).then_with(|| {
            fx.values()
                .zip(fy.values())
                .map(|(x, y)| natural_compare(x, y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| fx.len().cmp(&fy.len()))
        }),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::Str(_) => 2,
        Value::List(_) => 3,
        Value::Record { .. } => 4,
        Value::Null => 5,
    }
}

/// Number-tolerant string comparison that is zero only for equal strings
pub fn compare_number_tolerant(a: &str, b: &str) -> Ordering {
    let loose = compare_loose(a, b);
    if loose.is_ne() {
        loose
    } else {
        a.cmp(b)
    }
}

fn compare_loose(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let order = compare_digit_runs(&a[start_a..i], &b[start_b..j]);
            if order.is_ne() {
                return order;
            }
            continue;
        }
        let order = a[i].to_lowercase().cmp(b[j].to_lowercase());
        if order.is_ne() {
            return order;
        }
        i += 1;
        j += 1;
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn compare_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let trim = |run: &[char]| -> usize { run.iter().take_while(|c| **c == '0').count() };
    let (a, b) = (&a[trim(a)..], &b[trim(b)..]);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_number_tolerant_strings() {
        assert_eq!(compare_number_tolerant("a2", "a10"), Ordering::Less);
        assert_eq!(compare_number_tolerant("File10", "file9"), Ordering::Greater);
        assert_eq!(compare_number_tolerant("b", "a"), Ordering::Greater);
        assert_eq!(compare_number_tolerant("item", "item2"), Ordering::Less);
    }

    #[test]
    fn test_distinct_strings_never_compare_equal() {
        assert_ne!(compare_number_tolerant("a01", "a1"), Ordering::Equal);
        assert_ne!(compare_number_tolerant("A", "a"), Ordering::Equal);
        assert_eq!(compare_number_tolerant("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_nulls_last_in_both_positions() {
        let samples = [
            Value::Int(3),
            Value::Float(-1.5),
            Value::str("x"),
            Value::Bool(false),
            Value::List(vec![]),
        ];
        for value in &samples {
            assert_eq!(natural_compare(&Value::Null, value), Ordering::Greater, "{}", value);
            assert_eq!(natural_compare(value, &Value::Null), Ordering::Less, "{}", value);
        }
        assert_eq!(natural_compare(&Value::Null, &Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_mixed_numbers() {
        assert_eq!(natural_compare(&Value::Int(2), &Value::Float(2.5)), Ordering::Less);
        assert_eq!(natural_compare(&Value::Float(3.0), &Value::Int(2)), Ordering::Greater);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Int),
            (-1.0e6f64..1.0e6).prop_map(Value::Float),
            "[a-cA-C0-9]{0,6}".prop_map(Value::Str),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    proptest! {
        #[test]
        fn prop_antisymmetric(a in value_strategy(), b in value_strategy()) {
            prop_assert_eq!(natural_compare(&a, &b), natural_compare(&b, &a).reverse());
        }

        #[test]
        fn prop_strings_equal_only_when_identical(a in "[a-cA-C0-9]{0,6}", b in "[a-cA-C0-9]{0,6}") {
            prop_assert_eq!(compare_number_tolerant(&a, &b) == Ordering::Equal, a == b);
        }
    }
}
