//! Small numeric reducers for use inside [`Func`](crate::Func) closures.
//!
//! `sum` and `mean` skip non-numeric cells; `min` and `max` use the [`Value`] ordering.

use crate::value::Value;

pub fn sum(values: &[Value]) -> Value {
    Value::from(values.iter().filter_map(Value::as_f64).sum::<f64>())
}

/// Arithmetic mean, or null when there are no numbers.
pub fn mean(values: &[Value]) -> Value {
    let (total, n) = values
        .iter()
        .filter_map(Value::as_f64)
        .fold((0.0, 0usize), |(total, n), v| (total + v, n + 1));
    if n == 0 {
        Value::Null
    } else {
        Value::from(total / n as f64)
    }
}

pub fn count_non_null(values: &[Value]) -> Value {
    Value::from(values.iter().filter(|v| !v.is_null()).count())
}

pub fn min(values: &[Value]) -> Value {
    values
        .iter()
        .filter(|v| !v.is_null())
        .min()
        .cloned()
        .unwrap_or_default()
}

pub fn max(values: &[Value]) -> Value {
    values.iter().max().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reducers_skip_non_numbers() {
        let values = vec![Value::from(1), Value::Null, Value::from("x"), Value::from(3)];
        assert_eq!(sum(&values), Value::from(4));
        assert_eq!(mean(&values), Value::from(2));
        assert_eq!(count_non_null(&values), Value::from(3));
        assert_eq!(mean(&[Value::Null]), Value::Null);
    }

    #[test]
    fn min_ignores_nulls() {
        let values = vec![Value::Null, Value::from(5), Value::from(2)];
        assert_eq!(min(&values), Value::from(2));
        assert_eq!(max(&values), Value::from(5));
    }
}
