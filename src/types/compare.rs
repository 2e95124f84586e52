//! Value comparison strategy
//!
//! Injected into the runtime by the type layer. Sorts, merge and expression
//! evaluation only ever compare scalars through this trait.

use std::cmp::Ordering;

use super::value::Value;

/// Total-order comparator over scalar values
pub trait ValueComparator: Send + Sync {
    /// Compare two values. Must be a total order.
    fn compare(&self, left: &Value, right: &Value) -> Ordering;
}

/// Built-in type services used when no type layer is plugged in.
///
/// Nulls sort low. Integers and floats compare numerically with each other.
/// Anything else falls back to the storage order.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTypes;

impl ValueComparator for DefaultTypes {
    fn compare(&self, left: &Value, right: &Value) -> Ordering {
        match (left, right) {
            (Value::Int(a), Value::Float(b)) => int_float_cmp(*a, *b),
            (Value::Float(a), Value::Int(b)) => int_float_cmp(*b, *a).reverse(),
            _ => left.key_cmp(right),
        }
    }
}

/// Exact comparison of an integer with a float, consistent with
/// `f64::total_cmp` between floats: -0.0 sorts below `Int(0)`, NaNs sort
/// beyond every integer on the side of their sign.
fn int_float_cmp(int: i64, float: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const TWO_63: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= TWO_63 {
        return Ordering::Less;
    }
    if float < -TWO_63 {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    // In range, so the conversion is exact
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => {
            let fraction = float - whole;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 || (float.is_sign_negative() && int == 0) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}
