use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, InstanceRef};

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    Callable(Callable),
    Instance(InstanceRef),
}

impl Value {
    /// `nil` and `false` are falsy; everything else (including `0` and `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "null",
            Value::Callable(_) => "function",
            Value::Instance(_) => "instance",
        }
    }

    /// Numeric view of the value.  Strings are parsed as floats.
    pub fn to_number(&self) -> Result<f64, String> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| format!("Can't convert string \"{}\" to a number.", s)),
            other => Err(format!("Operand must be a number, got {}.", other.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "null"),

            Value::Callable(c) => write!(f, "{}", c),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
        }
    }
}

/// Shortest‑form number printing: `3`, `2.5`, `+Inf`, `NaN`, `1e+06`.
///
/// Exponent form kicks in when the decimal exponent is below -4 or at least 6.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }

    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    // Rust's `{:e}` gives the shortest round‑tripping digits, e.g. `1.5e-7`.
    let raw: String = format!("{:e}", n);
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return n.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };

    if n != 0.0 && !(-4..6).contains(&exponent) {
        let sign: char = if exponent < 0 { '-' } else { '+' };

        return format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs());
    }

    if n.fract() == 0.0 {
        let mut buf = itoa::Buffer::new();
        let digits: &str = buf.format(n as i64);

        // -0 keeps its sign.
        return if n == 0.0 && n.is_sign_negative() {
            "-0".to_string()
        } else {
            digits.to_string()
        };
    }

    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn equality_never_mixes_types() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_eq!(Value::String("a".into()), Value::String("a".into()));
    }

    #[test]
    fn string_coercion() {
        assert_eq!(Value::String("2.5".into()).to_number(), Ok(2.5));
        assert!(Value::String("abc".into()).to_number().is_err());
        assert!(Value::Bool(true).to_number().is_err());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "+Inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-07");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn exponent_threshold() {
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1e6), "1e+06");
        assert_eq!(format_number(-1234567.0), "-1.234567e+06");
        assert_eq!(format_number(2.5e100), "2.5e+100");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "-0");
    }
}
