//! Host-side values exchanged with code-execution providers.
//!
//! Guest call arguments arrive as wasm numbers and provider results leave as
//! whatever the host language produced. `Value` sits between the two and
//! carries the loose numeric coercions a dynamically typed host applies when
//! a result is handed back to a typed wasm import.

use std::fmt;

/// A dynamically typed host value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Deliberately empty. Numerically 0.
    Null,
    /// Missing value, e.g. a body that produced nothing. Numerically NaN.
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// `Null` or `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Numeric view of the value.
    ///
    /// `Null` and the empty string are 0; `Undefined` and unparseable
    /// strings are NaN.
    #[expect(
        clippy::cast_precision_loss,
        reason = "large integers lose precision as they would in any float"
    )]
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Undefined => f64::NAN,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// 32-bit view: truncate, then wrap modulo 2^32. Non-finite values are 0.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "wrapping to 32 bits is the point"
    )]
    pub fn to_i32(&self) -> i32 {
        if let Value::Int(i) = self {
            return *i as i32;
        }
        let f = self.to_f64();
        if !f.is_finite() {
            return 0;
        }
        let wrapped = f.trunc().rem_euclid(4_294_967_296.0);
        wrapped as u32 as i32
    }

    /// 64-bit view: truncate and saturate. Non-finite values are 0.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int saturates"
    )]
    pub fn to_i64(&self) -> i64 {
        if let Value::Int(i) = self {
            return *i;
        }
        let f = self.to_f64();
        if f.is_finite() {
            f.trunc() as i64
        } else {
            0
        }
    }

    #[expect(clippy::cast_possible_truncation, reason = "narrowing to f32")]
    pub fn to_f32(&self) -> f32 {
        self.to_f64() as f32
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
