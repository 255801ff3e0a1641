//! Leaf coercion for scalar types

use crate::ast;
use crate::execution::JsonValue;
use crate::execution::Undefined;
use std::sync::Arc;

/// The coercion contract of a scalar type.
///
/// Built-in scalars are provided. Custom scalars declared in SDL must be given
/// an implementation with [`SchemaBuilder::scalar`][crate::schema::SchemaBuilder::scalar].
pub trait Scalar: Send + Sync + 'static {
    /// Converts a resolved value into its response representation.
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError>;

    /// Converts a JSON variable value into the internal representation given to resolvers.
    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError>;

    /// Converts a literal from a document.
    ///
    /// Never called with `null` or a variable reference: those are handled by the caller.
    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined>;
}

/// A value that a scalar could not coerce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CoercionError {
    pub message: String,
}

impl CoercionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

macro_rules! coercion_error {
    ($($arg: tt)+) => {
        return Err(CoercionError::new(format!($($arg)+)))
    };
}

pub(crate) fn built_in_scalars() -> [(&'static str, Arc<dyn Scalar>); 5] {
    [
        ("Int", Arc::new(IntScalar)),
        ("Float", Arc::new(FloatScalar)),
        ("String", Arc::new(StringScalar)),
        ("Boolean", Arc::new(BooleanScalar)),
        ("ID", Arc::new(IdScalar)),
    ]
}

struct IntScalar;
struct FloatScalar;
struct StringScalar;
struct BooleanScalar;
struct IdScalar;

/// A JSON number that is an integer, or a float without fractional part
fn as_integer(value: &JsonValue) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    let float = value.as_f64()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn to_i32(value: &JsonValue, int: i64) -> Result<JsonValue, CoercionError> {
    match i32::try_from(int) {
        Ok(int) => Ok(int.into()),
        Err(_) => coercion_error!("Int cannot represent non 32-bit signed integer value: {value}"),
    }
}

impl Scalar for IntScalar {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::Bool(b) => Ok(i32::from(*b).into()),
            JsonValue::Number(_) => match as_integer(value) {
                Some(int) => to_i32(value, int),
                None => coercion_error!("Int cannot represent non-integer value: {value}"),
            },
            JsonValue::String(s) => match s.as_str().trim().parse::<i64>() {
                Ok(int) => to_i32(value, int),
                Err(_) => coercion_error!("Int cannot represent non-integer value: {value}"),
            },
            _ => coercion_error!("Int cannot represent non-integer value: {value}"),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::Number(_) => match as_integer(value) {
                Some(int) => to_i32(value, int),
                None => coercion_error!("Int cannot represent non-integer value: {value}"),
            },
            _ => coercion_error!("Int cannot represent non-integer value: {value}"),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        match value {
            ast::Value::Int(int) => int.try_to_i32().map(Into::into).map_err(|_| Undefined),
            _ => Err(Undefined),
        }
    }
}

impl Scalar for FloatScalar {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        let float = match value {
            JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.as_str().trim().parse::<f64>().ok(),
            _ => None,
        };
        match float {
            Some(float) if float.is_finite() => Ok(float.into()),
            _ => coercion_error!("Float cannot represent non numeric value: {value}"),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value.as_f64() {
            Some(float) if value.is_number() && float.is_finite() => Ok(float.into()),
            _ => coercion_error!("Float cannot represent non numeric value: {value}"),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        let float = match value {
            ast::Value::Int(int) => int.try_to_f64(),
            ast::Value::Float(float) => float.try_to_f64(),
            _ => return Err(Undefined),
        };
        float.map(Into::into).map_err(|_| Undefined)
    }
}

impl Scalar for StringScalar {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::String(_) => Ok(value.clone()),
            JsonValue::Bool(_) | JsonValue::Number(_) => Ok(value.to_string().into()),
            _ => coercion_error!("String cannot represent value: {value}"),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::String(_) => Ok(value.clone()),
            _ => coercion_error!("String cannot represent a non string value: {value}"),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        match value {
            ast::Value::String(s) => Ok(s.as_str().into()),
            _ => Err(Undefined),
        }
    }
}

impl Scalar for BooleanScalar {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::Bool(_) => Ok(value.clone()),
            JsonValue::Number(n) if n.as_f64().is_some_and(f64::is_finite) => {
                Ok((n.as_f64() != Some(0.0)).into())
            }
            _ => coercion_error!("Boolean cannot represent a non boolean value: {value}"),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::Bool(_) => Ok(value.clone()),
            _ => coercion_error!("Boolean cannot represent a non boolean value: {value}"),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        match value {
            ast::Value::Boolean(b) => Ok((*b).into()),
            _ => Err(Undefined),
        }
    }
}

impl Scalar for IdScalar {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::String(_) => Ok(value.clone()),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string().into()),
            _ => coercion_error!("ID cannot represent value: {value}"),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value {
            JsonValue::String(_) => Ok(value.clone()),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string().into()),
            _ => coercion_error!("ID cannot represent value: {value}"),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        match value {
            ast::Value::String(s) => Ok(s.as_str().into()),
            ast::Value::Int(int) => Ok(int.as_str().into()),
            _ => Err(Undefined),
        }
    }
}
