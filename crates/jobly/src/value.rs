//! Scalar values bound as statement parameters.
//!
//! [`SqlValue`] is the value type carried by update payloads, filter criteria and
//! rendered [`SqlFragment`](crate::SqlFragment)s. It is a closed set of scalars
//! (no arrays, no objects), and binds to whatever column type Postgres reports
//! for the placeholder it lands in.

use crate::error::{JoblyError, JoblyResult};
use bytes::BytesMut;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Serialize, Serializer};
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A scalar statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric values are integers, finite floats, and decimals.
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Int(_) | Self::Decimal(_) => true,
            Self::Float(v) => v.is_finite(),
            _ => false,
        }
    }

    /// Exact decimal view of a numeric value, used for comparing bounds.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(v) => Some(Decimal::from(*v)),
            Self::Float(v) => Decimal::from_f64(*v),
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Approximate float view of a numeric value, for bounds beyond `Decimal`'s range.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// The value as an `i64`, if it is a whole number in range.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => integral_f64(*v),
            Self::Decimal(v) if v.fract().is_zero() => v.to_i64(),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        Self::Int(v.into())
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for SqlValue {
    type Error = JoblyError;

    fn try_from(value: serde_json::Value) -> JoblyResult<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(JoblyError::invalid_input(format!(
                        "number out of range: {n}"
                    )))
                }
            }
            Value::String(s) => Ok(Self::Text(s)),
            Value::Array(_) => Err(JoblyError::invalid_input(
                "arrays are not accepted as field values",
            )),
            Value::Object(_) => Err(JoblyError::invalid_input(
                "objects are not accepted as field values",
            )),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Decimal(v) => Serialize::serialize(v, serializer),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql_checked(ty, out),
            Self::Int(v) => match *ty {
                Type::NUMERIC => Decimal::from(*v).to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ => int_to_sql(*v, ty, out),
            },
            Self::Float(v) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    let whole = integral_f64(*v)
                        .ok_or_else(|| format!("{v} is not a whole number"))?;
                    int_to_sql(whole, ty, out)
                }
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from_f64(*v)
                    .ok_or_else(|| format!("{v} cannot be represented as numeric"))?
                    .to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Self::Decimal(v) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    let whole = self
                        .as_integer()
                        .ok_or_else(|| format!("{v} is not a whole number"))?;
                    int_to_sql(whole, ty, out)
                }
                _ => v.to_sql_checked(ty, out),
            },
            // Decimal columns are commonly sent as strings ("0.05") by JSON clients.
            Self::Text(v) => match *ty {
                Type::NUMERIC => Decimal::from_str(v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// Bind an integer to whichever integer width the column has.
fn int_to_sql(
    v: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql_checked(ty, out),
        _ => v.to_sql_checked(ty, out),
    }
}

fn integral_f64(v: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; 2^63 is the first value out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (v.is_finite() && v.fract() == 0.0 && v >= -LIMIT && v < LIMIT).then(|| v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(SqlValue::try_from(json!(null)).unwrap(), SqlValue::Null);
        assert_eq!(SqlValue::try_from(json!(true)).unwrap(), SqlValue::Bool(true));
        assert_eq!(SqlValue::try_from(json!(32)).unwrap(), SqlValue::Int(32));
        assert_eq!(SqlValue::try_from(json!(0.5)).unwrap(), SqlValue::Float(0.5));
        assert_eq!(
            SqlValue::try_from(json!("Aliya")).unwrap(),
            SqlValue::Text("Aliya".into())
        );
    }

    #[test]
    fn json_containers_are_rejected() {
        assert!(SqlValue::try_from(json!([1, 2])).unwrap_err().is_invalid_input());
        assert!(SqlValue::try_from(json!({"a": 1})).unwrap_err().is_invalid_input());
    }

    #[test]
    fn numeric_classification() {
        assert!(SqlValue::Int(1).is_numeric());
        assert!(SqlValue::Decimal(Decimal::new(5, 2)).is_numeric());
        assert!(SqlValue::Float(1.5).is_numeric());
        assert!(!SqlValue::Float(f64::NAN).is_numeric());
        assert!(!SqlValue::Float(f64::INFINITY).is_numeric());
        assert!(!SqlValue::Text("60000".into()).is_numeric());
        assert!(!SqlValue::Null.is_numeric());
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(7_i32)), SqlValue::Int(7));
    }

    #[test]
    fn serializes_as_plain_json() {
        let values = vec![
            SqlValue::Text("Aliya".into()),
            SqlValue::Int(32),
            SqlValue::Null,
            SqlValue::Decimal(Decimal::new(5, 2)),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!(["Aliya", 32, null, "0.05"])
        );
    }

    #[test]
    fn int_binds_into_int4() {
        let mut buf = BytesMut::new();
        let res = SqlValue::Int(60000).to_sql_checked(&Type::INT4, &mut buf);
        assert!(matches!(res, Ok(IsNull::No)));
        assert_eq!(&buf[..], &60000_i32.to_be_bytes());
    }

    #[test]
    fn int_out_of_range_for_int2_errors() {
        let mut buf = BytesMut::new();
        assert!(SqlValue::Int(70000).to_sql_checked(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn text_binds_into_numeric_when_parseable() {
        let mut buf = BytesMut::new();
        assert!(
            SqlValue::Text("0.05".into())
                .to_sql_checked(&Type::NUMERIC, &mut buf)
                .is_ok()
        );
        let mut buf = BytesMut::new();
        assert!(
            SqlValue::Text("lots".into())
                .to_sql_checked(&Type::NUMERIC, &mut buf)
                .is_err()
        );
    }

    #[test]
    fn whole_float_and_decimal_bind_into_int4() {
        let mut buf = BytesMut::new();
        assert!(SqlValue::Float(10.0).to_sql_checked(&Type::INT4, &mut buf).is_ok());
        assert_eq!(&buf[..], &10_i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(
            SqlValue::Decimal(Decimal::new(200, 1))
                .to_sql_checked(&Type::INT4, &mut buf)
                .is_ok()
        );
        assert_eq!(&buf[..], &20_i32.to_be_bytes());
    }

    #[test]
    fn fractional_values_do_not_bind_into_integers() {
        let mut buf = BytesMut::new();
        assert!(SqlValue::Float(10.5).to_sql_checked(&Type::INT4, &mut buf).is_err());
        let mut buf = BytesMut::new();
        assert!(
            SqlValue::Decimal(Decimal::new(15, 1))
                .to_sql_checked(&Type::INT8, &mut buf)
                .is_err()
        );
    }

    #[test]
    fn integer_view() {
        assert_eq!(SqlValue::Float(-3.0).as_integer(), Some(-3));
        assert_eq!(SqlValue::Float(1e30).as_integer(), None);
        assert_eq!(SqlValue::Float(f64::NAN).as_integer(), None);
        assert_eq!(SqlValue::Decimal(Decimal::new(700, 2)).as_integer(), Some(7));
        assert_eq!(SqlValue::Text("7".into()).as_integer(), None);
    }

    #[test]
    fn null_binds_as_null() {
        let mut buf = BytesMut::new();
        let res = SqlValue::Null.to_sql_checked(&Type::TEXT, &mut buf);
        assert!(matches!(res, Ok(IsNull::Yes)));
    }
}
