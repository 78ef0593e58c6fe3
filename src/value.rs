//! Host ⇄ wire value mapping used by [`crate::statement::Statement`]
//! (binding parameters) and [`crate::result_set`] (decoding rows).

use crate::error::{protocol_err, Error, Result};
use crate::io::PacketReader;
use crate::protocol::ColumnType;

/// A value a caller can bind to a prepared-statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum MySqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Bytes(Vec<u8>),
}

impl MySqlValue {
    /// The `(type_id, unsigned_flag, encoded_body)` triple a bound
    /// parameter's binary-protocol type/value entry needs. `None` body
    /// means NULL: nothing
    /// is written beyond the type/flag byte pair, and the bit is also
    /// set in the parameter NULL bitmap by the caller.
    pub(crate) fn wire_encoding(&self) -> (ColumnType, bool, Option<Vec<u8>>) {
        match *self {
            MySqlValue::Null => (ColumnType::NULL, false, None),
            MySqlValue::Bool(b) => (ColumnType::TINY, false, Some(vec![b as u8])),
            MySqlValue::Int(v) if (0..0x8000).contains(&v) => {
                (ColumnType::SHORT, true, Some((v as i16).to_le_bytes().to_vec()))
            }
            MySqlValue::Int(v) => (
                ColumnType::LONGLONG,
                v >= 0,
                Some(v.to_le_bytes().to_vec()),
            ),
            MySqlValue::UInt(v) => (ColumnType::LONGLONG, true, Some(v.to_le_bytes().to_vec())),
            MySqlValue::Double(f) => (ColumnType::DOUBLE, false, Some(f.to_le_bytes().to_vec())),
            MySqlValue::Bytes(ref b) => {
                let mut builder = crate::io::PacketBuilder::new();
                builder.lenenc_bytes(b);
                (ColumnType::LONG_BLOB, false, Some(builder.into_vec()))
            }
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for MySqlValue {
            fn from(v: $t) -> Self { MySqlValue::Int(v as i64) }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for MySqlValue {
            fn from(v: $t) -> Self { MySqlValue::Int(v as i64) }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32);

impl From<u64> for MySqlValue {
    fn from(v: u64) -> Self {
        MySqlValue::UInt(v)
    }
}

impl From<bool> for MySqlValue {
    fn from(v: bool) -> Self {
        MySqlValue::Bool(v)
    }
}

impl From<f32> for MySqlValue {
    fn from(v: f32) -> Self {
        MySqlValue::Double(v as f64)
    }
}

impl From<f64> for MySqlValue {
    fn from(v: f64) -> Self {
        MySqlValue::Double(v)
    }
}

impl From<String> for MySqlValue {
    fn from(v: String) -> Self {
        MySqlValue::Bytes(v.into_bytes())
    }
}

impl From<&str> for MySqlValue {
    fn from(v: &str) -> Self {
        MySqlValue::Bytes(v.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for MySqlValue {
    fn from(v: Vec<u8>) -> Self {
        MySqlValue::Bytes(v)
    }
}

impl From<&[u8]> for MySqlValue {
    fn from(v: &[u8]) -> Self {
        MySqlValue::Bytes(v.to_vec())
    }
}

impl<T> From<Option<T>> for MySqlValue
where
    T: Into<MySqlValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(MySqlValue::Null, Into::into)
    }
}

/// A column value read back out of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum MySqlColumnValue {
    Null,
    Bytes(Vec<u8>),
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
}

impl MySqlColumnValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MySqlColumnValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            MySqlColumnValue::Signed(v) => Some(v),
            MySqlColumnValue::Unsigned(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MySqlColumnValue::Null)
    }
}

/// Decode one non-null column value from the binary row format, per its
/// type's decoding rules.
pub(crate) fn read_binary_column(
    r: &mut PacketReader<'_>,
    column_type: ColumnType,
    unsigned: bool,
) -> Result<MySqlColumnValue> {
    if column_type.is_string_family() {
        let bytes = r
            .bytes_lenenc()?
            .ok_or_else(|| protocol_err!("expected non-null string column body"))?;
        return Ok(MySqlColumnValue::Bytes(bytes.to_vec()));
    }

    Ok(match column_type {
        ColumnType::LONGLONG => {
            if unsigned {
                MySqlColumnValue::Unsigned(r.u64_le()?)
            } else {
                MySqlColumnValue::Signed(r.i64_le()?)
            }
        }
        ColumnType::LONG | ColumnType::INT24 => {
            if unsigned {
                MySqlColumnValue::Unsigned(u64::from(r.u32_le()?))
            } else {
                MySqlColumnValue::Signed(i64::from(r.i32_le()?))
            }
        }
        ColumnType::SHORT | ColumnType::YEAR => {
            if unsigned {
                MySqlColumnValue::Unsigned(u64::from(r.u16_le()?))
            } else {
                MySqlColumnValue::Signed(i64::from(r.i16_le()?))
            }
        }
        ColumnType::TINY => {
            if unsigned {
                MySqlColumnValue::Unsigned(u64::from(r.u8()?))
            } else {
                MySqlColumnValue::Signed(i64::from(r.i8()?))
            }
        }
        ColumnType::FLOAT => MySqlColumnValue::Float(r.f32_le()?),
        ColumnType::DOUBLE => MySqlColumnValue::Double(r.f64_le()?),
        ColumnType::NULL => MySqlColumnValue::Null,
        other => {
            return Err(Error::Usage(format!(
                "unsupported column type 0x{:02X} in binary row",
                other.0
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_encodes_as_tiny() {
        let (ty, unsigned, body) = MySqlValue::Bool(true).wire_encoding();
        assert_eq!(ty, ColumnType::TINY);
        assert!(!unsigned);
        assert_eq!(body.unwrap(), vec![1]);
    }

    #[test]
    fn small_nonnegative_int_encodes_as_short_unsigned() {
        let (ty, unsigned, body) = MySqlValue::Int(42).wire_encoding();
        assert_eq!(ty, ColumnType::SHORT);
        assert!(unsigned);
        assert_eq!(body.unwrap(), 42i16.to_le_bytes().to_vec());
    }

    #[test]
    fn negative_int_encodes_as_longlong_signed() {
        let (ty, unsigned, body) = MySqlValue::Int(-5).wire_encoding();
        assert_eq!(ty, ColumnType::LONGLONG);
        assert!(!unsigned);
        assert_eq!(body.unwrap(), (-5i64).to_le_bytes().to_vec());
    }

    #[test]
    fn large_int_encodes_as_longlong_unsigned() {
        let (ty, unsigned, body) = MySqlValue::Int(70_000).wire_encoding();
        assert_eq!(ty, ColumnType::LONGLONG);
        assert!(unsigned);
        assert_eq!(body.unwrap(), 70_000i64.to_le_bytes().to_vec());
    }

    #[test]
    fn null_has_no_body() {
        let (ty, _, body) = MySqlValue::Null.wire_encoding();
        assert_eq!(ty, ColumnType::NULL);
        assert!(body.is_none());
    }
}
