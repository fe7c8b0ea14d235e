//! Typed field values and the per-type-code decoder.

use crate::error::{Aa01Error, Result};
use crate::io::BoundedView;

/// Field type code, the fourth character of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// `1`: 8-bit integer
    U8,
    /// `2`: 16-bit integer
    U16,
    /// `4`: 32-bit integer
    U32,
    /// `8`: 64-bit integer
    U64,
    /// `A`: 16-bit size
    Size16,
    /// `B`: 32-bit size
    Size32,
    /// `P`: string with a 16-bit length prefix
    Text,
    /// `T`: 64-bit timestamp followed by 4 reserved bytes
    TimestampWithTrailer,
    /// `S`: 64-bit timestamp
    Timestamp,
}

impl FieldType {
    pub fn from_char(code: char) -> Option<Self> {
        match code {
            '1' => Some(FieldType::U8),
            '2' => Some(FieldType::U16),
            '4' => Some(FieldType::U32),
            '8' => Some(FieldType::U64),
            'A' => Some(FieldType::Size16),
            'B' => Some(FieldType::Size32),
            'P' => Some(FieldType::Text),
            'T' => Some(FieldType::TimestampWithTrailer),
            'S' => Some(FieldType::Timestamp),
            _ => None,
        }
    }

    /// Decode one value of this type from `view`, advancing past it.
    pub fn decode(self, view: &mut BoundedView) -> Result<FieldValue> {
        let value = match self {
            FieldType::U8 => FieldValue::Integer(view.read_u8()?.into()),
            FieldType::U16 => FieldValue::Integer(view.read_u16()?.into()),
            FieldType::U32 => FieldValue::Integer(view.read_u32()?.into()),
            FieldType::U64 => FieldValue::Integer(view.read_u64()?),
            FieldType::Size16 => FieldValue::Size(view.read_u16()?.into()),
            FieldType::Size32 => FieldValue::Size(view.read_u32()?.into()),
            FieldType::Text => {
                let len = view.read_u16()?;
                let bytes = view.read(len.into())?;
                FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            FieldType::TimestampWithTrailer => {
                let time = view.read_u64()?;
                view.skip(4)?;
                FieldValue::Timestamp(time)
            }
            FieldType::Timestamp => FieldValue::Timestamp(view.read_u64()?),
        };
        Ok(value)
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(u64),
    Size(u64),
    Text(String),
    Timestamp(u64),
}

impl FieldValue {
    /// Integers and sizes both serve numeric fields.
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            FieldValue::Integer(v) | FieldValue::Size(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<u64> {
        match self {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Single-character fields are stored either as one byte or as a string.
    pub fn as_char(&self) -> Option<char> {
        match self {
            FieldValue::Integer(v) => u8::try_from(*v).ok().map(char::from),
            FieldValue::Text(v) => v.chars().next(),
            _ => None,
        }
    }
}

/// Decode the value for type code `code` at the view's cursor.
///
/// Fails with [`Aa01Error::UnknownFieldType`] for codes outside the table,
/// reporting `tag_offset` as the location.
pub fn decode_value(code: char, view: &mut BoundedView, tag_offset: u64) -> Result<FieldValue> {
    let Some(field_type) = FieldType::from_char(code) else {
        return Err(Aa01Error::UnknownFieldType {
            offset: tag_offset,
            code,
        });
    };
    field_type.decode(view)
}
