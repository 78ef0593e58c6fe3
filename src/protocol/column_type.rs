//! MySQL column/field type identifiers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType(pub u8);

impl ColumnType {
    pub const DECIMAL: ColumnType = ColumnType(0x00);
    pub const TINY: ColumnType = ColumnType(0x01);
    pub const SHORT: ColumnType = ColumnType(0x02);
    pub const LONG: ColumnType = ColumnType(0x03);
    pub const FLOAT: ColumnType = ColumnType(0x04);
    pub const DOUBLE: ColumnType = ColumnType(0x05);
    pub const NULL: ColumnType = ColumnType(0x06);
    pub const TIMESTAMP: ColumnType = ColumnType(0x07);
    pub const LONGLONG: ColumnType = ColumnType(0x08);
    pub const INT24: ColumnType = ColumnType(0x09);
    pub const DATE: ColumnType = ColumnType(0x0A);
    pub const TIME: ColumnType = ColumnType(0x0B);
    pub const DATETIME: ColumnType = ColumnType(0x0C);
    pub const YEAR: ColumnType = ColumnType(0x0D);
    pub const VARCHAR: ColumnType = ColumnType(0x0F);
    pub const BIT: ColumnType = ColumnType(0x10);
    pub const JSON: ColumnType = ColumnType(0xF5);
    pub const NEWDECIMAL: ColumnType = ColumnType(0xF6);
    pub const ENUM: ColumnType = ColumnType(0xF7);
    pub const SET: ColumnType = ColumnType(0xF8);
    pub const TINY_BLOB: ColumnType = ColumnType(0xF9);
    pub const MEDIUM_BLOB: ColumnType = ColumnType(0xFA);
    pub const LONG_BLOB: ColumnType = ColumnType(0xFB);
    pub const BLOB: ColumnType = ColumnType(0xFC);
    pub const VAR_STRING: ColumnType = ColumnType(0xFD);
    pub const STRING: ColumnType = ColumnType(0xFE);
    pub const GEOMETRY: ColumnType = ColumnType(0xFF);

    /// Whether this column type is decoded as a length-encoded string in
    /// the binary row format.
    pub fn is_string_family(self) -> bool {
        matches!(
            self,
            Self::STRING
                | Self::VARCHAR
                | Self::VAR_STRING
                | Self::ENUM
                | Self::SET
                | Self::TINY_BLOB
                | Self::MEDIUM_BLOB
                | Self::LONG_BLOB
                | Self::BLOB
                | Self::GEOMETRY
                | Self::BIT
                | Self::DECIMAL
                | Self::NEWDECIMAL
        )
    }
}
