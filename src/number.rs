use std::fmt::Display;

/// A sized integer, as written by a numeric literal or produced by a host call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Width {
    Byte,
    Half,
    Word,
    Double,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::Byte => 8,
            Width::Half => 16,
            Width::Word => 32,
            Width::Double => 64,
        }
    }

    /// The narrowest width holding `bits` bits, saturating at 64.
    pub fn holding(bits: u32) -> Self {
        match bits {
            0..=8 => Width::Byte,
            9..=16 => Width::Half,
            17..=32 => Width::Word,
            _ => Width::Double,
        }
    }

    fn mask(self) -> u64 {
        match self {
            Width::Double => u64::MAX,
            _ => (1 << self.bits()) - 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberType {
    pub width: Width,
    pub signed: bool,
}

impl NumberType {
    pub const INT8: NumberType = NumberType::new(Width::Byte, true);
    pub const UINT8: NumberType = NumberType::new(Width::Byte, false);
    pub const INT16: NumberType = NumberType::new(Width::Half, true);
    pub const UINT16: NumberType = NumberType::new(Width::Half, false);
    pub const INT32: NumberType = NumberType::new(Width::Word, true);
    pub const UINT32: NumberType = NumberType::new(Width::Word, false);
    pub const INT64: NumberType = NumberType::new(Width::Double, true);
    pub const UINT64: NumberType = NumberType::new(Width::Double, false);

    pub const fn new(width: Width, signed: bool) -> Self {
        Self { width, signed }
    }

    /// Suffix letters that select this type unambiguously in a decimal literal.
    fn decimal_suffix(self) -> &'static str {
        match (self.width, self.signed) {
            (Width::Byte, true) => "ib",
            (Width::Byte, false) => "b",
            (Width::Half, true) => "h",
            (Width::Half, false) => "uh",
            (Width::Word, true) => "",
            (Width::Word, false) => "uw",
            (Width::Double, true) => "d",
            (Width::Double, false) => "ud",
        }
    }
}

impl Display for NumberType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.signed { "int" } else { "uint" };
        write!(f, "{}{}", prefix, self.width.bits())
    }
}

impl Number {
    pub fn number_type(&self) -> NumberType {
        match self {
            Number::I8(_) => NumberType::INT8,
            Number::U8(_) => NumberType::UINT8,
            Number::I16(_) => NumberType::INT16,
            Number::U16(_) => NumberType::UINT16,
            Number::I32(_) => NumberType::INT32,
            Number::U32(_) => NumberType::UINT32,
            Number::I64(_) => NumberType::INT64,
            Number::U64(_) => NumberType::UINT64,
        }
    }

    /// Reinterprets the low bits of `bits` as a value of `number_type`.
    ///
    /// Returns `None` when `bits` has set bits above the type's width.
    pub fn from_bits(number_type: NumberType, bits: u64) -> Option<Self> {
        if bits & !number_type.width.mask() != 0 {
            return None;
        }
        Some(match (number_type.width, number_type.signed) {
            (Width::Byte, true) => Number::I8(bits as u8 as i8),
            (Width::Byte, false) => Number::U8(bits as u8),
            (Width::Half, true) => Number::I16(bits as u16 as i16),
            (Width::Half, false) => Number::U16(bits as u16),
            (Width::Word, true) => Number::I32(bits as u32 as i32),
            (Width::Word, false) => Number::U32(bits as u32),
            (Width::Double, true) => Number::I64(bits as i64),
            (Width::Double, false) => Number::U64(bits),
        })
    }

    /// Builds `-magnitude` or `magnitude` in `number_type`, if representable.
    pub fn from_magnitude(number_type: NumberType, magnitude: u64, negative: bool) -> Option<Self> {
        let value = if negative {
            0i128 - i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        Self::from_i128(number_type, value)
    }

    fn from_i128(number_type: NumberType, value: i128) -> Option<Self> {
        Some(match (number_type.width, number_type.signed) {
            (Width::Byte, true) => Number::I8(value.try_into().ok()?),
            (Width::Byte, false) => Number::U8(value.try_into().ok()?),
            (Width::Half, true) => Number::I16(value.try_into().ok()?),
            (Width::Half, false) => Number::U16(value.try_into().ok()?),
            (Width::Word, true) => Number::I32(value.try_into().ok()?),
            (Width::Word, false) => Number::U32(value.try_into().ok()?),
            (Width::Double, true) => Number::I64(value.try_into().ok()?),
            (Width::Double, false) => Number::U64(value.try_into().ok()?),
        })
    }

    /// Negates in place of the same type, failing on overflow.
    pub fn checked_neg(self) -> Option<Self> {
        Self::from_i128(self.number_type(), -self.as_i128())
    }

    pub fn as_i128(&self) -> i128 {
        match *self {
            Number::I8(n) => n.into(),
            Number::U8(n) => n.into(),
            Number::I16(n) => n.into(),
            Number::U16(n) => n.into(),
            Number::I32(n) => n.into(),
            Number::U32(n) => n.into(),
            Number::I64(n) => n.into(),
            Number::U64(n) => n.into(),
        }
    }

    pub fn to_be_bytes(&self) -> Vec<u8> {
        match *self {
            Number::I8(n) => n.to_be_bytes().to_vec(),
            Number::U8(n) => n.to_be_bytes().to_vec(),
            Number::I16(n) => n.to_be_bytes().to_vec(),
            Number::U16(n) => n.to_be_bytes().to_vec(),
            Number::I32(n) => n.to_be_bytes().to_vec(),
            Number::U32(n) => n.to_be_bytes().to_vec(),
            Number::I64(n) => n.to_be_bytes().to_vec(),
            Number::U64(n) => n.to_be_bytes().to_vec(),
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = self.to_be_bytes();
        bytes.reverse();
        bytes
    }

    pub fn to_ne_bytes(&self) -> Vec<u8> {
        if cfg!(target_endian = "big") {
            self.to_be_bytes()
        } else {
            self.to_le_bytes()
        }
    }
}

/// Renders the canonical decimal literal: magnitude, suffix, then sign.
impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.as_i128();
        let sign = if value < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}",
            value.unsigned_abs(),
            self.number_type().decimal_suffix(),
            sign
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Number::I32(5).to_string(), "5");
        assert_eq!(Number::I32(-123).to_string(), "123-");
        assert_eq!(Number::I8(-5).to_string(), "5ib-");
        assert_eq!(Number::U8(255).to_string(), "255b");
        assert_eq!(Number::I64(i64::MIN).to_string(), "9223372036854775808d-");
        assert_eq!(Number::U64(u64::MAX).to_string(), "18446744073709551615ud");
    }

    #[test]
    fn test_from_bits_reinterprets() {
        assert_eq!(
            Number::from_bits(NumberType::INT8, 0xFF),
            Some(Number::I8(-1))
        );
        assert_eq!(
            Number::from_bits(NumberType::INT16, 0x8000),
            Some(Number::I16(i16::MIN))
        );
        assert_eq!(Number::from_bits(NumberType::UINT8, 0x100), None);
    }

    #[test]
    fn test_from_magnitude_bounds() {
        assert_eq!(
            Number::from_magnitude(NumberType::INT8, 128, true),
            Some(Number::I8(-128))
        );
        assert_eq!(Number::from_magnitude(NumberType::INT8, 128, false), None);
        assert_eq!(Number::from_magnitude(NumberType::UINT8, 1, true), None);
        assert_eq!(
            Number::from_magnitude(NumberType::UINT8, 0, true),
            Some(Number::U8(0))
        );
    }

    #[test]
    fn test_bytes() {
        assert_eq!(Number::U16(0x1234).to_be_bytes(), vec![0x12, 0x34]);
        assert_eq!(Number::U16(0x1234).to_le_bytes(), vec![0x34, 0x12]);
        assert_eq!(Number::I32(-1).to_be_bytes(), vec![0xFF; 4]);
        assert_eq!(Number::U8(7).to_ne_bytes(), vec![7]);
    }

    #[test]
    fn test_width_holding() {
        assert_eq!(Width::holding(4), Width::Byte);
        assert_eq!(Width::holding(12), Width::Half);
        assert_eq!(Width::holding(32), Width::Word);
        assert_eq!(Width::holding(68), Width::Double);
    }
}
