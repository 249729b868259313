use crate::{EnumShape, TypeName};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An error that can occur when converting a value into the requested type.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The value does not fit in the target type
    Overflow { value: String, target: String },

    /// The given string is not a valid representation of the target type
    InvalidFormat { value: String, target: String },

    /// The value does not name or number a variant of the enum
    UndefinedVariant { value: String, target: TypeName },

    /// There is no rule to convert between the two types
    Unsupported { from: String, to: String },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConversionError::Overflow { value, target } => {
                write!(f, "{} caused an overflow when converting to {}", value, target)
            }
            ConversionError::InvalidFormat { value, target } => {
                write!(f, "'{}' is not a valid {}", value, target)
            }
            ConversionError::UndefinedVariant { value, target } => {
                write!(f, "'{}' is not a defined value of enum {}", value, target)
            }
            ConversionError::Unsupported { from, to } => {
                write!(f, "cannot convert {} to {}", from, to)
            }
        }
    }
}

impl error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// The primitive types a scalar can be coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Date,
}

impl ScalarKind {
    /// The inclusive range of an integer kind
    fn int_range(self) -> Option<(i128, i128)> {
        match self {
            ScalarKind::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            ScalarKind::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            ScalarKind::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            ScalarKind::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            ScalarKind::U8 => Some((0, u8::MAX as i128)),
            ScalarKind::U16 => Some((0, u16::MAX as i128)),
            ScalarKind::U32 => Some((0, u32::MAX as i128)),
            ScalarKind::U64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// The name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A variant of a registered enum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: TypeName,
    name: TypeName,
    ordinal: i64,
}

impl EnumValue {
    /// Create an enum value of the given enum type
    pub fn new(ty: TypeName, name: TypeName, ordinal: i64) -> Self {
        EnumValue { ty, name, ordinal }
    }

    /// The enum type this variant belongs to
    pub fn type_name(&self) -> &TypeName {
        &self.ty
    }

    /// The variant name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant's numeric value
    pub fn ordinal(&self) -> i64 {
        self.ordinal
    }
}

/// A decoded primitive value.
///
/// Floats compare and hash by their bit pattern so that a scalar can key a
/// map.
///
/// ```
/// use graft::{Scalar, ScalarKind};
///
/// let v = Scalar::String(String::from("42"));
/// assert_eq!(v.convert(ScalarKind::U8).unwrap(), Scalar::U8(42));
/// ```
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Date(DateTime<Utc>),
    Enum(EnumValue),
}

impl Scalar {
    /// The primitive kind of the scalar. Enum variants have no primitive kind.
    pub fn kind(&self) -> Option<ScalarKind> {
        let kind = match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::String(_) => ScalarKind::String,
            Scalar::Date(_) => ScalarKind::Date,
            Scalar::Enum(_) => return None,
        };
        Some(kind)
    }

    /// The name of the scalar's type used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Scalar::Enum(x) => x.type_name().to_string(),
            x => x.kind().map(|k| k.name()).unwrap_or("enum").to_string(),
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::I8(x) => Some(x as i128),
            Scalar::I16(x) => Some(x as i128),
            Scalar::I32(x) => Some(x as i128),
            Scalar::I64(x) => Some(x as i128),
            Scalar::U8(x) => Some(x as i128),
            Scalar::U16(x) => Some(x as i128),
            Scalar::U32(x) => Some(x as i128),
            Scalar::U64(x) => Some(x as i128),
            _ => None,
        }
    }

    /// Convert the scalar into the given primitive kind. A scalar already of
    /// that kind is returned unchanged.
    pub fn convert(self, target: ScalarKind) -> Result<Scalar, ConversionError> {
        if self.kind() == Some(target) {
            return Ok(self);
        }

        if let Some((min, max)) = target.int_range() {
            let value = self.to_i128(target)?;
            if value < min || value > max {
                return Err(ConversionError::Overflow {
                    value: self.to_string(),
                    target: target.to_string(),
                });
            }

            return Ok(from_i128(value, target));
        }

        match target {
            ScalarKind::F64 => self.to_f64(target).map(Scalar::F64),
            ScalarKind::F32 => self.to_f64(target).map(|x| Scalar::F32(x as f32)),
            ScalarKind::Bool => self.to_bool(),
            ScalarKind::Char => self.to_char(),
            ScalarKind::String => Ok(Scalar::String(self.to_string())),
            ScalarKind::Date => self.to_date(),
            _ => Err(self.unsupported(target.name())),
        }
    }

    /// Convert the scalar into a variant of the given enum, by name
    /// (exact, then case-insensitive) or by defined ordinal.
    pub fn to_enum(self, shape: &EnumShape) -> Result<Scalar, ConversionError> {
        if let Scalar::Enum(ref x) = self {
            if x.type_name() == shape.name() {
                return Ok(self);
            }
        }

        let variant = match &self {
            Scalar::String(s) => match s.trim().parse::<i64>() {
                Ok(ordinal) => shape.by_ordinal(ordinal),
                Err(_) => shape.by_name(s.trim()),
            },
            x => match x.as_i128() {
                Some(value) => i64::try_from(value).ok().and_then(|o| shape.by_ordinal(o)),
                None => return Err(self.unsupported(shape.name())),
            },
        };

        variant.map(Scalar::Enum).ok_or_else(|| ConversionError::UndefinedVariant {
            value: self.to_string(),
            target: shape.name().clone(),
        })
    }

    fn unsupported(&self, to: &str) -> ConversionError {
        ConversionError::Unsupported {
            from: self.type_name(),
            to: to.to_string(),
        }
    }

    fn to_i128(&self, target: ScalarKind) -> Result<i128, ConversionError> {
        if let Some(x) = self.as_i128() {
            return Ok(x);
        }

        match self {
            Scalar::Bool(x) => Ok(*x as i128),
            Scalar::Char(x) => Ok(*x as u32 as i128),
            Scalar::F32(x) => float_to_i128(*x as f64).ok_or_else(|| self.overflow(target)),
            Scalar::F64(x) => float_to_i128(*x).ok_or_else(|| self.overflow(target)),
            Scalar::String(s) => s.trim().parse::<i128>().map_err(|_| self.invalid(target)),
            Scalar::Enum(x) => Ok(x.ordinal() as i128),
            _ => Err(self.unsupported(target.name())),
        }
    }

    fn to_f64(&self, target: ScalarKind) -> Result<f64, ConversionError> {
        if let Some(x) = self.as_i128() {
            return Ok(x as f64);
        }

        match self {
            Scalar::F32(x) => Ok(*x as f64),
            Scalar::F64(x) => Ok(*x),
            Scalar::Bool(x) => Ok(if *x { 1.0 } else { 0.0 }),
            Scalar::String(s) => s.trim().parse::<f64>().map_err(|_| self.invalid(target)),
            Scalar::Enum(x) => Ok(x.ordinal() as f64),
            _ => Err(self.unsupported(target.name())),
        }
    }

    fn to_bool(&self) -> Result<Scalar, ConversionError> {
        if let Some(x) = self.as_i128() {
            return Ok(Scalar::Bool(x != 0));
        }

        match self {
            Scalar::F32(x) => Ok(Scalar::Bool(*x != 0.0)),
            Scalar::F64(x) => Ok(Scalar::Bool(*x != 0.0)),
            Scalar::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(Scalar::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(Scalar::Bool(false))
                } else {
                    Err(self.invalid(ScalarKind::Bool))
                }
            }
            _ => Err(self.unsupported(ScalarKind::Bool.name())),
        }
    }

    fn to_char(&self) -> Result<Scalar, ConversionError> {
        if let Some(x) = self.as_i128() {
            return u32::try_from(x)
                .ok()
                .and_then(char::from_u32)
                .map(Scalar::Char)
                .ok_or_else(|| self.overflow(ScalarKind::Char));
        }

        match self {
            Scalar::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Scalar::Char(c)),
                    _ => Err(self.invalid(ScalarKind::Char)),
                }
            }
            _ => Err(self.unsupported(ScalarKind::Char.name())),
        }
    }

    fn to_date(&self) -> Result<Scalar, ConversionError> {
        match self {
            Scalar::String(s) => parse_date(s)
                .map(Scalar::Date)
                .ok_or_else(|| self.invalid(ScalarKind::Date)),
            _ => Err(self.unsupported(ScalarKind::Date.name())),
        }
    }

    fn overflow(&self, target: ScalarKind) -> ConversionError {
        ConversionError::Overflow {
            value: self.to_string(),
            target: target.to_string(),
        }
    }

    fn invalid(&self, target: ScalarKind) -> ConversionError {
        ConversionError::InvalidFormat {
            value: self.to_string(),
            target: target.to_string(),
        }
    }
}

#[inline]
fn from_i128(value: i128, target: ScalarKind) -> Scalar {
    // caller has range checked the value
    match target {
        ScalarKind::I8 => Scalar::I8(value as i8),
        ScalarKind::I16 => Scalar::I16(value as i16),
        ScalarKind::I32 => Scalar::I32(value as i32),
        ScalarKind::I64 => Scalar::I64(value as i64),
        ScalarKind::U8 => Scalar::U8(value as u8),
        ScalarKind::U16 => Scalar::U16(value as u16),
        ScalarKind::U32 => Scalar::U32(value as u32),
        _ => Scalar::U64(value as u64),
    }
}

/// Floats are rounded half to even before being narrowed to an integer
#[inline]
fn float_to_i128(value: f64) -> Option<i128> {
    if !value.is_finite() || value.abs() >= 1.0e38 {
        return None;
    }

    Some(value.round_ties_even() as i128)
}

/// Parses either an RFC 3339 timestamp or the `/Date(ms)/` form, where the
/// milliseconds may be followed by an ignored `+hhmm` / `-hhmm` offset.
pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Some(inner) = s.strip_prefix("/Date(").and_then(|x| x.strip_suffix(")/")) {
        let digits_end = inner
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map(|(i, _)| i)
            .unwrap_or(inner.len());
        let millis = inner[..digits_end].parse::<i64>().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }

    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|x| x.with_timezone(&Utc))
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::I8(a), Scalar::I8(b)) => a == b,
            (Scalar::I16(a), Scalar::I16(b)) => a == b,
            (Scalar::I32(a), Scalar::I32(b)) => a == b,
            (Scalar::I64(a), Scalar::I64(b)) => a == b,
            (Scalar::U8(a), Scalar::U8(b)) => a == b,
            (Scalar::U16(a), Scalar::U16(b)) => a == b,
            (Scalar::U32(a), Scalar::U32(b)) => a == b,
            (Scalar::U64(a), Scalar::U64(b)) => a == b,
            (Scalar::F32(a), Scalar::F32(b)) => a.to_bits() == b.to_bits(),
            (Scalar::F64(a), Scalar::F64(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Char(a), Scalar::Char(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Date(a), Scalar::Date(b)) => a == b,
            (Scalar::Enum(a), Scalar::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Bool(x) => x.hash(state),
            Scalar::I8(x) => x.hash(state),
            Scalar::I16(x) => x.hash(state),
            Scalar::I32(x) => x.hash(state),
            Scalar::I64(x) => x.hash(state),
            Scalar::U8(x) => x.hash(state),
            Scalar::U16(x) => x.hash(state),
            Scalar::U32(x) => x.hash(state),
            Scalar::U64(x) => x.hash(state),
            Scalar::F32(x) => x.to_bits().hash(state),
            Scalar::F64(x) => x.to_bits().hash(state),
            Scalar::Char(x) => x.hash(state),
            Scalar::String(x) => x.hash(state),
            Scalar::Date(x) => x.hash(state),
            Scalar::Enum(x) => x.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(x) => write!(f, "{}", x),
            Scalar::I8(x) => write!(f, "{}", x),
            Scalar::I16(x) => write!(f, "{}", x),
            Scalar::I32(x) => write!(f, "{}", x),
            Scalar::I64(x) => write!(f, "{}", x),
            Scalar::U8(x) => write!(f, "{}", x),
            Scalar::U16(x) => write!(f, "{}", x),
            Scalar::U32(x) => write!(f, "{}", x),
            Scalar::U64(x) => write!(f, "{}", x),
            Scalar::F32(x) => write!(f, "{}", x),
            Scalar::F64(x) => write!(f, "{}", x),
            Scalar::Char(x) => write!(f, "{}", x),
            Scalar::String(x) => f.write_str(x),
            Scalar::Date(x) => f.write_str(&x.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Scalar::Enum(x) => f.write_str(x.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    #[rstest]
    #[case(Scalar::I64(200), ScalarKind::U8, Scalar::U8(200))]
    #[case(Scalar::I64(-5), ScalarKind::I16, Scalar::I16(-5))]
    #[case(Scalar::F64(2.5), ScalarKind::I32, Scalar::I32(2))]
    #[case(Scalar::F64(3.5), ScalarKind::I32, Scalar::I32(4))]
    #[case(Scalar::I64(7), ScalarKind::F64, Scalar::F64(7.0))]
    #[case(Scalar::F64(0.5), ScalarKind::F32, Scalar::F32(0.5))]
    #[case(Scalar::String(" 12 ".into()), ScalarKind::U32, Scalar::U32(12))]
    #[case(Scalar::String("1.25".into()), ScalarKind::F64, Scalar::F64(1.25))]
    #[case(Scalar::String("TRUE".into()), ScalarKind::Bool, Scalar::Bool(true))]
    #[case(Scalar::I64(0), ScalarKind::Bool, Scalar::Bool(false))]
    #[case(Scalar::Bool(true), ScalarKind::I32, Scalar::I32(1))]
    #[case(Scalar::String("x".into()), ScalarKind::Char, Scalar::Char('x'))]
    #[case(Scalar::I64(65), ScalarKind::Char, Scalar::Char('A'))]
    #[case(Scalar::I64(65), ScalarKind::String, Scalar::String("65".into()))]
    #[case(Scalar::Bool(false), ScalarKind::String, Scalar::String("false".into()))]
    fn scalar_conversions(#[case] input: Scalar, #[case] kind: ScalarKind, #[case] expected: Scalar) {
        assert_eq!(input.convert(kind).unwrap(), expected);
    }

    #[test]
    fn scalar_overflow() {
        assert!(matches!(
            Scalar::I64(256).convert(ScalarKind::U8),
            Err(ConversionError::Overflow { .. })
        ));
        assert!(matches!(
            Scalar::I64(-1).convert(ScalarKind::U64),
            Err(ConversionError::Overflow { .. })
        ));
        assert!(matches!(
            Scalar::F64(f64::NAN).convert(ScalarKind::I64),
            Err(ConversionError::Overflow { .. })
        ));
        assert!(Scalar::F64(1e40).convert(ScalarKind::I64).is_err());
    }

    #[test]
    fn scalar_invalid_format() {
        assert!(matches!(
            Scalar::String("abc".into()).convert(ScalarKind::I32),
            Err(ConversionError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Scalar::String("yes".into()).convert(ScalarKind::Bool),
            Err(ConversionError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Scalar::String("ab".into()).convert(ScalarKind::Char),
            Err(ConversionError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn scalar_unsupported() {
        assert!(matches!(
            Scalar::I64(1).convert(ScalarKind::Date),
            Err(ConversionError::Unsupported { .. })
        ));
    }

    #[test]
    fn scalar_dates() {
        let expected = Utc.timestamp_millis_opt(1_234_567_890_000).unwrap();
        assert_eq!(parse_date("/Date(1234567890000)/"), Some(expected));
        assert_eq!(parse_date("/Date(1234567890000+0100)/"), Some(expected));
        assert_eq!(parse_date("2009-02-13T23:31:30Z"), Some(expected));
        assert_eq!(parse_date("/Date(abc)/"), None);

        let converted = Scalar::String("2009-02-13T23:31:30Z".into())
            .convert(ScalarKind::Date)
            .unwrap();
        assert_eq!(converted, Scalar::Date(expected));
        assert_eq!(converted.to_string(), "2009-02-13T23:31:30Z");
    }

    #[test]
    fn scalar_enum() {
        let shape = EnumShape::new("Color", [("Red", 0), ("Green", 1), ("Blue", 4)]);
        let blue = Scalar::String("blue".into()).to_enum(&shape).unwrap();
        assert_eq!(blue, Scalar::Enum(EnumValue::new("Color".into(), "Blue".into(), 4)));
        assert_eq!(Scalar::I64(1).to_enum(&shape).unwrap().to_string(), "Green");
        assert_eq!(Scalar::String("4".into()).to_enum(&shape).unwrap(), blue);
        assert!(matches!(
            Scalar::I64(2).to_enum(&shape),
            Err(ConversionError::UndefinedVariant { .. })
        ));
        assert!(matches!(
            Scalar::Bool(true).to_enum(&shape),
            Err(ConversionError::Unsupported { .. })
        ));
        assert_eq!(blue.clone().convert(ScalarKind::I32).unwrap(), Scalar::I32(4));
    }

    #[quickcheck]
    fn identity_when_kind_matches(x: i64, s: String, b: bool) -> bool {
        Scalar::I64(x).convert(ScalarKind::I64) == Ok(Scalar::I64(x))
            && Scalar::String(s.clone()).convert(ScalarKind::String) == Ok(Scalar::String(s))
            && Scalar::Bool(b).convert(ScalarKind::Bool) == Ok(Scalar::Bool(b))
    }

    #[quickcheck]
    fn float_identity_keeps_bits(x: f64) -> bool {
        match Scalar::F64(x).convert(ScalarKind::F64) {
            Ok(Scalar::F64(y)) => x.to_bits() == y.to_bits(),
            _ => false,
        }
    }
}
