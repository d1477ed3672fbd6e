use core::fmt::Display;

use serde::Serialize;

use crate::ThingString;

/// Tolerance under which two doubles count as the same reading.
pub const DOUBLE_PRECISION: f64 = 0.01;

/// Capacity given to string properties that do not declare one.
pub const DEFAULT_STRING_LENGTH: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Boolean,
    Double,
    Integer,
    Long,
    Byte,
    String,
}

impl PropertyType {
    /// Storage size in bytes for the fixed-size types.
    ///
    /// Strings carry their own declared capacity, so this returns `None` for them.
    pub const fn fixed_length(self) -> Option<u8> {
        match self {
            PropertyType::Double => Some(size_of::<f64>() as u8),
            PropertyType::Integer => Some(2),
            PropertyType::Long => Some(4),
            PropertyType::Byte | PropertyType::Boolean => Some(1),
            PropertyType::String => None,
        }
    }

    /// Name of the type in a JSON schema.
    pub const fn schema_type(self) -> &'static str {
        match self {
            PropertyType::Boolean => "boolean",
            PropertyType::Double | PropertyType::Integer | PropertyType::Long | PropertyType::Byte => {
                "number"
            }
            PropertyType::String => "string",
        }
    }

    /// Zero value for this type, as returned by getters of a property that was never set.
    pub fn zero(self) -> Value {
        match self {
            PropertyType::Boolean => Value::Boolean(false),
            PropertyType::Double => Value::Double(0.0),
            PropertyType::Integer => Value::Integer(0),
            PropertyType::Long => Value::Long(0),
            PropertyType::Byte => Value::Byte(0),
            PropertyType::String => Value::String(ThingString::default()),
        }
    }
}

/// Transport a property may be exposed on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    All,
    None,
    MqttOnly,
    WebthingOnly,
}

impl Visibility {
    /// Whether something with this visibility may be exposed on `channel`.
    pub fn allows(self, channel: Visibility) -> bool {
        self == Visibility::All || self == channel
    }
}

/// A stored property value. The variant always matches the owning property's type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Double(f64),
    Integer(i32),
    Long(u32),
    Byte(u8),
    String(ThingString),
}

impl Value {
    pub fn ty(&self) -> PropertyType {
        match self {
            Value::Boolean(_) => PropertyType::Boolean,
            Value::Double(_) => PropertyType::Double,
            Value::Integer(_) => PropertyType::Integer,
            Value::Long(_) => PropertyType::Long,
            Value::Byte(_) => PropertyType::Byte,
            Value::String(_) => PropertyType::String,
        }
    }

    /// Whether replacing `self` with `other` counts as a change.
    ///
    /// Doubles compare with [`DOUBLE_PRECISION`], everything else exactly.
    pub fn differs_from(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => !approx_eq(*a, *b, DOUBLE_PRECISION),
            (a, b) => a != b,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

/// `|a - b| < precision`, written without `abs` so it stays usable in `no_std`.
pub fn approx_eq(a: f64, b: f64, precision: f64) -> bool {
    let diff = a - b;
    diff < precision && -diff < precision
}

/// Parses the leading integer of `text`, ignoring anything after it.
///
/// Leading whitespace and a single sign are accepted. Text without a leading
/// digit parses as 0, and values past the `i64` range saturate.
pub fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut out: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        out = if negative {
            out.saturating_mul(10).saturating_sub(digit)
        } else {
            out.saturating_mul(10).saturating_add(digit)
        };
    }

    out
}

/// Parses the leading decimal number of `text`, ignoring anything after it.
///
/// Accepts an optional sign, digits, a fraction and an exponent. Text without a
/// leading number parses as 0.0.
pub fn parse_leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_lengths() {
        assert_eq!(PropertyType::Double.fixed_length(), Some(8));
        assert_eq!(PropertyType::Integer.fixed_length(), Some(2));
        assert_eq!(PropertyType::Long.fixed_length(), Some(4));
        assert_eq!(PropertyType::Byte.fixed_length(), Some(1));
        assert_eq!(PropertyType::Boolean.fixed_length(), Some(1));
        assert_eq!(PropertyType::String.fixed_length(), None);
    }

    #[test]
    fn visibility_channels() {
        assert!(Visibility::All.allows(Visibility::MqttOnly));
        assert!(Visibility::MqttOnly.allows(Visibility::MqttOnly));
        assert!(!Visibility::MqttOnly.allows(Visibility::WebthingOnly));
        assert!(!Visibility::None.allows(Visibility::MqttOnly));
    }

    #[test]
    fn double_tolerance() {
        assert!(!Value::Double(20.0).differs_from(&Value::Double(20.005)));
        assert!(!Value::Double(20.0).differs_from(&Value::Double(19.995)));
        assert!(Value::Double(20.0).differs_from(&Value::Double(20.02)));
        assert!(Value::Integer(1).differs_from(&Value::Integer(2)));
        assert!(!Value::String("a".into()).differs_from(&Value::String("a".into())));
    }

    #[test]
    fn lenient_ints() {
        assert_eq!(parse_leading_int("42"), 42);
        assert_eq!(parse_leading_int("  -17"), -17);
        assert_eq!(parse_leading_int("+8"), 8);
        assert_eq!(parse_leading_int("12abc"), 12);
        assert_eq!(parse_leading_int("abc"), 0);
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("-"), 0);
        assert_eq!(parse_leading_int("99999999999999999999"), i64::MAX);
    }

    #[test]
    fn lenient_floats() {
        assert_eq!(parse_leading_float("21.5"), 21.5);
        assert_eq!(parse_leading_float(" -0.25°C"), -0.25);
        assert_eq!(parse_leading_float(".5"), 0.5);
        assert_eq!(parse_leading_float("3."), 3.0);
        assert_eq!(parse_leading_float("1e3x"), 1000.0);
        assert_eq!(parse_leading_float("2e"), 2.0);
        assert_eq!(parse_leading_float("abc"), 0.0);
        assert_eq!(parse_leading_float("."), 0.0);
        assert_eq!(parse_leading_float("-"), 0.0);
    }

    #[test]
    fn value_json_shape() {
        assert_eq!(serde_json::to_value(Value::Integer(3)).unwrap(), serde_json::json!(3));
        assert_eq!(serde_json::to_value(Value::Boolean(true)).unwrap(), serde_json::json!(true));
        assert_eq!(
            serde_json::to_value(Value::String("on".into())).unwrap(),
            serde_json::json!("on")
        );
    }
}
