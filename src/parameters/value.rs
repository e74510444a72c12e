use std::{fmt, str::FromStr};

use thiserror::Error;

/// Declared type of a registry entry. Tags are the names the registry files
/// use: `QString`, `int`, `unsigned int`, `double`, `float`, `bool`, `choice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Text,
    Integer,
    Unsigned,
    Double,
    Float,
    Boolean,
    /// text encoded as `index:item;item;...`
    Choice,
}

impl ParamType {
    pub fn tag(&self) -> &'static str {
        match self {
            ParamType::Text => "QString",
            ParamType::Integer => "int",
            ParamType::Unsigned => "unsigned int",
            ParamType::Double => "double",
            ParamType::Float => "float",
            ParamType::Boolean => "bool",
            ParamType::Choice => "choice",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown parameter type {0:?}")]
pub struct UnknownParamType(pub String);

impl FromStr for ParamType {
    type Err = UnknownParamType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "QString" | "string" => ParamType::Text,
            "int" => ParamType::Integer,
            "unsigned int" | "uint" => ParamType::Unsigned,
            "double" => ParamType::Double,
            "float" => ParamType::Float,
            "bool" => ParamType::Boolean,
            "choice" => ParamType::Choice,
            _ => return Err(UnknownParamType(s.to_owned())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i32),
    Unsigned(u32),
    Double(f64),
    Boolean(bool),
}

impl ParamValue {
    /// Parses the textual form of a value of type `ty`.
    pub fn parse(ty: ParamType, s: &str) -> Option<Self> {
        let s_trim = s.trim();
        Some(match ty {
            ParamType::Text | ParamType::Choice => ParamValue::Text(s.to_owned()),
            ParamType::Integer => ParamValue::Integer(s_trim.parse().ok()?),
            ParamType::Unsigned => ParamValue::Unsigned(s_trim.parse().ok()?),
            ParamType::Double | ParamType::Float => ParamValue::Double(s_trim.parse().ok()?),
            ParamType::Boolean => ParamValue::Boolean(match s_trim {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return None,
            }),
        })
    }

    /// Converts the value to the variant `ty` stores, saturating numbers that
    /// do not fit.
    pub fn coerce(self, ty: ParamType) -> Self {
        match (ty, self) {
            (ParamType::Text | ParamType::Choice, ParamValue::Text(s)) => ParamValue::Text(s),
            (ParamType::Text | ParamType::Choice, other) => ParamValue::Text(other.to_string()),
            (ParamType::Integer, ParamValue::Integer(v)) => ParamValue::Integer(v),
            (ParamType::Integer, other) => ParamValue::Integer(
                other.to_i64().clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            ),
            (ParamType::Unsigned, ParamValue::Unsigned(v)) => ParamValue::Unsigned(v),
            (ParamType::Unsigned, other) => {
                ParamValue::Unsigned(other.to_i64().clamp(0, u32::MAX as i64) as u32)
            }
            (ParamType::Double | ParamType::Float, other) => ParamValue::Double(other.to_f64()),
            (ParamType::Boolean, other) => ParamValue::Boolean(other.to_bool()),
        }
    }

    /// Integer view of the value; text that is not a number reads as 0.
    pub fn to_i64(&self) -> i64 {
        match self {
            ParamValue::Text(s) => s.trim().parse().unwrap_or(0),
            ParamValue::Integer(v) => *v as i64,
            ParamValue::Unsigned(v) => *v as i64,
            ParamValue::Double(v) => *v as i64,
            ParamValue::Boolean(v) => *v as i64,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            ParamValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            ParamValue::Integer(v) => *v as f64,
            ParamValue::Unsigned(v) => *v as f64,
            ParamValue::Double(v) => *v,
            ParamValue::Boolean(v) => *v as i64 as f64,
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            ParamValue::Text(s) => !matches!(s.trim(), "" | "0" | "false"),
            ParamValue::Boolean(v) => *v,
            other => other.to_f64() != 0.0,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Unsigned(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_owned())
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Unsigned(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

/// An enumerated choice and its registry encoding `index:item;item;...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub index: usize,
    pub items: Vec<String>,
}

impl Choice {
    pub const SEPARATOR: char = ';';

    /// Whether a text value is meant to be shown as a choice list.
    pub fn is_choice(text: &str) -> bool {
        text.contains(Self::SEPARATOR)
    }

    /// Lenient decoding: a missing or unreadable index selects the first
    /// item, an index past the end selects the last one.
    pub fn decode(text: &str) -> Self {
        let (index, list) = match text.split_once(':') {
            Some((index, list)) => (index.trim().parse().unwrap_or(0), list),
            None => (0, text),
        };
        let items: Vec<String> = list.split(Self::SEPARATOR).map(str::to_owned).collect();
        Self {
            index: index.min(items.len().saturating_sub(1)),
            items,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.index).map(String::as_str)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.items.join(";"))
    }
}
