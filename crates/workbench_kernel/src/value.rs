//! Module return values.
//!
//! Modules return loosely-shaped values: tables, strings, tuples, dicts of
//! keyword arguments. [`ModuleValue`] is the closed set of shapes
//! `ProcessResult::coerce` accepts as input.

use std::fmt;

use serde_json::{Map, Value};

use crate::dataframe::DataFrame;
use crate::error::{KernelError, KernelResult};
use crate::process_result::ProcessResult;

#[derive(Debug, Clone)]
pub enum ModuleValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<ModuleValue>),
    List(Vec<ModuleValue>),
    /// String keys in insertion order
    Dict(Vec<(String, ModuleValue)>),
    Table(DataFrame),
    Result(Box<ProcessResult>),
    /// Anything without a JSON form; holds its type name
    Opaque(String),
}

impl ModuleValue {
    pub fn tuple(items: impl IntoIterator<Item = ModuleValue>) -> Self {
        ModuleValue::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = ModuleValue>) -> Self {
        ModuleValue::List(items.into_iter().collect())
    }

    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, ModuleValue)>) -> Self {
        ModuleValue::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Runtime type name, as quoted in bug-report messages.
    pub fn type_name(&self) -> &str {
        match self {
            ModuleValue::None => "null",
            ModuleValue::Bool(_) => "bool",
            ModuleValue::Int(_) => "int",
            ModuleValue::Float(_) => "float",
            ModuleValue::Str(_) => "str",
            ModuleValue::Tuple(_) => "tuple",
            ModuleValue::List(_) => "list",
            ModuleValue::Dict(_) => "dict",
            ModuleValue::Table(_) => "DataFrame",
            ModuleValue::Result(_) => "ProcessResult",
            ModuleValue::Opaque(name) => name,
        }
    }

    /// Falsy: `None`, `false`, zero, and empty strings and collections.
    pub fn is_truthy(&self) -> bool {
        match self {
            ModuleValue::None => false,
            ModuleValue::Bool(b) => *b,
            ModuleValue::Int(i) => *i != 0,
            ModuleValue::Float(f) => *f != 0.0,
            ModuleValue::Str(s) => !s.is_empty(),
            ModuleValue::Tuple(items) | ModuleValue::List(items) => !items.is_empty(),
            ModuleValue::Dict(entries) => !entries.is_empty(),
            ModuleValue::Table(_) | ModuleValue::Result(_) | ModuleValue::Opaque(_) => true,
        }
    }

    /// Value of `key` in a dict.
    pub fn get(&self, key: &str) -> Option<&ModuleValue> {
        match self {
            ModuleValue::Dict(entries) => entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModuleValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Plain JSON, or a `Type` error naming the first value that has none.
    pub fn to_json(&self) -> KernelResult<Value> {
        Ok(match self {
            ModuleValue::None => Value::Null,
            ModuleValue::Bool(b) => Value::Bool(*b),
            ModuleValue::Int(i) => Value::from(*i),
            ModuleValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| {
                    KernelError::type_error(format!("Out of range float value {} is not JSON serializable", f))
                })?,
            ModuleValue::Str(s) => Value::String(s.clone()),
            ModuleValue::Tuple(items) | ModuleValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(ModuleValue::to_json)
                    .collect::<KernelResult<Vec<_>>>()?,
            ),
            ModuleValue::Dict(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json()?);
                }
                Value::Object(map)
            }
            other => {
                return Err(KernelError::type_error(format!(
                    "Object of type {} is not JSON serializable",
                    other.type_name()
                )))
            }
        })
    }
}

impl fmt::Display for ModuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[ModuleValue]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            ModuleValue::None => f.write_str("None"),
            ModuleValue::Bool(true) => f.write_str("True"),
            ModuleValue::Bool(false) => f.write_str("False"),
            ModuleValue::Int(i) => write!(f, "{}", i),
            ModuleValue::Float(x) => write!(f, "{:?}", x),
            ModuleValue::Str(s) => write!(f, "{:?}", s),
            ModuleValue::Tuple(items) => {
                f.write_str("(")?;
                join(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            ModuleValue::List(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            ModuleValue::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
            ModuleValue::Table(table) => {
                write!(f, "<DataFrame {}x{}>", table.len(), table.width())
            }
            ModuleValue::Result(_) => f.write_str("<ProcessResult>"),
            ModuleValue::Opaque(name) => write!(f, "<{} object>", name),
        }
    }
}

impl From<&str> for ModuleValue {
    fn from(value: &str) -> Self {
        ModuleValue::Str(value.to_string())
    }
}

impl From<String> for ModuleValue {
    fn from(value: String) -> Self {
        ModuleValue::Str(value)
    }
}

impl From<bool> for ModuleValue {
    fn from(value: bool) -> Self {
        ModuleValue::Bool(value)
    }
}

impl From<i64> for ModuleValue {
    fn from(value: i64) -> Self {
        ModuleValue::Int(value)
    }
}

impl From<i32> for ModuleValue {
    fn from(value: i32) -> Self {
        ModuleValue::Int(value as i64)
    }
}

impl From<f64> for ModuleValue {
    fn from(value: f64) -> Self {
        ModuleValue::Float(value)
    }
}

impl From<DataFrame> for ModuleValue {
    fn from(value: DataFrame) -> Self {
        ModuleValue::Table(value)
    }
}

impl From<ProcessResult> for ModuleValue {
    fn from(value: ProcessResult) -> Self {
        ModuleValue::Result(Box::new(value))
    }
}

impl<T: Into<ModuleValue>> From<Option<T>> for ModuleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ModuleValue::None, Into::into)
    }
}

impl From<Value> for ModuleValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ModuleValue::None,
            Value::Bool(b) => ModuleValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ModuleValue::Int(i),
                None => ModuleValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ModuleValue::Str(s),
            Value::Array(items) => ModuleValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ModuleValue::Dict(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
