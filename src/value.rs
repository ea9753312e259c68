//! Dynamically typed values passed to command handlers and produced by them.

use anyhow::{Result, anyhow};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// User-defined value that can travel through the shell, e.g. the result of a string constructor.
pub trait CustomValue: fmt::Debug + fmt::Display {
    /// Name of the custom type; must match the [`CustomType`] it is converted to.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Constructor building a custom value from the text of a single argument.
pub type StringConstructor = fn(&str) -> Result<Value>;

/// Type tag of a custom type, optionally constructible from a string.
#[derive(Clone, Copy)]
pub struct CustomType {
    name: &'static str,
    constructor: Option<StringConstructor>,
}

impl CustomType {
    /// A type without a string constructor; only custom input converters can produce it.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            constructor: None,
        }
    }

    pub const fn with_constructor(name: &'static str, constructor: StringConstructor) -> Self {
        Self {
            name,
            constructor: Some(constructor),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn constructor(&self) -> Option<StringConstructor> {
        self.constructor
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType").field("name", &self.name).finish()
    }
}

/// Type of a command parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    String,
    /// Accepts any value; text arguments are passed through unchanged.
    Object,
    Int,
    Long,
    Double,
    Float,
    Bool,
    /// Array of the element type. As the last parameter it makes the command variadic.
    Array(Box<ValueType>),
    Custom(CustomType),
}

impl ValueType {
    pub fn array_of(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ValueType::Array(_))
    }

    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            ValueType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Short type name used in command descriptions.
    pub fn simple_name(&self) -> String {
        match self {
            ValueType::String => "String".to_string(),
            ValueType::Object => "Object".to_string(),
            ValueType::Int => "int".to_string(),
            ValueType::Long => "long".to_string(),
            ValueType::Double => "double".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::Bool => "boolean".to_string(),
            ValueType::Array(element) => format!("{}[]", element.simple_name()),
            ValueType::Custom(custom) => custom.name().to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.simple_name())
    }
}

/// A value handled by the shell: converted arguments as well as command results.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Bool(bool),
    Array(Vec<Value>),
    /// Any other sequence; rendered like an array under a `Collection` header.
    Collection(Vec<Value>),
    /// An error shown as a value, e.g. the failure of a command.
    Error(Rc<anyhow::Error>),
    Custom(Rc<dyn CustomValue>),
}

impl Value {
    pub fn custom(value: impl CustomValue + 'static) -> Self {
        Value::Custom(Rc::new(value))
    }

    pub fn error(error: anyhow::Error) -> Self {
        Value::Error(Rc::new(error))
    }

    /// Whether this value can be passed where `target` is expected.
    pub fn is_assignable_to(&self, target: &ValueType) -> bool {
        match (self, target) {
            (_, ValueType::Object) => true,
            (Value::Str(_), ValueType::String)
            | (Value::Int(_), ValueType::Int)
            | (Value::Long(_), ValueType::Long)
            | (Value::Double(_), ValueType::Double)
            | (Value::Float(_), ValueType::Float)
            | (Value::Bool(_), ValueType::Bool) => true,
            (Value::Array(items), ValueType::Array(element)) => {
                items.iter().all(|item| item.is_assignable_to(element))
            }
            (Value::Custom(value), ValueType::Custom(custom)) => value.type_name() == custom.name(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(x) => Some(*x),
            Value::Int(x) => Some(i64::from(*x)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            Value::Float(x) => Some(f64::from(*x)),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    /// Items of an array or collection.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_custom<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(value) => value.as_any().downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Custom(a), Value::Custom(b)) => {
                a.type_name() == b.type_name() && a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

/// String form of scalars; containers list their items in brackets.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(x) => write!(f, "{x}"),
            Value::Long(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(x) => write!(f, "{x}"),
            Value::Array(items) | Value::Collection(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Error(error) => write!(f, "{error}"),
            Value::Custom(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Long(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl From<anyhow::Error> for Value {
    fn from(error: anyhow::Error) -> Self {
        Value::error(error)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Typed access to the converted arguments a command receives.
pub trait ArgumentsExt {
    fn arg(&self, index: usize) -> Result<&Value>;

    fn str_arg(&self, index: usize) -> Result<&str> {
        let value = self.arg(index)?;
        value
            .as_str()
            .ok_or_else(|| anyhow!("argument {} is not a string: {value}", index + 1))
    }

    fn i32_arg(&self, index: usize) -> Result<i32> {
        let value = self.arg(index)?;
        value
            .as_i32()
            .ok_or_else(|| anyhow!("argument {} is not an int: {value}", index + 1))
    }

    fn f64_arg(&self, index: usize) -> Result<f64> {
        let value = self.arg(index)?;
        value
            .as_f64()
            .ok_or_else(|| anyhow!("argument {} is not a number: {value}", index + 1))
    }

    fn bool_arg(&self, index: usize) -> Result<bool> {
        let value = self.arg(index)?;
        value
            .as_bool()
            .ok_or_else(|| anyhow!("argument {} is not a boolean: {value}", index + 1))
    }

    /// Items of an array argument, typically the variadic tail.
    fn array_arg(&self, index: usize) -> Result<&[Value]> {
        let value = self.arg(index)?;
        value
            .as_slice()
            .ok_or_else(|| anyhow!("argument {} is not an array: {value}", index + 1))
    }
}

impl ArgumentsExt for [Value] {
    fn arg(&self, index: usize) -> Result<&Value> {
        self.get(index)
            .ok_or_else(|| anyhow!("missing argument {}", index + 1))
    }
}
