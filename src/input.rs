//! Conversion of argument text into typed values.

use crate::command::CommandDescriptor;
use crate::error::{Result, ShellError};
use crate::lexer::Token;
use crate::value::{Value, ValueType};
use std::rc::Rc;

/// Custom string-to-value conversion.
///
/// Returns `Ok(None)` when it does not know how to produce the requested type, and an error when
/// the text is invalid for a type it does handle.
pub type InputConverter = Rc<dyn Fn(&str, &ValueType) -> anyhow::Result<Option<Value>>>;

/// Wraps a closure as an [`InputConverter`].
pub fn input_converter<F>(convert: F) -> InputConverter
where
    F: Fn(&str, &ValueType) -> anyhow::Result<Option<Value>> + 'static,
{
    Rc::new(convert)
}

/// Input side of the conversion engine: custom converters first, then elementary types.
#[derive(Default, Clone)]
pub struct InputConversion {
    converters: Vec<InputConverter>,
}

impl InputConversion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_converter(&mut self, converter: InputConverter) {
        self.converters.push(converter);
    }

    /// Removes a converter previously added; returns whether it was present.
    pub fn remove_converter(&mut self, converter: &InputConverter) -> bool {
        match self.converters.iter().position(|c| Rc::ptr_eq(c, converter)) {
            Some(index) => {
                self.converters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Converts `text` to a value of type `target`.
    ///
    /// The first custom converter (in registration order) that returns a value wins; that value
    /// must be assignable to `target`.
    pub fn convert_input(&self, text: &str, target: &ValueType) -> Result<Value> {
        for converter in &self.converters {
            let converted = converter(text, target)
                .map_err(|e| ShellError::Conversion(format!("{e:#}")))?;
            if let Some(value) = converted {
                return if value.is_assignable_to(target) {
                    Ok(value)
                } else {
                    Err(ShellError::Conversion(format!(
                        "Registered converter returned {value:?}, which is not a {target}"
                    )))
                };
            }
        }
        convert_to_elementary_type(text, target)
    }

    /// Converts the arguments of a tokenized line for `command`.
    ///
    /// `tokens[0]` is the command name itself. The trailing tokens of a variadic command are
    /// collected into one array argument.
    pub fn convert_to_parameters(
        &self,
        tokens: &[Token],
        command: &CommandDescriptor,
    ) -> Result<Vec<Value>> {
        let specs = command.param_specs();
        let args = tokens.get(1..).unwrap_or_default();
        let fixed = if command.is_variadic() {
            specs.len() - 1
        } else {
            specs.len()
        };

        let mut parameters = Vec::with_capacity(specs.len());
        for (spec, token) in specs[..fixed].iter().zip(args) {
            parameters.push(self.convert_token(token, &spec.value_type)?);
        }

        if let Some(element) = specs.last().and_then(|spec| spec.value_type.element_type()) {
            let tail = args
                .get(fixed..)
                .unwrap_or_default()
                .iter()
                .map(|token| self.convert_token(token, element))
                .collect::<Result<Vec<_>>>()?;
            parameters.push(Value::Array(tail));
        }

        Ok(parameters)
    }

    fn convert_token(&self, token: &Token, target: &ValueType) -> Result<Value> {
        self.convert_input(token.text(), target)
            .map_err(|e| e.for_token(token))
    }
}

fn convert_to_elementary_type(text: &str, target: &ValueType) -> Result<Value> {
    fn parse<T: std::str::FromStr>(text: &str, target: &ValueType) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        text.trim().parse::<T>().map_err(|e| {
            ShellError::Conversion(format!("Can't convert {text:?} to {target}: {e}"))
        })
    }

    match target {
        ValueType::String | ValueType::Object => Ok(Value::Str(text.to_string())),
        ValueType::Int => parse(text, target).map(Value::Int),
        ValueType::Long => parse(text, target).map(Value::Long),
        ValueType::Double => parse(text, target).map(Value::Double),
        ValueType::Float => parse(text, target).map(Value::Float),
        // Anything but "true" is false.
        ValueType::Bool => Ok(Value::Bool(text.trim().eq_ignore_ascii_case("true"))),
        ValueType::Custom(custom) => match custom.constructor() {
            Some(constructor) => constructor(text).map_err(|e| {
                ShellError::Conversion(format!(
                    "Error instantiating {} using string {text:?}: {e:#}",
                    custom.name()
                ))
            }),
            None => Err(ShellError::Conversion(format!(
                "Can't convert string to {}",
                custom.name()
            ))),
        },
        ValueType::Array(_) => Err(ShellError::Conversion(format!(
            "Can't convert string to {target}"
        ))),
    }
}
