//! Rendering of command results.

use crate::lexer::Token;
use crate::value::Value;
use std::rc::Rc;

/// Turns a value into something friendlier to display, or returns `None` to leave it alone.
pub type OutputConverter = Rc<dyn Fn(&Value) -> Option<Value>>;

/// Wraps a closure as an [`OutputConverter`].
pub fn output_converter<F>(convert: F) -> OutputConverter
where
    F: Fn(&Value) -> Option<Value> + 'static,
{
    Rc::new(convert)
}

/// Output side of the conversion engine. Converters form a stack: the last one added runs first.
#[derive(Default, Clone)]
pub struct OutputConversion {
    converters: Vec<OutputConverter>,
}

impl OutputConversion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_converter(&mut self, converter: OutputConverter) {
        self.converters.push(converter);
    }

    pub fn remove_converter(&mut self, converter: &OutputConverter) -> bool {
        match self.converters.iter().position(|c| Rc::ptr_eq(c, converter)) {
            Some(index) => {
                self.converters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Runs every converter, last added first, each on the result of the previous one.
    pub fn convert_output(&self, value: &Value) -> Value {
        let mut converted = value.clone();
        for converter in self.converters.iter().rev() {
            if let Some(result) = converter(&converted) {
                converted = result;
            }
        }
        converted
    }
}

/// Sink for everything the shell displays.
pub trait Output {
    /// Displays a command result.
    fn output(&mut self, value: &Value, conversion: &OutputConversion);

    /// Displays a command header; `None` when the command has none.
    fn output_header(&mut self, text: Option<&str>);

    /// Reports an error caused by one token of the last line read.
    fn output_token_error(&mut self, token: &Token, message: &str);

    fn output_error(&mut self, error: &(dyn std::error::Error + 'static));
}

/// Lines displayed for a top-level command result.
///
/// The result is converted as a whole first. If it is still an array or collection, it is
/// flattened one level without a header and every element is converted again on its own; nested
/// containers get an `Array`/`Collection` header and are indented with tabs.
pub fn render_lines(value: &Value, conversion: &OutputConversion) -> Vec<String> {
    let mut lines = Vec::new();
    match conversion.convert_output(value) {
        Value::Array(items) | Value::Collection(items) => {
            for item in &items {
                render_nested(item, 0, conversion, &mut lines);
            }
        }
        other => render_converted(&other, 0, conversion, &mut lines),
    }
    lines
}

fn render_nested(
    value: &Value,
    indent: usize,
    conversion: &OutputConversion,
    lines: &mut Vec<String>,
) {
    render_converted(&conversion.convert_output(value), indent, conversion, lines);
}

fn render_converted(
    value: &Value,
    indent: usize,
    conversion: &OutputConversion,
    lines: &mut Vec<String>,
) {
    let tabs = "\t".repeat(indent);
    match value {
        Value::Array(items) => {
            lines.push(format!("{tabs}Array"));
            for item in items {
                render_nested(item, indent + 1, conversion, lines);
            }
        }
        Value::Collection(items) => {
            lines.push(format!("{tabs}Collection"));
            for item in items {
                render_nested(item, indent + 1, conversion, lines);
            }
        }
        Value::Error(error) => {
            lines.push(format!("{tabs}{error}"));
            lines.extend(error_trace(error).into_iter().map(|line| format!("{tabs}{line}")));
        }
        other => lines.push(format!("{tabs}{other}")),
    }
}

/// Cause chain of an error, one `caused by:` line per cause.
pub fn error_trace(error: &anyhow::Error) -> Vec<String> {
    error
        .chain()
        .skip(1)
        .map(|cause| format!("\tcaused by: {cause}"))
        .collect()
}
