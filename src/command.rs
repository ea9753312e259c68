use crate::input::InputConverter;
use crate::output::OutputConverter;
use crate::shell::CommandContext;
use crate::value::{Value, ValueType};
use anyhow::Result;
use std::fmt;
use std::rc::Rc;

/// Callable behind a command.
///
/// Receives the converted arguments, one per parameter, the variadic tail collected into a single
/// [`Value::Array`]. An `Err` is a failure of the command itself; the shell displays it as the
/// command's result instead of aborting the session.
pub type Invoker = Rc<dyn Fn(&mut CommandContext<'_>, Vec<Value>) -> Result<Option<Value>>>;

/// Description of one parameter of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub position: usize,
    pub value_type: ValueType,
}

/// Everything a handler declares about one of its commands.
///
/// Name and abbreviation are derived from `identifier` unless given explicitly.
#[derive(Clone)]
pub struct CommandSpec {
    pub(crate) identifier: String,
    pub(crate) name: Option<String>,
    pub(crate) abbreviation: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) header: Option<String>,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) invoker: Invoker,
}

impl CommandSpec {
    pub fn new<F>(identifier: impl Into<String>, invoker: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, Vec<Value>) -> Result<Option<Value>> + 'static,
    {
        Self {
            identifier: identifier.into(),
            name: None,
            abbreviation: None,
            description: None,
            header: None,
            params: Vec::new(),
            invoker: Rc::new(invoker),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn abbrev(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Line printed before the command runs; `{0}`, `{1}`, ... are replaced by the arguments.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Adds an unnamed parameter, called `p1`, `p2`, ... after its position.
    pub fn param(self, value_type: ValueType) -> Self {
        let name = format!("p{}", self.params.len() + 1);
        self.named_param(name, "", value_type)
    }

    pub fn named_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let position = self.params.len();
        self.params.push(ParamSpec {
            name: name.into(),
            description: description.into(),
            position,
            value_type,
        });
        self
    }

    /// Adds a trailing parameter collecting all remaining arguments as `element` values.
    pub fn variadic(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        element: ValueType,
    ) -> Self {
        self.named_param(name, description, ValueType::array_of(element))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A registered command. Owned by the [`CommandTable`](crate::table::CommandTable).
pub struct CommandDescriptor {
    prefix: String,
    name: String,
    abbreviation: Option<String>,
    description: String,
    header: Option<String>,
    param_specs: Vec<ParamSpec>,
    invoker: Invoker,
}

impl CommandDescriptor {
    pub(crate) fn new(
        prefix: &str,
        name: String,
        abbreviation: Option<String>,
        spec: CommandSpec,
    ) -> Self {
        let description = spec
            .description
            .unwrap_or_else(|| describe(&spec.identifier, &spec.params));
        Self {
            prefix: prefix.to_string(),
            name,
            abbreviation,
            description,
            header: spec.header,
            param_specs: spec.params,
            invoker: spec.invoker,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn param_specs(&self) -> &[ParamSpec] {
        &self.param_specs
    }

    pub fn arity(&self) -> usize {
        self.param_specs.len()
    }

    /// True when the last parameter is an array collecting the remaining arguments.
    pub fn is_variadic(&self) -> bool {
        self.param_specs
            .last()
            .is_some_and(|spec| spec.value_type.is_array())
    }

    /// Full name including the prefix, e.g. `!set-display-time`.
    pub fn full_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    pub fn full_abbreviation(&self) -> Option<String> {
        self.abbreviation
            .as_ref()
            .map(|abbreviation| format!("{}{}", self.prefix, abbreviation))
    }

    /// Whether `command_name` is this command's prefixed name or prefixed abbreviation.
    pub fn can_be_denoted_by(&self, command_name: &str) -> bool {
        let Some(rest) = command_name.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        rest == self.name || self.abbreviation.as_deref() == Some(rest)
    }

    pub fn starts_with(&self, start: &str) -> bool {
        self.full_name().starts_with(start)
            || self
                .full_abbreviation()
                .is_some_and(|abbreviation| abbreviation.starts_with(start))
    }

    /// Whether `arg_count` arguments can be passed to this command.
    pub fn accepts(&self, arg_count: usize) -> bool {
        self.arity() == arg_count || (self.is_variadic() && self.arity() <= arg_count)
    }

    /// Header line for a call with the given arguments.
    pub fn format_header(&self, args: &[Value]) -> Option<String> {
        let header = self.header.as_deref()?;
        let mut formatted = header.to_string();
        for (i, arg) in args.iter().enumerate() {
            formatted = formatted.replace(&format!("{{{i}}}"), &arg.to_string());
        }
        Some(formatted)
    }

    pub fn invoke(&self, context: &mut CommandContext<'_>, args: Vec<Value>) -> Result<Option<Value>> {
        (self.invoker)(context, args)
    }
}

fn describe(identifier: &str, params: &[ParamSpec]) -> String {
    let params: Vec<String> = params
        .iter()
        .map(|param| format!("{}:{}", param.name, param.value_type))
        .collect();
    format!("{}({})", identifier, params.join(", "))
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}{}\t{}",
            self.full_name(),
            self.full_abbreviation().unwrap_or_default(),
            self.arity(),
            if self.is_variadic() { "+" } else { "" },
            self.description
        )
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("prefix", &self.prefix)
            .field("name", &self.name)
            .field("abbreviation", &self.abbreviation)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

/// An object contributing commands (and optionally converters) to a shell.
pub trait CommandHandler {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec>;

    fn input_converters(&self) -> Vec<InputConverter> {
        Vec::new()
    }

    fn output_converters(&self) -> Vec<OutputConverter> {
        Vec::new()
    }

    /// Called when a command loop using this handler starts.
    fn enter_loop(&self) {}

    /// Called when that command loop ends.
    fn leave_loop(&self) {}
}
