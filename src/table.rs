use crate::command::{CommandDescriptor, CommandSpec};
use crate::error::{Result, ShellError};
use crate::naming::{CommandNamer, DashJoinedNamer};
use log::debug;
use std::rc::Rc;

/// Registry of all commands known to a shell.
///
/// Commands are only ever added. Resolution hands out shared references to the stored
/// descriptors, so resolving the same name twice yields the same descriptor.
pub struct CommandTable {
    commands: Vec<Rc<CommandDescriptor>>,
    namer: Box<dyn CommandNamer>,
}

impl CommandTable {
    pub fn new(namer: Box<dyn CommandNamer>) -> Self {
        Self {
            commands: Vec::new(),
            namer,
        }
    }

    /// Registers a command under `prefix`.
    ///
    /// An explicit name is used as-is. Otherwise the name comes from the namer, along with the
    /// first suggested abbreviation not already denoting a command of the same arity. An explicit
    /// abbreviation always wins. Explicit names and abbreviations are not checked for collisions.
    pub fn register(&mut self, prefix: &str, spec: CommandSpec) -> Rc<CommandDescriptor> {
        let mut auto_abbreviation = None;
        let name = match &spec.name {
            Some(name) => name.clone(),
            None => {
                let naming = self.namer.name_command(&spec.identifier);
                auto_abbreviation = naming.abbreviation_candidates.into_iter().find(|candidate| {
                    !self.does_command_exist(&format!("{prefix}{candidate}"), spec.arity())
                });
                naming.command_name
            }
        };
        let abbreviation = spec.abbreviation.clone().or(auto_abbreviation);

        let command = Rc::new(CommandDescriptor::new(prefix, name, abbreviation, spec));
        debug!(
            "Registered command `{}` (abbreviation: {:?}, arity: {})",
            command.full_name(),
            command.full_abbreviation(),
            command.arity()
        );
        self.commands.push(Rc::clone(&command));
        command
    }

    fn does_command_exist(&self, command_name: &str, arity: usize) -> bool {
        self.commands
            .iter()
            .any(|command| command.can_be_denoted_by(command_name) && command.arity() == arity)
    }

    /// All commands whose prefixed name or abbreviation equals `discriminator`.
    pub fn commands_by_name(&self, discriminator: &str) -> Vec<Rc<CommandDescriptor>> {
        self.commands
            .iter()
            .filter(|command| command.can_be_denoted_by(discriminator))
            .cloned()
            .collect()
    }

    /// All commands whose prefixed name or abbreviation starts with `start`.
    pub fn commands_starting_with(&self, start: &str) -> Vec<Rc<CommandDescriptor>> {
        self.commands
            .iter()
            .filter(|command| command.starts_with(start))
            .cloned()
            .collect()
    }

    pub fn commands(&self) -> &[Rc<CommandDescriptor>] {
        &self.commands
    }

    /// Finds the single command called `discriminator` that accepts `arg_count` arguments.
    pub fn resolve(&self, discriminator: &str, arg_count: usize) -> Result<Rc<CommandDescriptor>> {
        let by_name = self.commands_by_name(discriminator);
        if by_name.is_empty() {
            return Err(ShellError::CommandNotFound(discriminator.to_string()));
        }

        let mut matching: Vec<_> = by_name
            .into_iter()
            .filter(|command| command.accepts(arg_count))
            .collect();
        match matching.len() {
            0 => Err(ShellError::arity_mismatch(discriminator, arg_count)),
            1 => Ok(matching.remove(0)),
            _ => Err(ShellError::ambiguous_command(discriminator, arg_count)),
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(Box::new(DashJoinedNamer::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::CommandContext;
    use crate::value::{Value, ValueType};

    fn noop(_: &mut CommandContext<'_>, _: Vec<Value>) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }

    fn spec(identifier: &str, arity: usize) -> CommandSpec {
        (0..arity).fold(CommandSpec::new(identifier, noop), |spec, _| {
            spec.param(ValueType::String)
        })
    }

    #[test]
    fn test_resolution_by_arity() {
        let mut table = CommandTable::default();
        let one = table.register("", spec("add", 1).name("add"));
        let two = table.register("", spec("add", 2).name("add"));

        assert!(Rc::ptr_eq(&table.resolve("add", 1).unwrap(), &one));
        assert!(Rc::ptr_eq(&table.resolve("add", 2).unwrap(), &two));
        assert!(matches!(
            table.resolve("add", 3),
            Err(ShellError::ArityMismatch { arg_count: 3, .. })
        ));
        assert!(matches!(
            table.resolve("nope", 0),
            Err(ShellError::CommandNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut table = CommandTable::default();
        table.register("", spec("cmdListFiles", 0));

        let first = table.resolve("list-files", 0).unwrap();
        let second = table.resolve("list-files", 0).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(table.commands().len(), 1);
    }

    #[test]
    fn test_variadic_resolution() {
        let mut table = CommandTable::default();
        table.register(
            "",
            CommandSpec::new("sum", noop)
                .param(ValueType::Int)
                .variadic("rest", "", ValueType::Int),
        );

        assert!(matches!(table.resolve("sum", 1), Err(ShellError::ArityMismatch { .. })));
        assert_eq!(table.resolve("sum", 2).unwrap().arity(), 2);
        assert_eq!(table.resolve("sum", 7).unwrap().arity(), 2);
    }

    #[test]
    fn test_abbreviation_skips_collisions_of_same_arity() {
        let mut table = CommandTable::default();
        let first = table.register("", spec("testMethod", 0));
        let second = table.register("", spec("tellMe", 0));
        let third = table.register("", spec("teMe", 0));
        let other_arity = table.register("", spec("teMe", 1));

        assert_eq!(first.abbreviation(), Some("tm"));
        assert_eq!(second.abbreviation(), Some("teme"));
        // Both candidates are taken at arity 0.
        assert_eq!(third.abbreviation(), None);
        assert_eq!(other_arity.abbreviation(), Some("tm"));

        assert!(Rc::ptr_eq(&table.resolve("tm", 1).unwrap(), &other_arity));
        assert!(Rc::ptr_eq(&table.resolve("te-me", 0).unwrap(), &third));
    }

    #[test]
    fn test_collision_check_respects_prefix() {
        let mut table = CommandTable::default();
        table.register("", spec("showTime", 0));
        let prefixed = table.register("!", spec("setTime", 0));
        assert_eq!(prefixed.abbreviation(), Some("st"));
        assert_eq!(prefixed.full_abbreviation().as_deref(), Some("!st"));
        assert!(table.resolve("st", 0).is_ok());
        assert!(table.resolve("!st", 0).is_ok());
    }

    #[test]
    fn test_explicit_abbreviation_overrides_and_may_shadow() {
        let mut table = CommandTable::default();
        table.register("", spec("listFiles", 0));
        let shadow = table.register("", spec("launchFast", 0).abbrev("lf"));
        assert_eq!(shadow.abbreviation(), Some("lf"));

        // Nothing stopped the clash, so the name is now ambiguous.
        assert!(matches!(
            table.resolve("lf", 0),
            Err(ShellError::AmbiguousCommand { arg_count: 0, .. })
        ));
    }

    #[test]
    fn test_explicit_name_collisions_are_ambiguous() {
        // Observed behavior: only the auto abbreviation is collision checked, so two commands
        // given the same explicit name at the same arity cannot be told apart.
        let mut table = CommandTable::default();
        table.register("", spec("first", 1).name("go"));
        table.register("", spec("second", 1).name("go"));
        assert!(matches!(
            table.resolve("go", 1),
            Err(ShellError::AmbiguousCommand { .. })
        ));
    }

    #[test]
    fn test_commands_starting_with() {
        let mut table = CommandTable::default();
        table.register("", spec("listFiles", 0));
        table.register("", spec("loadFile", 1));
        table.register("?", spec("list", 0));

        let names: Vec<String> = table
            .commands_starting_with("li")
            .iter()
            .map(|c| c.full_name())
            .collect();
        assert_eq!(names, vec!["list-files"]);
        assert_eq!(table.commands_starting_with("?").len(), 1);
        assert_eq!(table.commands_by_name("lf").len(), 2);
    }
}
