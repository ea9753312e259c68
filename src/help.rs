use crate::command::{CommandDescriptor, CommandHandler, CommandSpec};
use crate::value::{ArgumentsExt, Value, ValueType};
use anyhow::bail;
use std::rc::Rc;

const GENERAL_HELP: &str = "\
This is a command shell. Enter a command name followed by its arguments, separated by spaces.
Arguments containing spaces can be quoted with \"double\" or 'single' quotes.
To list commands enter ?list, ?list <start> or ?list-all, the latter also shows system commands.
To get detailed info on a command enter ?help <command>.
To leave the shell enter exit.";

/// Help and command listing, registered under `?`.
pub struct HelpCommandHandler;

impl CommandHandler for HelpCommandHandler {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("help", |_, _| Ok(Some(Value::from(GENERAL_HELP))))
                .description("Shows general help"),
            CommandSpec::new("help", |ctx, args| {
                let name = args.str_arg(0)?;
                let commands = ctx.table.commands_by_name(name);
                if commands.is_empty() {
                    bail!("No command named {name}");
                }
                let lines = commands
                    .iter()
                    .flat_map(|command| describe_command(command))
                    .map(Value::from)
                    .collect();
                Ok(Some(Value::Collection(lines)))
            })
            .description("Shows detailed info on all commands with the given name")
            .named_param("command-name", "Command name or abbreviation", ValueType::String),
            CommandSpec::new("list", |ctx, _| {
                Ok(Some(listing(ctx.table.commands().iter().filter(|c| c.prefix().is_empty()))))
            })
            .description("Lists commands of the application"),
            CommandSpec::new("list", |ctx, args| {
                let start = args.str_arg(0)?;
                Ok(Some(listing(ctx.table.commands_starting_with(start).iter())))
            })
            .description("Lists commands whose name or abbreviation starts with the given text")
            .named_param("start", "Beginning of the command name", ValueType::String),
            CommandSpec::new("listAll", |ctx, _| Ok(Some(listing(ctx.table.commands().iter()))))
                .description("Lists all commands, system ones included"),
        ]
    }
}

fn listing<'a>(commands: impl Iterator<Item = &'a Rc<CommandDescriptor>>) -> Value {
    Value::Collection(commands.map(|command| Value::from(command.to_string())).collect())
}

fn describe_command(command: &CommandDescriptor) -> Vec<String> {
    let mut lines = vec![
        format!("Command: {}", command.full_name()),
        format!(
            "Abbrev: {}",
            command.full_abbreviation().as_deref().unwrap_or("(none)")
        ),
        format!("Description: {}", command.description()),
    ];
    if command.is_variadic() {
        lines.push(format!(
            "Number of parameters: {} or more",
            command.arity()
        ));
    } else {
        lines.push(format!("Number of parameters: {}", command.arity()));
    }
    lines.extend(command.param_specs().iter().map(|param| {
        format!(
            "{}\t{}\t{}",
            param.name, param.value_type, param.description
        )
    }));
    lines
}
