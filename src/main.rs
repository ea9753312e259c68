use anyhow::{Context, Result, bail};
use argh::FromArgs;
use command_shell::{
    ArgumentsExt, CommandHandler, CommandSpec, ConsoleIo, ShellFactory, Value, ValueType,
};
use log::info;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(FromArgs)]
/// Demo command shell with a calculator and per-project notes
struct Args {
    #[argh(option, default = "String::from(\"demo\")")]
    /// prompt shown in front of every line
    prompt: String,

    #[argh(option, default = "String::from(\"Command shell demo\")")]
    /// name printed when the shell starts
    app_name: String,

    #[argh(switch, short = 't')]
    /// show how long every command took
    display_time: bool,

    #[argh(option, short = 's')]
    /// script whose lines run before interactive input
    script: Option<String>,
}

/// Arithmetic commands and the entry point to project subshells.
struct Calculator;

impl CommandHandler for Calculator {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("add", |_, args| {
                Ok(Some(Value::Int(args.i32_arg(0)? + args.i32_arg(1)?)))
            })
            .description("Adds two integers")
            .named_param("a", "first summand", ValueType::Int)
            .named_param("b", "second summand", ValueType::Int)
            .header("{0} + {1} ="),
            CommandSpec::new("sum", |_, args| {
                let total = args
                    .array_arg(0)?
                    .iter()
                    .filter_map(Value::as_f64)
                    .sum::<f64>();
                Ok(Some(Value::Double(total)))
            })
            .description("Adds any number of values")
            .variadic("values", "numbers to add", ValueType::Double),
            CommandSpec::new("cmdDivide", |_, args| {
                let divisor = args.f64_arg(1)?;
                if divisor == 0.0 {
                    bail!("Can't divide by zero");
                }
                Ok(Some(Value::Double(args.f64_arg(0)? / divisor)))
            })
            .description("Divides one number by another")
            .named_param("dividend", "", ValueType::Double)
            .named_param("divisor", "", ValueType::Double),
            CommandSpec::new("echo", |_, args| {
                Ok(Some(Value::from(args.array_arg(0)?.to_vec())))
            })
            .description("Prints every argument on its own line")
            .variadic("words", "", ValueType::String),
            CommandSpec::new("openProject", |ctx, args| {
                let name = args.str_arg(0)?;
                let mut subshell = ShellFactory::create_subshell(
                    name,
                    &ctx.shell_config(),
                    &format!("Project {name}"),
                    Rc::new(Project::default()),
                );
                subshell.command_loop()?;
                Ok(None)
            })
            .description("Opens a subshell to take notes on a project")
            .named_param("name", "project name", ValueType::String),
        ]
    }
}

/// Notes kept while a project subshell runs.
#[derive(Default)]
struct Project {
    notes: RefCell<BTreeMap<String, String>>,
}

impl CommandHandler for Project {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
        let writer = Rc::clone(&self);
        let reader = Rc::clone(&self);
        let lister = self;
        vec![
            CommandSpec::new("note", move |_, args| {
                let text = args
                    .array_arg(1)?
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writer
                    .notes
                    .borrow_mut()
                    .insert(args.str_arg(0)?.to_string(), text);
                Ok(None)
            })
            .description("Stores a note under a key")
            .named_param("key", "", ValueType::String)
            .variadic("text", "", ValueType::String),
            CommandSpec::new("show", move |_, args| {
                let key = args.str_arg(0)?;
                let notes = reader.notes.borrow();
                let note = notes.get(key).with_context(|| format!("No note named {key}"))?;
                Ok(Some(Value::from(note.as_str())))
            })
            .description("Shows a note")
            .named_param("key", "", ValueType::String),
            CommandSpec::new("listNotes", move |_, _| {
                let keys = lister.notes.borrow().keys().cloned().map(Value::from).collect();
                Ok(Some(Value::Collection(keys)))
            })
            .description("Lists the keys of all notes"),
        ]
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    let io = Rc::new(RefCell::new(ConsoleIo::stdio()?));
    if let Some(script) = &args.script {
        io.borrow_mut().run_script(script)?;
    }

    let handlers: Vec<Rc<dyn CommandHandler>> = vec![Rc::new(Calculator)];
    let mut shell = ShellFactory::create_shell(io, &args.prompt, &args.app_name, handlers);
    shell.set_display_time(args.display_time);

    info!("Starting {}", args.app_name);
    shell.command_loop()
}
