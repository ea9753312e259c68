use crate::builtins::ShellBuiltins;
use crate::command::CommandHandler;
use crate::console::ConsoleIo;
use crate::help::HelpCommandHandler;
use crate::naming::DashJoinedNamer;
use crate::shell::{Shell, ShellConfig};
use crate::table::CommandTable;
use std::cell::RefCell;
use std::rc::Rc;

/// Ready-made shell setups.
pub struct ShellFactory;

impl ShellFactory {
    /// A shell on the process terminal running `handlers` without prefix.
    pub fn create_console_shell(
        prompt: &str,
        app_name: &str,
        handlers: Vec<Rc<dyn CommandHandler>>,
    ) -> anyhow::Result<Shell> {
        let io = Rc::new(RefCell::new(ConsoleIo::stdio()?));
        Ok(Self::create_shell(io, prompt, app_name, handlers))
    }

    /// Like [`create_console_shell`](Self::create_console_shell) on an existing console.
    ///
    /// Besides the given handlers the shell gets the built-in commands under `!`, help under `?`
    /// and the console's own commands under `!`, the latter inherited by subshells.
    pub fn create_shell(
        io: Rc<RefCell<ConsoleIo>>,
        prompt: &str,
        app_name: &str,
        handlers: Vec<Rc<dyn CommandHandler>>,
    ) -> Shell {
        let config = ShellConfig {
            input: io.clone(),
            output: io.clone(),
            aux_handlers: vec![("!".to_string(), io as Rc<dyn CommandHandler>)],
            display_time: false,
            path: vec![prompt.to_string()],
            app_name: app_name.to_string(),
        };
        let table = CommandTable::new(Box::new(DashJoinedNamer::new(true)));
        let mut shell = Shell::new(config, table);
        add_standard_handlers(&mut shell);
        for handler in handlers {
            shell.add_main_handler(handler, "");
        }
        shell
    }

    /// A nested shell sharing I/O and auxiliary handlers with its parent.
    ///
    /// Meant to be created and run from inside a command, with the config taken from
    /// [`CommandContext::shell_config`](crate::shell::CommandContext::shell_config).
    pub fn create_subshell(
        path_element: &str,
        parent: &ShellConfig,
        app_name: &str,
        main_handler: Rc<dyn CommandHandler>,
    ) -> Shell {
        let mut config = parent.clone();
        config.path.push(path_element.to_string());
        config.app_name = app_name.to_string();

        let mut shell = Shell::new(config, CommandTable::default());
        add_standard_handlers(&mut shell);
        shell.add_main_handler(main_handler, "");
        shell
    }
}

fn add_standard_handlers(shell: &mut Shell) {
    shell.add_main_handler(Rc::new(ShellBuiltins), "!");
    shell.add_main_handler(Rc::new(HelpCommandHandler), "?");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSpec;
    use crate::console::ReaderInput;
    use crate::io_adapters::SharedBuffer;
    use crate::value::{ArgumentsExt, Value, ValueType};
    use std::cell::Cell;
    use std::io::Cursor;

    /// Counts upwards; `enter` opens a subshell with its own counter.
    struct Counter {
        count: Cell<i32>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                count: Cell::new(0),
            })
        }
    }

    impl CommandHandler for Counter {
        fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
            let counter = Rc::clone(&self);
            vec![
                CommandSpec::new("cmdIncrement", move |_, args| {
                    counter.count.set(counter.count.get() + args.i32_arg(0)?);
                    Ok(Some(Value::Int(counter.count.get())))
                })
                .param(ValueType::Int),
                CommandSpec::new("enter", |ctx, args| {
                    let name = args.str_arg(0)?;
                    let mut subshell = ShellFactory::create_subshell(
                        name,
                        &ctx.shell_config(),
                        "Nested counter",
                        Counter::new(),
                    );
                    subshell.command_loop()?;
                    Ok(Some(Value::from(format!("left {name}"))))
                })
                .named_param("name", "Name of the subshell", ValueType::String),
            ]
        }
    }

    fn counter_shell(io: Rc<RefCell<ConsoleIo>>) -> Shell {
        let handlers: Vec<Rc<dyn CommandHandler>> = vec![Counter::new()];
        ShellFactory::create_shell(io, "app", "App", handlers)
    }

    fn console(input: &str) -> (Rc<RefCell<ConsoleIo>>, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let io = ConsoleIo::new(
            Box::new(ReaderInput::new(Cursor::new(input.to_string()), out.clone())),
            Box::new(out.clone()),
            Box::new(err.clone()),
        );
        (Rc::new(RefCell::new(io)), out, err)
    }

    #[test]
    fn test_console_shell_commands() {
        let (io, _, _) = console("");
        let shell = counter_shell(io);
        let table = shell.table();

        for name in [
            "increment",
            "i",
            "enter",
            "!set-display-time",
            "!get-last-exception",
            "!run-script",
            "!enable-logging",
            "!disable-logging",
            "?help",
            "?list-all",
        ] {
            assert!(!table.commands_by_name(name).is_empty(), "{name} is missing");
        }
    }

    #[test]
    fn test_session_with_subshell() {
        let script = "\
increment 2
!set-display-time true
enter inner
increment 5
?list
exit
increment 1
!sdt false
exit
";
        let (io, out, err) = console(script);
        let mut shell = counter_shell(io);
        shell.command_loop().unwrap();

        let out = out.contents();
        assert!(out.starts_with("App\napp> 2\n"), "{out}");
        assert!(out.contains("app> Nested counter\napp/inner> 5\n"), "{out}");
        // The subshell lists its own handler only.
        assert!(out.contains("increment\ti\t1\t"), "{out}");
        assert!(out.contains("left inner\n"), "{out}");
        // Counters are independent.
        assert!(out.contains("app> 3\n"), "{out}");
        assert_eq!(err.contents(), "");
        assert!(!shell.display_time());
    }

    #[test]
    fn test_script_from_console_command() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut script, b"increment 4\nincrement x\n").unwrap();
        let line = format!("!run-script \"{}\"\n", script.path().display());

        let (io, out, err) = console(&line);
        let mut shell = counter_shell(io);
        shell.command_loop().unwrap();

        assert!(out.contents().contains("app$ increment 4\n4\napp$ increment x\n"));
        // "app$ " and "increment " precede the bad token.
        assert!(err.contents().starts_with("---------------^\n"), "{}", err.contents());
    }
}
