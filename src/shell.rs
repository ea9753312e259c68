use crate::command::CommandHandler;
use crate::error::{Result, ShellError};
use crate::input::InputConversion;
use crate::lexer::{Token, tokenize};
use crate::output::{Output, OutputConversion};
use crate::table::CommandTable;
use crate::value::Value;
use log::{debug, info};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Line that ends the command loop. It is still processed like any other line first.
pub const EXIT_COMMAND: &str = "exit";

/// Line answered with a short introduction instead of being dispatched.
pub const HINT_COMMAND: &str = "?";

/// Source of command lines.
pub trait LineSource {
    /// Reads the next line; `path` names the current (sub)shell for the prompt.
    ///
    /// `Ok(None)` means the input is exhausted and ends the command loop.
    fn read_line(&mut self, path: &[String]) -> anyhow::Result<Option<String>>;
}

/// Everything a shell shares with the subshells it spawns.
#[derive(Clone)]
pub struct ShellConfig {
    pub input: Rc<RefCell<dyn LineSource>>,
    pub output: Rc<RefCell<dyn Output>>,
    /// Handlers registered in every shell of the family, with their prefixes.
    pub aux_handlers: Vec<(String, Rc<dyn CommandHandler>)>,
    pub display_time: bool,
    pub path: Vec<String>,
    pub app_name: String,
}

/// Mutable state of one shell that its own commands may touch.
#[derive(Debug, Default)]
pub struct Session {
    pub display_time: bool,
    pub last_exception: Option<Rc<anyhow::Error>>,
}

/// What a command sees of the shell running it.
pub struct CommandContext<'a> {
    pub table: &'a CommandTable,
    pub config: &'a ShellConfig,
    pub session: &'a mut Session,
}

impl CommandContext<'_> {
    /// Configuration to hand to a subshell; carries the current display-time setting.
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            display_time: self.session.display_time,
            ..self.config.clone()
        }
    }
}

/// Interactive command shell: reads lines, dispatches them to commands and shows the results.
pub struct Shell {
    config: ShellConfig,
    table: CommandTable,
    input_conversion: InputConversion,
    output_conversion: OutputConversion,
    session: Session,
    handlers: Vec<Rc<dyn CommandHandler>>,
}

impl Shell {
    /// Creates a shell and registers the auxiliary handlers listed in `config`.
    pub fn new(config: ShellConfig, table: CommandTable) -> Self {
        let aux_handlers = config.aux_handlers.clone();
        let mut shell = Self {
            session: Session {
                display_time: config.display_time,
                last_exception: None,
            },
            config,
            table,
            input_conversion: InputConversion::new(),
            output_conversion: OutputConversion::new(),
            handlers: Vec::new(),
        };
        for (prefix, handler) in aux_handlers {
            shell.register_handler(handler, &prefix);
        }
        shell
    }

    /// Registers the commands and converters of a handler specific to this shell.
    pub fn add_main_handler(&mut self, handler: Rc<dyn CommandHandler>, prefix: &str) {
        self.register_handler(handler, prefix);
    }

    /// Registers a handler that subshells created from this shell inherit.
    pub fn add_aux_handler(&mut self, handler: Rc<dyn CommandHandler>, prefix: &str) {
        self.config
            .aux_handlers
            .push((prefix.to_string(), Rc::clone(&handler)));
        self.register_handler(handler, prefix);
    }

    fn register_handler(&mut self, handler: Rc<dyn CommandHandler>, prefix: &str) {
        for spec in Rc::clone(&handler).commands() {
            self.table.register(prefix, spec);
        }
        for converter in handler.input_converters() {
            self.input_conversion.add_converter(converter);
        }
        for converter in handler.output_converters() {
            self.output_conversion.add_converter(converter);
        }
        self.handlers.push(handler);
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn input_conversion_mut(&mut self) -> &mut InputConversion {
        &mut self.input_conversion
    }

    pub fn output_conversion_mut(&mut self) -> &mut OutputConversion {
        &mut self.output_conversion
    }

    pub fn display_time(&self) -> bool {
        self.session.display_time
    }

    pub fn set_display_time(&mut self, display_time: bool) {
        self.session.display_time = display_time;
    }

    /// The error of the most recent line that failed to run, kept for inspection.
    pub fn last_exception(&self) -> Option<&Rc<anyhow::Error>> {
        self.session.last_exception.as_ref()
    }

    /// Runs the read-process-display loop until `exit` or the end of input.
    ///
    /// Only failures to read input end the loop with an error; everything else is reported
    /// through the output and the loop goes on.
    pub fn command_loop(&mut self) -> anyhow::Result<()> {
        for handler in &self.handlers {
            handler.enter_loop();
        }
        if !self.config.app_name.is_empty() {
            let greeting = Value::from(self.config.app_name.as_str());
            self.config
                .output
                .borrow_mut()
                .output(&greeting, &self.output_conversion);
        }

        let result = self.run_loop();

        for handler in &self.handlers {
            handler.leave_loop();
        }
        result
    }

    fn run_loop(&mut self) -> anyhow::Result<()> {
        loop {
            let line = self.config.input.borrow_mut().read_line(&self.config.path)?;
            let Some(line) = line else {
                info!("Input exhausted, leaving {}", self.config.path.join("/"));
                return Ok(());
            };

            let is_exit = line.trim() == EXIT_COMMAND;
            if let Err(error) = self.process_line(&line) {
                // A failing `exit` still ends the loop, silently.
                if !is_exit {
                    self.report(&error);
                }
                self.session.last_exception = Some(Rc::new(error.into()));
            }
            if is_exit {
                info!("Leaving {}", self.config.path.join("/"));
                return Ok(());
            }
        }
    }

    fn report(&self, error: &ShellError) {
        debug!("Line failed: {error}");
        let mut output = self.config.output.borrow_mut();
        match error.token() {
            Some(token) => output.output_token_error(token, &error.to_string()),
            None => output.output_error(error),
        }
    }

    /// Processes a single line: tokenize, resolve, convert, invoke, display.
    ///
    /// Blank lines and comments do nothing. A command that fails is not an error here: its
    /// failure is displayed as its result.
    pub fn process_line(&mut self, line: &str) -> Result<()> {
        if line.trim() == HINT_COMMAND {
            let hint = Value::from(format!(
                "This is {}, running on Shell\nFor more information on the Shell, enter ?help",
                self.config.app_name
            ));
            self.config
                .output
                .borrow_mut()
                .output(&hint, &self.output_conversion);
            return Ok(());
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(());
        }
        self.process_command(&tokens)
    }

    fn process_command(&mut self, tokens: &[Token]) -> Result<()> {
        let command = self.table.resolve(tokens[0].text(), tokens.len() - 1)?;
        let args = self.input_conversion.convert_to_parameters(tokens, &command)?;

        let header = command.format_header(&args);
        self.config.output.borrow_mut().output_header(header.as_deref());

        debug!("Invoking `{}` with {:?}", command.full_name(), args);
        let started = Instant::now();
        let outcome = {
            let mut context = CommandContext {
                table: &self.table,
                config: &self.config,
                session: &mut self.session,
            };
            command.invoke(&mut context, args)
        };
        let elapsed = started.elapsed().as_millis();

        let result = match outcome {
            Ok(result) => result,
            Err(error) => {
                debug!("`{}` failed: {error:#}", command.full_name());
                Some(Value::error(error))
            }
        };

        let mut output = self.config.output.borrow_mut();
        if let Some(value) = result {
            output.output(&value, &self.output_conversion);
        }
        if self.session.display_time && elapsed != 0 {
            output.output(
                &Value::from(format!("time: {elapsed} ms")),
                &self.output_conversion,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSpec;
    use crate::console::{ConsoleIo, ReaderInput};
    use crate::io_adapters::SharedBuffer;
    use crate::value::{ArgumentsExt, ValueType};
    use anyhow::bail;
    use std::io::Cursor;
    use std::thread::sleep;
    use std::time::Duration;

    struct Calculator;

    impl CommandHandler for Calculator {
        fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
            vec![
                CommandSpec::new("add", |_, args| {
                    Ok(Some(Value::Int(args.i32_arg(0)? + args.i32_arg(1)?)))
                })
                .param(ValueType::Int)
                .param(ValueType::Int)
                .header("adding {0} and {1}"),
                CommandSpec::new("divide", |_, args| {
                    let divisor = args.i32_arg(1)?;
                    if divisor == 0 {
                        bail!("division by zero");
                    }
                    Ok(Some(Value::Int(args.i32_arg(0)? / divisor)))
                })
                .param(ValueType::Int)
                .param(ValueType::Int),
                CommandSpec::new("nap", |_, _| {
                    sleep(Duration::from_millis(5));
                    Ok(None)
                }),
                CommandSpec::new("exit", |_, _| Ok(Some(Value::from("bye")))),
            ]
        }
    }

    struct Fixture {
        shell: Shell,
        out: SharedBuffer,
        err: SharedBuffer,
    }

    fn fixture(script: &str) -> Fixture {
        fixture_with(script, Some(Rc::new(Calculator)))
    }

    fn fixture_with(script: &str, handler: Option<Rc<dyn CommandHandler>>) -> Fixture {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let io = Rc::new(RefCell::new(ConsoleIo::new(
            Box::new(ReaderInput::new(Cursor::new(script.to_string()), out.clone())),
            Box::new(out.clone()),
            Box::new(err.clone()),
        )));
        let config = ShellConfig {
            input: io.clone(),
            output: io,
            aux_handlers: Vec::new(),
            display_time: false,
            path: vec!["calc".to_string()],
            app_name: "Calculator".to_string(),
        };
        let mut shell = Shell::new(config, CommandTable::default());
        if let Some(handler) = handler {
            shell.add_main_handler(handler, "");
        }
        Fixture { shell, out, err }
    }

    #[test]
    fn test_process_line_outputs_header_and_result() {
        let mut f = fixture("");
        f.shell.process_line("add 2 3").unwrap();
        assert_eq!(f.out.take(), "adding 2 and 3\n5\n");
    }

    #[test]
    fn test_blank_and_comment_lines_do_nothing() {
        let mut f = fixture("");
        f.shell.process_line("   ").unwrap();
        f.shell.process_line("# just a comment").unwrap();
        assert_eq!(f.out.contents(), "");
    }

    #[test]
    fn test_hint() {
        let mut f = fixture("");
        f.shell.process_line(" ? ").unwrap();
        assert_eq!(
            f.out.take(),
            "This is Calculator, running on Shell\nFor more information on the Shell, enter ?help\n"
        );
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let mut f = fixture("");
        assert!(matches!(
            f.shell.process_line("multiply 1 2"),
            Err(ShellError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_command_failure_is_displayed_as_result() {
        let mut f = fixture("");
        f.shell.process_line("divide 1 0").unwrap();
        assert_eq!(f.out.take(), "division by zero\n");
        assert!(f.shell.last_exception().is_none());
    }

    #[test]
    fn test_display_time() {
        let mut f = fixture("");
        f.shell.set_display_time(true);
        f.shell.process_line("nap").unwrap();
        let out = f.out.take();
        assert!(out.starts_with("time: "), "{out}");
        assert!(out.ends_with(" ms\n"), "{out}");
    }

    #[test]
    fn test_command_loop() {
        let mut f = fixture("add 1 2\nadd x 2\nnope\nexit\nadd 5 5\n");
        f.shell.command_loop().unwrap();

        let out = f.out.contents();
        assert!(out.starts_with("Calculator\n"));
        assert!(out.contains("adding 1 and 2\n3\n"));
        // The `exit` command runs, then the loop ends before the last line.
        assert!(out.contains("bye\n"));
        assert!(!out.contains("adding 5"));

        let err = f.err.contents();
        assert!(err.contains("Unknown command: \"nope\""));
        assert!(err.contains("^\n"));
        assert!(f.shell.last_exception().is_some());
    }

    #[test]
    fn test_loop_ends_with_input() {
        let mut f = fixture("add 1 2\n");
        f.shell.command_loop().unwrap();
        // The prompt is shown once more before the end of input is noticed.
        assert!(f.out.contents().ends_with("3\ncalc> "));
    }

    #[test]
    fn test_failing_exit_is_silent_but_recorded() {
        // Intentional: nothing is registered as `exit`, yet the line still ends the loop quietly.
        let mut f = fixture_with("  exit  \nnope\n", None);
        f.shell.command_loop().unwrap();

        assert_eq!(f.err.contents(), "");
        assert_eq!(f.out.contents(), "Calculator\ncalc> ");
        let error = f.shell.last_exception().unwrap();
        assert!(matches!(
            error.downcast_ref::<ShellError>(),
            Some(ShellError::CommandNotFound(name)) if name == "exit"
        ));
    }

    #[test]
    fn test_exit_with_arguments_is_an_ordinary_line() {
        let mut f = fixture("exit now\nadd 1 1\n");
        f.shell.command_loop().unwrap();

        assert_eq!(
            f.err.contents(),
            "There's no command \"exit\" taking 1 arguments\n"
        );
        assert!(f.out.contents().contains("adding 1 and 1\n2\n"));
        let error = f.shell.last_exception().unwrap();
        assert!(matches!(
            error.downcast_ref::<ShellError>(),
            Some(ShellError::ArityMismatch { arg_count: 1, .. })
        ));
    }
}
