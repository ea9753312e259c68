//! Console collaborator: reads lines from the user or a script and prints everything the shell
//! displays, optionally duplicating it into a log file.

use crate::command::{CommandHandler, CommandSpec};
use crate::lexer::Token;
use crate::output::{Output, OutputConversion, render_lines};
use crate::shell::LineSource;
use crate::value::{ArgumentsExt, Value, ValueType};
use anyhow::{Context, Result};
use log::{info, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::rc::Rc;

const USER_PROMPT_SUFFIX: &str = "> ";
const SCRIPT_PROMPT_SUFFIX: &str = "$ ";

/// Interactive line input.
pub trait UserInput {
    /// Shows `prompt` and reads one line without its terminator; `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Line input from any reader, with the prompt written to `prompt_out`.
pub struct ReaderInput<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> ReaderInput<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> UserInput for ReaderInput<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

/// Terminal line editor with history.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to set up the line editor")?;
        Ok(Self { editor })
    }
}

impl UserInput for EditorInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err).context("Failed to read a line"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputState {
    User,
    Script,
}

/// Console input and output of a shell, shared by a shell and all its subshells.
pub struct ConsoleIo {
    user_input: Box<dyn UserInput>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    /// Width of the prompt in front of the last line read, for caret diagnostics.
    last_command_offset: usize,
    log: Option<File>,
    loop_counter: i32,
    input_state: InputState,
    script: Option<Lines<BufReader<File>>>,
}

impl ConsoleIo {
    pub fn new(user_input: Box<dyn UserInput>, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            user_input,
            out,
            err,
            last_command_offset: 0,
            log: None,
            loop_counter: 0,
            input_state: InputState::User,
            script: None,
        }
    }

    /// Console on the process terminal, with line editing.
    pub fn stdio() -> Result<Self> {
        Ok(Self::new(
            Box::new(EditorInput::new()?),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        ))
    }

    /// Replays the lines of `filename` before asking the user again.
    pub fn run_script(&mut self, filename: &str) -> Result<()> {
        let file =
            File::open(filename).with_context(|| format!("Can't open script {filename}"))?;
        info!("Running script {filename}");
        self.script = Some(BufReader::new(file).lines());
        self.input_state = InputState::Script;
        Ok(())
    }

    /// Duplicates all further output, errors and user lines into `filename`.
    pub fn enable_logging(&mut self, filename: &str) -> Result<()> {
        let file =
            File::create(filename).with_context(|| format!("Can't create log {filename}"))?;
        info!("Logging console output to {filename}");
        self.log = Some(file);
        self.loop_counter = 0;
        Ok(())
    }

    pub fn disable_logging(&mut self) -> &'static str {
        match self.log.take() {
            Some(_) => {
                info!("Console logging disabled");
                "Logging disabled"
            }
            None => "Logging is already disabled",
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.log.is_some()
    }

    fn enter_loop(&mut self) {
        if self.is_logging_enabled() {
            self.loop_counter += 1;
        }
    }

    /// Logging started inside a loop stops when that loop is left.
    fn leave_loop(&mut self) {
        if self.is_logging_enabled() {
            self.loop_counter -= 1;
        }
        if self.loop_counter < 0 {
            self.disable_logging();
        }
    }

    fn read_user_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let complete_prompt = format!("{prompt}{USER_PROMPT_SUFFIX}");
        self.write_log(&complete_prompt);
        self.last_command_offset = complete_prompt.chars().count();

        let line = self.user_input.read_line(&complete_prompt)?;
        if let Some(line) = &line {
            self.write_log(&format!("{line}\n"));
        }
        Ok(line)
    }

    fn read_script_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let Some(script) = self.script.as_mut() else {
            return Ok(None);
        };
        let Some(line) = script.next().transpose()? else {
            return Ok(None);
        };
        let complete_prompt = format!("{prompt}{SCRIPT_PROMPT_SUFFIX}");
        self.last_command_offset = complete_prompt.chars().count();
        self.println(&format!("{complete_prompt}{line}"));
        Ok(Some(line))
    }

    fn close_script(&mut self) {
        if self.script.take().is_some() {
            info!("Script finished");
        }
        self.input_state = InputState::User;
    }

    fn write_log(&mut self, text: &str) {
        if let Some(log) = self.log.as_mut()
            && let Err(e) = log.write_all(text.as_bytes())
        {
            warn!("Failed to write to the console log: {e}");
        }
    }

    fn println(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!("Failed to write output: {e}");
        }
        self.write_log(&format!("{text}\n"));
    }

    fn print_err(&mut self, text: &str) {
        if let Err(e) = write!(self.err, "{text}") {
            warn!("Failed to write error output: {e}");
        }
        self.write_log(text);
    }

    fn println_err(&mut self, text: &str) {
        self.print_err(&format!("{text}\n"));
    }
}

impl LineSource for ConsoleIo {
    fn read_line(&mut self, path: &[String]) -> Result<Option<String>> {
        let prompt = path.join("/");
        if self.input_state == InputState::Script {
            if let Some(line) = self.read_script_line(&prompt)? {
                return Ok(Some(line));
            }
            self.close_script();
        }
        self.read_user_line(&prompt)
    }
}

impl Output for ConsoleIo {
    fn output(&mut self, value: &Value, conversion: &OutputConversion) {
        for line in render_lines(value, conversion) {
            self.println(&line);
        }
    }

    fn output_header(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            self.println(text);
        }
    }

    fn output_token_error(&mut self, token: &Token, message: &str) {
        let marker = format!(
            "{}{}",
            "-".repeat(token.index() + self.last_command_offset),
            "^".repeat(token.text().chars().count())
        );
        self.println_err(&marker);
        self.println_err(message);
    }

    fn output_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.println_err(&error.to_string());
        if let Some(cause) = error.source() {
            self.println_err(&cause.to_string());
        }
    }
}

/// Console commands, registered under `!` by the factory.
impl CommandHandler for RefCell<ConsoleIo> {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
        let script_io = Rc::clone(&self);
        let log_io = Rc::clone(&self);
        let io = self;
        vec![
            CommandSpec::new("runScript", move |_, args| {
                script_io.borrow_mut().run_script(args.str_arg(0)?)?;
                Ok(None)
            })
            .description("Reads commands from file")
            .named_param("filename", "Full file name of the script", ValueType::String),
            CommandSpec::new("enableLogging", move |_, args| {
                log_io.borrow_mut().enable_logging(args.str_arg(0)?)?;
                Ok(None)
            })
            .description("Sets up logging, which duplicates all subsequent output in a file")
            .named_param("fileName", "Name of the logfile", ValueType::String),
            CommandSpec::new("disableLogging", move |_, _| {
                Ok(Some(Value::from(io.borrow_mut().disable_logging())))
            })
            .description("Turns off logging"),
        ]
    }

    fn enter_loop(&self) {
        self.borrow_mut().enter_loop();
    }

    fn leave_loop(&self) {
        self.borrow_mut().leave_loop();
    }
}
