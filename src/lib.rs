//! An embeddable interactive command shell.
//!
//! Applications describe their commands through [`CommandHandler`]s. The shell derives a
//! dash-joined name and a short abbreviation for every command, tokenizes input lines, resolves
//! the command by name and argument count, converts the argument text into typed [`Value`]s and
//! displays whatever the command returns.
//!
//! The quickest way in is [`ShellFactory`], which wires a terminal console together with the
//! built-in `!` commands and the `?` help commands. [`Shell`] can also be assembled by hand
//! around any [`LineSource`] and [`Output`].
//!
//! ```
//! use command_shell::{
//!     ArgumentsExt, CommandHandler, CommandSpec, ConsoleIo, ReaderInput, SharedBuffer,
//!     ShellFactory, Value, ValueType,
//! };
//! use std::cell::RefCell;
//! use std::io::Cursor;
//! use std::rc::Rc;
//!
//! struct Greeter;
//!
//! impl CommandHandler for Greeter {
//!     fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
//!         vec![CommandSpec::new("cmdSayHello", |_, args| {
//!             Ok(Some(Value::from(format!("Hello, {}!", args.str_arg(0)?))))
//!         })
//!         .param(ValueType::String)]
//!     }
//! }
//!
//! let out = SharedBuffer::new();
//! let input = ReaderInput::new(Cursor::new("say-hello world\nsh 'dear reader'\nexit\n"), out.clone());
//! let io = ConsoleIo::new(Box::new(input), Box::new(out.clone()), Box::new(out.clone()));
//!
//! let handlers: Vec<Rc<dyn CommandHandler>> = vec![Rc::new(Greeter)];
//! let mut shell = ShellFactory::create_shell(Rc::new(RefCell::new(io)), "hi", "Greeter", handlers);
//! shell.command_loop().unwrap();
//!
//! assert_eq!(
//!     out.contents(),
//!     "Greeter\nhi> Hello, world!\nhi> Hello, dear reader!\nhi> "
//! );
//! ```

pub mod builtins;
pub mod command;
pub mod console;
pub mod error;
pub mod factory;
pub mod help;
pub mod input;
mod io_adapters;
pub mod lexer;
pub mod naming;
pub mod output;
pub mod shell;
pub mod table;
pub mod value;

pub use command::{CommandDescriptor, CommandHandler, CommandSpec, ParamSpec};
pub use console::{ConsoleIo, EditorInput, ReaderInput, UserInput};
pub use error::{Result, ShellError};
pub use factory::ShellFactory;
pub use io_adapters::SharedBuffer;
pub use lexer::Token;
pub use output::Output;
pub use shell::{CommandContext, LineSource, Shell, ShellConfig};
pub use value::{ArgumentsExt, CustomType, CustomValue, Value, ValueType};
