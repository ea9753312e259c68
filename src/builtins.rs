use crate::command::{CommandHandler, CommandSpec};
use crate::value::{ArgumentsExt, Value, ValueType};
use log::debug;
use std::rc::Rc;

/// Commands controlling the shell itself, registered under `!`.
pub struct ShellBuiltins;

impl CommandHandler for ShellBuiltins {
    fn commands(self: Rc<Self>) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setDisplayTime", |ctx, args| {
                let display_time = args.bool_arg(0)?;
                debug!("Display of execution time: {display_time}");
                ctx.session.display_time = display_time;
                Ok(None)
            })
            .description("Turns command execution time display on and off")
            .named_param(
                "do-display-time",
                "true if you want display of command execution time",
                ValueType::Bool,
            ),
            CommandSpec::new("getLastException", |ctx, _| {
                Ok(ctx.session.last_exception.clone().map(Value::Error))
            })
            .description("Returns the last error that broke a command line"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandContext, Session, ShellConfig};
    use crate::table::CommandTable;
    use std::cell::RefCell;

    struct NoIo;

    impl crate::shell::LineSource for NoIo {
        fn read_line(&mut self, _: &[String]) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    impl crate::output::Output for NoIo {
        fn output(&mut self, _: &Value, _: &crate::output::OutputConversion) {}
        fn output_header(&mut self, _: Option<&str>) {}
        fn output_token_error(&mut self, _: &crate::lexer::Token, _: &str) {}
        fn output_error(&mut self, _: &(dyn std::error::Error + 'static)) {}
    }

    fn run(table: &CommandTable, session: &mut Session, line: &str, args: Vec<Value>) -> Option<Value> {
        let io = Rc::new(RefCell::new(NoIo));
        let config = ShellConfig {
            input: io.clone(),
            output: io,
            aux_handlers: Vec::new(),
            display_time: false,
            path: Vec::new(),
            app_name: String::new(),
        };
        let command = table.resolve(line, args.len()).unwrap();
        let mut context = CommandContext {
            table,
            config: &config,
            session,
        };
        command.invoke(&mut context, args).unwrap()
    }

    fn table() -> CommandTable {
        let mut table = CommandTable::default();
        for spec in Rc::new(ShellBuiltins).commands() {
            table.register("!", spec);
        }
        table
    }

    #[test]
    fn test_set_display_time() {
        let table = table();
        let mut session = Session::default();
        assert_eq!(
            run(&table, &mut session, "!set-display-time", vec![Value::Bool(true)]),
            None
        );
        assert!(session.display_time);
        run(&table, &mut session, "!sdt", vec![Value::Bool(false)]);
        assert!(!session.display_time);
    }

    #[test]
    fn test_get_last_exception() {
        let table = table();
        let mut session = Session::default();
        assert_eq!(run(&table, &mut session, "!get-last-exception", vec![]), None);

        let error = Rc::new(anyhow::anyhow!("boom"));
        session.last_exception = Some(Rc::clone(&error));
        assert_eq!(
            run(&table, &mut session, "!gle", vec![]),
            Some(Value::Error(error))
        );
    }
}
