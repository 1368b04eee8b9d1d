use std::{io::Write, rc::Rc};

use clap::{Args, Parser, Subcommand};
use pentagram::{
    builtins::base_environment,
    interpreter::{interpret, Binding, Call, Environment, Stack},
    parser::parse,
};

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interpret a file, then call its entry point if one is bound.
    Run(RunArgs),
    Repl,
    /// Print a file in canonical form.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    file: String,
    #[arg(long, default_value = "main")]
    entry: String,
}

#[derive(Debug, Args)]
struct ParseArgs {
    file: String,
}

#[derive(Debug, thiserror::Error)]
enum InterpretError {
    #[error(transparent)]
    Parse(#[from] pentagram::parser::ParseError),
    #[error(transparent)]
    Execution(#[from] pentagram::interpreter::ExecutionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Top level left values on the stack: {0}")]
    LeftoverValues(Stack),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let args = Cli::parse();

    let result = match args.command() {
        Command::Repl => repl_command(),
        Command::Run(args) => run_command(args),
        Command::Parse(args) => parse_command(args),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn repl_command() -> Result<(), InterpretError> {
    println!("Welcome to the Pentagram REPL!");
    println!("End a line with a space to continue it on the next.");
    println!("EOF to exit. (Ctrl+D on *nix, Ctrl+Z on Windows)");

    let environment = base_environment().extend();
    let mut source = String::new();

    loop {
        print!("{}", if source.is_empty() { "> " } else { "| " });
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim_end_matches(['\n', '\r']);
        source.push_str(line);
        if line.ends_with(' ') {
            source.push('\n');
            continue;
        }

        let mut stack = Stack::new();
        match evaluate(&source, &mut stack, &environment) {
            Ok(()) if stack.is_empty() => {}
            Ok(()) => println!("{stack}"),
            Err(e) => println!("Error: {e}"),
        }
        source.clear();
    }

    Ok(())
}

fn run_command(args: &RunArgs) -> Result<(), InterpretError> {
    let source = std::fs::read_to_string(&args.file)?;
    let stack = run_source(&source, &args.entry, &base_environment().extend())?;
    if !stack.is_empty() {
        println!("{stack}");
    }
    Ok(())
}

/// Interprets `source`, which must leave the stack empty, then calls `entry`
/// on a fresh stack if it is bound to a guest call. Returns the entry's stack.
fn run_source(
    source: &str,
    entry: &str,
    environment: &Environment,
) -> Result<Stack, InterpretError> {
    let mut stack = Stack::new();
    evaluate(source, &mut stack, environment)?;
    if !stack.is_empty() {
        return Err(InterpretError::LeftoverValues(stack));
    }

    if let Some(Binding::Call(Call::Guest(call))) = environment.get(entry) {
        tracing::debug!(entry, "calling entry point");
        interpret(call.block, &mut stack, &call.environment.extend())?;
    }
    Ok(stack)
}

fn parse_command(args: &ParseArgs) -> Result<(), InterpretError> {
    let source = std::fs::read_to_string(&args.file)?;
    print!("{}", parse(&source)?);
    Ok(())
}

fn evaluate(
    source: &str,
    stack: &mut Stack,
    environment: &Environment,
) -> Result<(), InterpretError> {
    let block = parse(source)?;
    interpret(Rc::new(block), stack, environment)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use pentagram::{builtins::base_environment_with_output, interpreter::Value, number::Number};

    use super::*;

    #[test]
    fn test_entry_runs_on_fresh_stack() {
        let output = Rc::new(RefCell::new(Vec::<u8>::new()));
        let environment = base_environment_with_output(output.clone()).extend();
        let source = "main >>\n  cout 0 arr 33b add write\n  1 2";
        let stack = run_source(source, "main", &environment).unwrap();
        assert_eq!(
            stack.values(),
            &[Value::Number(Number::I32(1)), Value::Number(Number::I32(2))]
        );
        assert_eq!(output.take(), b"!".to_vec());
    }

    #[test]
    fn test_top_level_must_leave_stack_empty() {
        let environment = base_environment_with_output(Rc::new(RefCell::new(Vec::<u8>::new())));
        let source = "7\nmain >> 1";
        assert!(matches!(
            run_source(source, "main", &environment.extend()),
            Err(InterpretError::LeftoverValues(stack)) if stack.len() == 1
        ));
    }

    #[test]
    fn test_missing_entry_is_skipped() {
        let environment = base_environment_with_output(Rc::new(RefCell::new(Vec::<u8>::new())));
        let stack = run_source("x = 1", "start", &environment.extend()).unwrap();
        assert!(stack.is_empty());
    }
}
