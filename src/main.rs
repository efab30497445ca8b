use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as ClapParser;
use clap::Subcommand;

use loxen::ast_printer::AstPrinter;
use loxen::context::LoxContext;
use loxen::interpreter::Interpreter;
use loxen::resolver::Resolver;
use loxen::scanner::Scanner;
use loxen::source::{parse_source, FileSourceResolver};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes the provided input from a given valid filepath
    Tokenize { filename: PathBuf },

    /// Parses the provided input and prints the syntax tree
    Parse { filename: PathBuf },

    /// Runs a script
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.commands {
        Commands::Tokenize { filename } => tokenize(&filename)?,

        Commands::Parse { filename } => parse(&filename)?,

        Commands::Run { filename } => run_file(&filename)?,

        Commands::Repl => repl()?,
    }

    Ok(())
}

fn tokenize(filename: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(filename)?;

    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(filename)?;

    let mut context = LoxContext::new();
    let program = parse_source(&source, &mut context);

    if context.had_error {
        process::exit(65);
    }

    let printer = AstPrinter;

    for stmt in &program {
        println!("{}", printer.print_stmt(stmt));
    }

    Ok(())
}

fn run_file(filename: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(filename)?;

    let mut context = LoxContext::new();
    let program = parse_source(&source, &mut context);

    if context.had_error {
        process::exit(65);
    }

    let mut interpreter = Interpreter::new();
    let mut sources = FileSourceResolver::for_script(filename);

    Resolver::new(&mut context, &mut interpreter, &mut sources).resolve(&program);

    if context.had_error {
        process::exit(65);
    }

    if let Err(error) = interpreter.interpret(&program) {
        context.report_runtime(&error);
        process::exit(70);
    }

    Ok(())
}

/// Line-at-a-time session sharing one interpreter, so definitions persist
/// across prompts. Error latches reset between prompts.
fn repl() -> anyhow::Result<()> {
    let mut context = LoxContext::new();
    let mut interpreter = Interpreter::new();

    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();

        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        context.reset();

        let program = parse_source(&line, &mut context);

        if context.had_error {
            continue;
        }

        let mut sources = FileSourceResolver::new(".");

        Resolver::new(&mut context, &mut interpreter, &mut sources).resolve(&program);

        if context.had_error {
            continue;
        }

        if let Err(error) = interpreter.interpret(&program) {
            context.report_runtime(&error);
        }
    }

    Ok(())
}
