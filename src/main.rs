use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::natives;
use rox::parser::Parser;
use rox::scanner::{self, Scanner};
use rox::token::Token;

/// Exit status for lexical, syntax and resolution errors.
const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for runtime errors.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Rox language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints every statement in prefix form
    Parse { filename: PathBuf },

    /// Runs input from a file as a Rox program
    Run { filename: PathBuf },
}

/// Reads the contents of a file into a String
fn read_source(path: &Path) -> Result<String> {
    info!("Reading file: {:?}", path);

    let file = File::open(path).with_context(|| format!("Failed to open file {:?}", path))?;
    let mut reader = BufReader::new(file);
    let mut buf: Vec<u8> = Vec::new();

    let bytes: usize = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", path))?;

    let source: String = String::from_utf8(buf)
        .map_err(|e| LoxError::from(e.utf8_error()))
        .with_context(|| format!("{:?} is not valid UTF-8", path))?;

    info!("Read {} bytes from {:?}", bytes, path);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn exit_code(error: &LoxError) -> i32 {
    if error.is_static() {
        EXIT_STATIC_ERROR
    } else {
        EXIT_RUNTIME_ERROR
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source: String = read_source(filename)?;
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut failure: Option<LoxError> = None;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => failure = Some(e),
        }
    }

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    if let Some(e) = failure {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        println!("{}", e);
        process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");

    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source: String = read_source(filename)?;

    let tokens: Vec<Token<'_>> = match scanner::scan(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("{}", e);
            process::exit(EXIT_STATIC_ERROR);
        }
    };

    let (statements, errors) = Parser::new(&tokens).parse_recovering();

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    if !errors.is_empty() {
        for e in &errors {
            println!("{}", e);
        }
        debug!(
            "{} parse error(s), exiting with code {}",
            errors.len(),
            EXIT_STATIC_ERROR
        );
        process::exit(EXIT_STATIC_ERROR);
    }

    info!("Parse subcommand completed");

    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    let source: String = read_source(filename)?;

    let mut interpreter = Interpreter::new();
    natives::register_defaults(&mut interpreter);

    if let Err(e) = rox::run(&source, &mut interpreter) {
        debug!("Run failed: {}", e);
        println!("{}", e);
        process::exit(exit_code(&e));
    }

    info!("Program executed successfully");

    Ok(())
}

/// Read‑eval‑print loop.  Globals persist between lines; `exit` quits.
fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    natives::register_defaults(&mut interpreter);

    let stdin = io::stdin();
    let mut lines = stdin.lock();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read: usize = lines
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        // EOF
        if read == 0 {
            println!();
            break;
        }

        let line: &str = line.trim();

        match line {
            "exit" => break,
            "" => continue,
            _ => {
                if let Err(e) = rox::run(line, &mut interpreter) {
                    println!("{}", e);
                }
            }
        }
    }

    info!("REPL finished");

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match (args.command, args.file) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json),
        (Some(Commands::Parse { filename }), _) => parse(&filename),
        (Some(Commands::Run { filename }), _) | (None, Some(filename)) => run_file(&filename),
        (None, None) => repl(),
    }
}
