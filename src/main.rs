use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use mlscript::ast_printer::AstPrinter;
use mlscript::error::MlError;
use mlscript::interpreter::{Interpreter, STACK_SIZE};
use mlscript::parser::parse_source;
use mlscript::scanner::Scanner;
use mlscript::token::Token;
use mlscript::value::Value;

#[derive(ClapParser, Debug)]
#[command(version, about = "mlscript language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to the log file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is given
    #[arg(long, global = true, default_value = "mlscript.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as an mlscript program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(path: &PathBuf) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'mlscript::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("mlscript::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] {} - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Lex and parse failures exit with 65, everything else with 70.
fn exit_code(err: &MlError) -> i32 {
    if err.is_static() {
        65
    } else {
        70
    }
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }

                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        std::process::exit(65);
    }

    info!("Tokenization completed successfully");

    Ok(())
}

/// Net count of open `{`, `(` and `[` outside string literals.
fn open_delimiters(source: &str) -> i64 {
    let mut depth: i64 = 0;
    let mut in_string = false;

    for line in source.lines() {
        let code: &str = match (in_string, line.find("//")) {
            (false, Some(at)) if !line[..at].contains('"') => &line[..at],
            _ => line,
        };

        for c in code.chars() {
            match c {
                '"' => in_string = !in_string,
                '{' | '(' | '[' if !in_string => depth += 1,
                '}' | ')' | ']' if !in_string => depth -= 1,
                _ => {}
            }
        }
    }

    depth
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut pending = String::new();

    loop {
        print!("{}", if pending.is_empty() { "mlscript> " } else { "...> " });
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line: String = line.context("Failed to read from stdin")?;

        if pending.is_empty() && matches!(line.trim(), "exit" | "quit") {
            break;
        }

        pending.push_str(&line);
        pending.push('\n');

        // Keep reading until every block opened so far is closed.
        if open_delimiters(&pending) > 0 {
            continue;
        }

        let source: String = std::mem::take(&mut pending);

        match interpreter.run(&source) {
            Ok(Value::None) => {}
            Ok(value) => println!("{}", value.repr()),
            Err(e) => {
                debug!("REPL debug: {}", e);
                println!("Error: {}", e);
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
        init_logger(&args.log_file)?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    // Deep recursion in a script needs more stack than the main thread has.
    let worker = std::thread::Builder::new()
        .name("mlscript".to_owned())
        .stack_size(STACK_SIZE)
        .spawn(move || execute(args.commands))
        .context("Failed to start the interpreter thread")?;

    worker
        .join()
        .map_err(|_| anyhow::anyhow!("Interpreter thread panicked"))?
}

fn execute(commands: Commands) -> Result<()> {
    match commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else { no_input() };

            info!("Running Tokenize subcommand");
            let source = read_file(filename)?;

            tokenize(&source, json)?;
        }

        Commands::Parse { filename } => {
            let Some(filename) = filename else { no_input() };

            info!("Running Parse subcommand");
            let source = read_file(filename)?;

            match parse_source(&source) {
                Ok(statements) => {
                    info!("Parsed {} statements", statements.len());

                    for stmt in &statements {
                        let printed = AstPrinter::print_stmt(stmt);

                        debug!("AST: {}", printed);
                        println!("{}", printed);
                    }
                }

                Err(e) => {
                    debug!("Parse debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => {
            let Some(filename) = filename else { no_input() };

            info!("Running Run subcommand");
            let source = read_file(filename)?;
            info!("Provided input:\n {}", source);

            let mut interpreter = Interpreter::new();

            match interpreter.run(&source) {
                Ok(_) => {
                    info!("Program executed successfully");
                }

                Err(e) => {
                    debug!("Run debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(exit_code(&e));
                }
            }
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_depth_ignores_strings_and_comments() {
        assert_eq!(open_delimiters("fun f() {"), 1);
        assert_eq!(open_delimiters("print(\"{\")"), 0);
        assert_eq!(open_delimiters("x = 1 // {"), 0);
        assert_eq!(open_delimiters("if (x) {\n print(x)\n}"), 0);
    }

    #[test]
    fn static_errors_exit_with_65() {
        assert_eq!(exit_code(&MlError::parse(1, "bad")), 65);
        assert_eq!(exit_code(&MlError::runtime(1, "bad")), 70);
    }
}
