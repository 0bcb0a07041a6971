use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser as ClapParser};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ahlelele_lang::vm::bytecode::{Executable, FormatError};
use ahlelele_lang::vm::disasm::{disassemble, render_listing, DisasmEntry};
use ahlelele_lang::{compile_source, run_executable, tokenize, Error};

#[derive(ClapParser)]
#[command(
    name = "ahlelele",
    version,
    about = "Compiles Ahlelele Ahlelas source code to a bytecode executable, or executes one"
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["input", "exec", "tokens", "disasm"])
))]
#[command(group(ArgGroup::new("listing").args(["tokens", "disasm"])))]
struct Cli {
    /// Source file to compile (requires --out)
    #[arg(long = "in", value_name = "SOURCE", requires = "output")]
    input: Option<PathBuf>,

    /// Executable file to write
    #[arg(long = "out", value_name = "EXECUTABLE", requires = "input")]
    output: Option<PathBuf>,

    /// Execute a compiled file
    #[arg(long, value_name = "EXECUTABLE")]
    exec: Option<PathBuf>,

    /// Display the token stream of a source file (debug)
    #[arg(long, value_name = "SOURCE")]
    tokens: Option<PathBuf>,

    /// List the instructions of a compiled file
    #[arg(long, value_name = "EXECUTABLE")]
    disasm: Option<PathBuf>,

    /// Emit JSON with --tokens or --disasm
    #[arg(long, requires = "listing")]
    json: bool,

    /// Log pipeline stages to stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

const MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB
const MAX_EXECUTABLE_SIZE: u64 = 64 * 1024 * 1024; // 64 MB

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.kind() == ErrorKind::DisplayVersion { 0 } else { 1 };
            let _ = err.print();
            process::exit(code);
        }
    };

    init_logging(cli.verbose);

    let result = match cli.mode() {
        Some(Mode::Compile { input, output }) => cmd_compile(&input, &output),
        Some(Mode::Exec(path)) => cmd_exec(&path),
        Some(Mode::Tokens { path, json }) => cmd_tokens(&path, json),
        Some(Mode::Disasm { path, json }) => cmd_disasm(&path, json),
        None => {
            let _ = Cli::command().print_help();
            process::exit(1);
        }
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    };
    process::exit(exit_code);
}

enum Mode {
    Compile { input: PathBuf, output: PathBuf },
    Exec(PathBuf),
    Tokens { path: PathBuf, json: bool },
    Disasm { path: PathBuf, json: bool },
}

impl Cli {
    fn mode(self) -> Option<Mode> {
        match self {
            Cli { input: Some(input), output: Some(output), .. } => {
                Some(Mode::Compile { input, output })
            }
            Cli { exec: Some(path), .. } => Some(Mode::Exec(path)),
            Cli { tokens: Some(path), json, .. } => Some(Mode::Tokens { path, json }),
            Cli { disasm: Some(path), json, .. } => Some(Mode::Disasm { path, json }),
            _ => None,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── File access ─────────────────────────────────────────────────────────

fn check_size(path: &Path, max: u64) -> Result<(), Error> {
    let meta = fs::metadata(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.len() > max {
        return Err(Error::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max,
        });
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String, Error> {
    check_size(path, MAX_SOURCE_SIZE)?;
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_executable(path: &Path) -> Result<Executable, Error> {
    check_size(path, MAX_EXECUTABLE_SIZE)?;
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Executable::read_from(BufReader::new(file))?)
}

fn write_executable(path: &Path, executable: &Executable) -> Result<(), Error> {
    let write_err = |source: io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    if let Err(e) = executable.write_to(BufWriter::new(file)) {
        // Leave nothing half-written behind
        let _ = fs::remove_file(path);
        return Err(match e {
            FormatError::Io(source) => write_err(source),
            other => other.into(),
        });
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Error> {
    let stdout_err = |source: io::Error| Error::Write {
        path: PathBuf::from("<stdout>"),
        source,
    };
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| stdout_err(e.into()))?;
    writeln!(out).map_err(stdout_err)
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_compile(input: &Path, output: &Path) -> Result<(), Error> {
    let source = read_source(input)?;
    let filename = input.to_string_lossy();

    let executable = compile_source(&source, &filename)?;
    write_executable(output, &executable)?;

    info!(bytes = executable.code.len(), "wrote executable");
    println!("Compilation successful: {}", output.display());
    Ok(())
}

fn cmd_exec(path: &Path) -> Result<(), Error> {
    let executable = read_executable(path)?;
    let report = run_executable(&executable, io::stdout().lock())?;
    debug!(
        instructions = report.instructions,
        halted = report.halted,
        "program exited"
    );
    Ok(())
}

fn cmd_tokens(path: &Path, json: bool) -> Result<(), Error> {
    let source = read_source(path)?;
    let tokens = tokenize(&source, &path.to_string_lossy())?;

    if json {
        return print_json(&tokens);
    }
    for tok in &tokens {
        println!("{}", tok);
    }
    Ok(())
}

#[derive(Serialize)]
struct Listing<'a> {
    bytes: usize,
    instructions: &'a [DisasmEntry],
}

fn cmd_disasm(path: &Path, json: bool) -> Result<(), Error> {
    let executable = read_executable(path)?;
    let entries = disassemble(&executable.code)?;

    if json {
        return print_json(&Listing {
            bytes: executable.code.len(),
            instructions: &entries,
        });
    }
    println!("{}: {} byte(s)", path.display(), executable.code.len());
    print!("{}", render_listing(&entries));
    Ok(())
}
