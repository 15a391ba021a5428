use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use formula_vba_syntax::{
    parse_module_bytes, print_module, tokenize, ModuleKind, ParseOptions, ParsedModule,
};

#[derive(Debug, Parser)]
#[command(name = "vba-syntax")]
#[command(about = "Tokenize, parse, check and reformat VBA modules (.bas / .cls / .frm).")]
struct Cli {
    /// Log parser recovery decisions. `RUST_LOG` overrides this.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Emit the token stream (comments included) as a JSON array.
    Tokens(TokensArgs),
    /// Emit `{ module, diagnostics }` as JSON.
    Parse(ParseArgs),
    /// Print one line per diagnostic; exit status 1 when any input has errors.
    Check(CheckArgs),
    /// Print the module back out through the source printer.
    Fmt(FmtArgs),
}

#[derive(Debug, Parser)]
struct TokensArgs {
    /// Source file, or `-` for stdin.
    input: PathBuf,
}

#[derive(Debug, Parser)]
struct ModuleArgs {
    /// Treat the input as this kind of module instead of deriving it from the header.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

#[derive(Debug, Parser)]
struct ParseArgs {
    /// Source file, or `-` for stdin.
    input: PathBuf,

    /// Indent the JSON output.
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    module: ModuleArgs,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// Source files; `-` reads stdin.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    module: ModuleArgs,
}

#[derive(Debug, Parser)]
struct FmtArgs {
    /// Source file, or `-` for stdin.
    input: PathBuf,

    #[command(flatten)]
    module: ModuleArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Standard,
    Class,
    Form,
}

impl ModuleArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            module_kind: self.kind.map(|kind| match kind {
                KindArg::Standard => ModuleKind::Standard,
                KindArg::Class => ModuleKind::Class,
                KindArg::Form => ModuleKind::Form,
            }),
            ..ParseOptions::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(status) => std::process::exit(status),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Runs one subcommand and returns the process exit status.
fn run(command: Command) -> Result<i32> {
    match command {
        Command::Tokens(args) => {
            let bytes = read_input(&args.input)?;
            let source = String::from_utf8(bytes)
                .with_context(|| format!("{} is not valid UTF-8", display_name(&args.input)))?;
            let tokens = tokenize(&source);
            log::debug!("{}: {} tokens", display_name(&args.input), tokens.len());
            emit(&serde_json::to_string(&tokens)?)?;
            Ok(0)
        }
        Command::Parse(args) => {
            let parsed = parse_input(&args.input, &args.module.options())?;
            let json = if args.pretty {
                serde_json::to_string_pretty(&parsed)?
            } else {
                serde_json::to_string(&parsed)?
            };
            emit(&json)?;
            Ok(0)
        }
        Command::Check(args) => {
            let options = args.module.options();
            let mut report = String::new();
            let mut failed = false;
            for input in &args.inputs {
                let name = display_name(input);
                let parsed = match parse_input(input, &options) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        eprintln!("{name}: {err:#}");
                        failed = true;
                        continue;
                    }
                };
                log::debug!("{name}: {} diagnostics", parsed.diagnostics.len());
                for diagnostic in &parsed.diagnostics {
                    report.push_str(&format!("{name}:{diagnostic}\n"));
                }
                failed |= parsed.has_errors();
            }
            emit_raw(&report)?;
            Ok(i32::from(failed))
        }
        Command::Fmt(args) => {
            let parsed = parse_input(&args.input, &args.module.options())?;
            if parsed.has_errors() {
                log::warn!(
                    "{}: module has syntax errors; failed statements are printed as written",
                    display_name(&args.input)
                );
            }
            emit_raw(&print_module(&parsed.module))?;
            Ok(i32::from(parsed.has_errors()))
        }
    }
}

fn parse_input(input: &Path, options: &ParseOptions) -> Result<ParsedModule> {
    let bytes = read_input(input)?;
    parse_module_bytes(&bytes, options).with_context(|| format!("cannot parse {}", display_name(input)))
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))
    }
}

fn display_name(input: &Path) -> String {
    if input == Path::new("-") {
        "<stdin>".to_string()
    } else {
        input.display().to_string()
    }
}

fn emit(json: &str) -> Result<()> {
    emit_raw(&format!("{json}\n"))
}

/// A closed stdout (`vba-syntax parse big.bas | head`) is not an error.
fn emit_raw(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("failed to write to stdout"),
    }
}
