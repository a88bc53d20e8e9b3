//! rbparse: syntax checker for Ruby 1.8 sources.
//!
//! Usage:
//!   rbparse [options] [file...]
//!   rbparse -e 'code'

use clap::Parser as ClapParser;
use rayon::prelude::*;
use rbparse_core::ParserArena;
use rbparse_diagnostics::{Diagnostic, SyntaxError, Warnings};
use rbparse_options::ParserOptions;
use rbparse_parser::{ParserConfiguration, ParserPool, RubyTables};
use std::io::IsTerminal;
use std::process;
use std::time::Instant;

#[derive(ClapParser, Debug)]
#[command(name = "rbparse", about = "rbparse - Ruby 1.8 syntax checker", disable_version_flag = true)]
struct Cli {
    /// Ruby files to check.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Check CODE instead of files.
    #[arg(short = 'e', value_name = "CODE")]
    code: Option<String>,

    /// Number of the first source line.
    #[arg(long = "line", value_name = "N")]
    line: Option<u32>,

    /// Keep a newline marker before every statement.
    #[arg(long = "extra-positions")]
    extra_positions: bool,

    /// Report verbose-only warnings.
    #[arg(short = 'w')]
    warnings: bool,

    /// Print the syntax tree as an s-expression.
    #[arg(long = "dump-ast")]
    dump_ast: bool,

    /// Path to a JSON options file.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<String>,

    /// Print parse table statistics.
    #[arg(long = "table-stats")]
    table_stats: bool,

    /// Log table generation and timing details.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Print the version.
    #[arg(long)]
    version: bool,
}

const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One source to check.
struct Input {
    name: String,
    text: String,
    inline: bool,
}

/// What checking one source produced, rendered before its arena is dropped.
struct Outcome {
    name: String,
    source: String,
    warnings: Vec<Diagnostic>,
    sexp: Option<String>,
    error: Option<SyntaxError>,
}

/// A syntax error with the source it points into, for miette rendering.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
struct Report {
    message: String,
    #[source_code]
    source_code: miette::NamedSource<String>,
    #[label("here")]
    span: Option<miette::SourceSpan>,
    #[help]
    help: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if cli.version {
        println!("rbparse {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let start = Instant::now();

    if cli.table_stats {
        match RubyTables::get() {
            Ok(tables) => {
                let stats = &tables.tables.stats;
                println!("states: {}", stats.states);
                println!("productions: {}", stats.productions);
                println!("shift/reduce conflicts: {}", stats.shift_reduce);
                println!("reduce/reduce conflicts: {}", stats.reduce_reduce);
                println!("table size: {}", stats.table_size);
            }
            Err(e) => {
                print_error(&format!("grammar error: {}", e));
                return 2;
            }
        }
        if cli.files.is_empty() && cli.code.is_none() {
            return 0;
        }
    }

    let options = match cli.config {
        Some(ref path) => match rbparse_options::load_options(path) {
            Ok(options) => options,
            Err(e) => {
                print_error(&e.to_string());
                return 2;
            }
        },
        None => ParserOptions::default(),
    };
    let config = configuration(cli, &options);

    let inputs = match read_inputs(cli) {
        Ok(inputs) => inputs,
        Err(message) => {
            print_error(&message);
            return 2;
        }
    };
    if inputs.is_empty() {
        print_error("No input files.");
        return 2;
    }

    let pool = ParserPool::new();
    let outcomes: Vec<Outcome> = inputs
        .into_par_iter()
        .map(|input| check(&pool, input, &config, cli.dump_ast))
        .collect();

    let many = outcomes.len() > 1;
    let mut failed = 0;
    for outcome in outcomes {
        for warning in &outcome.warnings {
            eprintln!("{}", warning);
        }
        if let Some(ref sexp) = outcome.sexp {
            println!("{}", sexp);
        }
        match outcome.error {
            Some(error) => {
                failed += 1;
                let report = render(&outcome.name, outcome.source, &error);
                eprintln!("{:?}", miette::Report::new(report));
            }
            None if many => println!("{}: Syntax OK", outcome.name),
            None => println!("Syntax OK"),
        }
    }

    log::debug!("checked in {:.2?}", start.elapsed());
    if failed > 0 {
        1
    } else {
        0
    }
}

/// Options file settings, overridden by command-line flags.
fn configuration(cli: &Cli, options: &ParserOptions) -> ParserConfiguration {
    let mut options = options.clone();
    if let Some(line) = cli.line {
        options.line_number = Some(line.max(1));
    }
    if cli.extra_positions {
        options.extra_position_information = Some(true);
    }
    if cli.warnings {
        options.verbose = Some(true);
    }
    options.to_configuration()
}

fn read_inputs(cli: &Cli) -> Result<Vec<Input>, String> {
    let mut inputs = Vec::with_capacity(cli.files.len() + 1);
    if let Some(ref code) = cli.code {
        inputs.push(Input {
            name: "-e".to_string(),
            text: code.clone(),
            inline: true,
        });
    }
    for file in &cli.files {
        let text = std::fs::read_to_string(file).map_err(|e| format!("can't read {}: {}", file, e))?;
        inputs.push(Input {
            name: file.clone(),
            text,
            inline: false,
        });
    }
    Ok(inputs)
}

fn check(pool: &ParserPool, input: Input, config: &ParserConfiguration, dump_ast: bool) -> Outcome {
    let mut parser = pool.acquire();
    let arena = ParserArena::new();
    let mut sink = Warnings::new(config.verbose);
    let config = if input.inline && !config.inline_source {
        config.clone().with_inline_source(true)
    } else {
        config.clone()
    };

    let (sexp, error) = match parser.parse(&input.name, &input.text, &config, &mut sink, &arena) {
        Ok(result) => {
            log::debug!(
                "{}: {} nodes, locals {:?}",
                parser.interner().display(result.ast.span.file),
                rbparse_ast::visitor::count_nodes(result.ast),
                result.visible_variable_names()
            );
            (dump_ast.then(|| rbparse_ast::dump::to_sexp(result.ast)), None)
        }
        Err(error) => (None, Some(error)),
    };
    pool.release(parser);

    Outcome {
        name: input.name,
        source: input.text,
        warnings: sink.into_collection().into_diagnostics(),
        sexp,
        error,
    }
}

fn render(name: &str, source: String, error: &SyntaxError) -> Report {
    let span = error.span.map(|span| clamp_span(span.to_range(), source.len()));
    let help = match error.expected.len() {
        0 => None,
        _ => Some(format!("expected {}", error.expected.join(", "))),
    };
    Report {
        message: format!("{}:{}: {}", error.file, error.line, error.message),
        source_code: miette::NamedSource::new(name, source),
        span,
        help,
    }
}

/// A span inside `len` bytes, at least one byte wide when the source allows.
fn clamp_span(range: std::ops::Range<usize>, len: usize) -> miette::SourceSpan {
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    let width = if end == start && start < len { 1 } else { end - start };
    (start, width).into()
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}{}error{}{}: {}", BOLD, RED, RESET, BOLD, msg);
        eprint!("{}", RESET);
    } else {
        eprintln!("error: {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(text: &str) -> Input {
        Input {
            name: "-e".to_string(),
            text: text.to_string(),
            inline: true,
        }
    }

    #[test]
    fn test_check_valid_source() {
        let pool = ParserPool::new();
        let outcome = check(&pool, inline("x = 1\nputs x"), &ParserConfiguration::default(), true);
        assert!(outcome.error.is_none());
        assert!(outcome.sexp.is_some());
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_check_reports_error_with_span() {
        let pool = ParserPool::new();
        let outcome = check(&pool, inline("def f\n  1\nend\nend"), &ParserConfiguration::default(), false);
        let error = outcome.error.as_ref().unwrap();
        assert_eq!(error.line, 4);
        let report = render(&outcome.name, outcome.source.clone(), error);
        assert!(report.message.starts_with("-e:4:"));
        assert!(report.span.is_some());
    }

    #[test]
    fn test_cli_flags_override_options() {
        let cli = Cli::parse_from(["rbparse", "--line", "5", "-w", "--extra-positions", "a.rb"]);
        let options = rbparse_options::parse_options(r#"{ "lineNumber": 2, "verbose": false }"#).unwrap();
        let config = configuration(&cli, &options);
        assert_eq!(config.line_number, 4);
        assert!(config.verbose);
        assert!(config.extra_position_information);
        assert_eq!(cli.files, vec!["a.rb".to_string()]);
    }

    #[test]
    fn test_clamp_span() {
        assert_eq!(clamp_span(3..3, 10), miette::SourceSpan::from((3, 1)));
        assert_eq!(clamp_span(8..20, 10), miette::SourceSpan::from((8, 2)));
        assert_eq!(clamp_span(12..12, 10), miette::SourceSpan::from((10, 0)));
    }
}
