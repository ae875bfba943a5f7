mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use mdnb::config::language_set;
use mdnb::{ConvertOptions, MarkerStyle, Notebook};
use validator::{CheckOptions, CheckerKind, ValidationReport};

use crate::config::Config;

const SUBCOMMANDS: &[&str] = &["convert", "check", "segments", "test", "help"];

#[derive(Parser)]
#[command(name = "mdnb", version, about = "Markdown to Jupyter notebook converter")]
struct Cli {
    /// Configuration file (TOML). Defaults to ./mdnb.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a Markdown file to a notebook
    Convert(ConvertArgs),

    /// Check the syntax of code blocks in a Markdown file or notebook
    Check(CheckArgs),

    /// Print the extracted segments of a Markdown file
    Segments(SegmentsArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum MarkerStyleArg {
    CellMagic,
    Metadata,
}

#[derive(Clone, Copy, ValueEnum)]
enum CheckerArg {
    TreeSitter,
    Interpreter,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Markdown file to convert
    input: PathBuf,

    /// Output notebook path (default: input with .ipynb extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not prepend the setup cell
    #[arg(long)]
    no_setup: bool,

    /// Do not generate a table of contents
    #[arg(long)]
    no_toc: bool,

    /// Fence tags to run through the shell, replacing the configured set. Repeatable.
    #[arg(long = "shell-lang")]
    shell_lang: Vec<String>,

    /// Where the shell marker goes
    #[arg(long, value_enum)]
    marker_style: Option<MarkerStyleArg>,

    /// Prefix each cell with a comment naming its source line
    #[arg(long)]
    anchors: bool,

    /// Don't print statistics
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markdown file or .ipynb notebook
    file: PathBuf,

    /// Fence tags to check, replacing the configured set. Repeatable.
    #[arg(long)]
    lang: Vec<String>,

    /// Syntax checker to use
    #[arg(long, value_enum)]
    checker: Option<CheckerArg>,

    /// Interpreter program for --checker interpreter
    #[arg(long)]
    interpreter: Option<String>,

    /// Parse >>> transcripts as written instead of stripping prompts
    #[arg(long)]
    keep_prompts: bool,

    /// Also render each failure as a source diagnostic on stderr
    #[arg(long)]
    diagnostics: bool,
}

#[derive(clap::Args)]
struct SegmentsArgs {
    /// Markdown file to split
    file: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let args = inject_default_command(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Command::Convert(args) => do_convert(args, config.convert, color_choice),
        Command::Check(args) => do_check(args, config.check, color_choice),
        Command::Segments(args) => do_segments(args, color_choice),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

/// `mdnb file.md` means `mdnb convert file.md`: insert "convert" before the
/// first positional argument unless it already names a subcommand.
fn inject_default_command(mut args: Vec<String>) -> Vec<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            if !SUBCOMMANDS.contains(&arg) {
                args.insert(i, "convert".to_string());
            }
            break;
        }
    }
    args
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn emit(files: &SimpleFiles<String, String>, diagnostic: &Diagnostic<usize>, color: ColorChoice) {
    let writer = StandardStream::stderr(color);
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, diagnostic);
}

/// Read and split a Markdown file, rendering extraction errors. `None` means
/// the caller should exit with a failure.
fn load_document(
    path: &Path,
    color: ColorChoice,
) -> Option<(SimpleFiles<String, String>, usize, mdnb::Document)> {
    let source = match mdnb::read_source(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: {}", e);
            return None;
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), source.clone());

    match mdnb::Parser::new(source, file_id).parse() {
        Ok(document) => Some((files, file_id, document)),
        Err(error) => {
            emit(&files, &error.to_diagnostic(), color);
            None
        }
    }
}

fn do_convert(args: ConvertArgs, mut options: ConvertOptions, color: ColorChoice) -> i32 {
    if args.no_setup {
        options.include_setup_cell = false;
    }
    if args.no_toc {
        options.include_toc = false;
    }
    if !args.shell_lang.is_empty() {
        let langs: Vec<&str> = args.shell_lang.iter().map(String::as_str).collect();
        options.shell_languages = language_set(&langs);
    }
    if let Some(style) = args.marker_style {
        options.marker_style = match style {
            MarkerStyleArg::CellMagic => MarkerStyle::CellMagic,
            MarkerStyleArg::Metadata => MarkerStyle::Metadata,
        };
    }
    if args.anchors {
        options.source_anchors = true;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("ipynb"));
    if !args.quiet {
        println!("Converting {} to {}", args.input.display(), output.display());
    }

    let notebook = match mdnb::convert_file(&args.input, &output, &options) {
        Ok(notebook) => notebook,
        Err(mdnb::Error::Extract(error)) => {
            // The parser numbered the source as file 0; re-read it for rendering.
            match mdnb::read_source(&args.input) {
                Ok(source) => {
                    let mut files = SimpleFiles::new();
                    files.add(args.input.display().to_string(), source);
                    emit(&files, &error.to_diagnostic(), color);
                }
                Err(_) => eprintln!("error: {}", error),
            }
            return 1;
        }
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    if !args.quiet {
        println!("Notebook created: {}", output.display());
        println!("Statistics:");
        println!("{}", notebook.stats());
    }
    0
}

fn do_check(args: CheckArgs, mut options: CheckOptions, color: ColorChoice) -> i32 {
    if !args.lang.is_empty() {
        let langs: Vec<&str> = args.lang.iter().map(String::as_str).collect();
        options.languages = language_set(&langs);
    }
    if let Some(checker) = args.checker {
        options.checker = match checker {
            CheckerArg::TreeSitter => CheckerKind::TreeSitter,
            CheckerArg::Interpreter => CheckerKind::Interpreter,
        };
    }
    if let Some(interpreter) = args.interpreter.clone() {
        options.interpreter = interpreter;
    }
    if args.keep_prompts {
        options.strip_prompts = false;
    }
    let checker = options.build_checker();
    let display_name = args.file.display().to_string();

    let is_notebook = args
        .file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ipynb"));

    let (report, files) = if is_notebook {
        let notebook = match Notebook::read(&args.file) {
            Ok(notebook) => notebook,
            Err(e) => {
                eprintln!("error: {}", e);
                return 1;
            }
        };
        (
            validator::validate_notebook(&notebook, &options, checker.as_ref()),
            None,
        )
    } else {
        let Some((files, file_id, document)) = load_document(&args.file, color) else {
            return 1;
        };
        (
            validator::validate(&document.segments, &options, checker.as_ref()),
            Some((files, file_id)),
        )
    };

    let report: ValidationReport = match report {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    println!("{}", report.display(&display_name));

    if args.diagnostics {
        if let Some((files, file_id)) = &files {
            for entry in report.failures() {
                if let Some(diagnostic) = entry.to_diagnostic(*file_id) {
                    emit(files, &diagnostic, color);
                }
            }
        }
    }

    if report.passed() { 0 } else { 1 }
}

fn do_segments(args: SegmentsArgs, color: ColorChoice) -> i32 {
    let Some((_files, _, document)) = load_document(&args.file, color) else {
        return 1;
    };
    for (index, segment) in document.segments.iter().enumerate() {
        let language = if segment.language.is_empty() {
            "-"
        } else {
            segment.language.as_str()
        };
        println!(
            "{:>4}  {:<5}  {:>5}-{:<5}  {}",
            index,
            segment.kind.as_str(),
            segment.start_line,
            segment.end_line,
            if segment.is_code() { language } else { "" }
        );
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_file_means_convert() {
        assert_eq!(
            inject_default_command(args(&["mdnb", "README.md"])),
            args(&["mdnb", "convert", "README.md"])
        );
    }

    #[test]
    fn config_value_is_not_the_file() {
        assert_eq!(
            inject_default_command(args(&["mdnb", "--config", "x.toml", "-v", "guide.md"])),
            args(&["mdnb", "--config", "x.toml", "-v", "convert", "guide.md"])
        );
    }

    #[test]
    fn subcommands_are_left_alone() {
        let check = args(&["mdnb", "check", "guide.md"]);
        assert_eq!(inject_default_command(check.clone()), check);
        let version = args(&["mdnb", "--version"]);
        assert_eq!(inject_default_command(version.clone()), version);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
