use std::fs;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing::Level;

use mhtml_view::env::{self, EnvVar};
use mhtml_view::{MhtmlError, MhtmlOptions, Result, Session};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Convert an MHTML web archive into a self-contained HTML document
#[derive(Parser, Debug)]
#[command(name = "mhtml-view", version, about)]
struct Cli {
    /// Path to the .mht/.mhtml archive
    #[arg(required_unless_present = "env_help")]
    archive: Option<String>,

    /// Write the rewritten HTML to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// List cached resources (key, content type, size) instead of printing HTML
    #[arg(short, long)]
    list: bool,

    /// URL path prefix for rewritten resource references
    #[arg(long, value_name = "PATH")]
    prefix: Option<String>,

    /// Maximum number of nested multipart levels
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Describe the environment variables that configure conversion and exit
    #[arg(long)]
    env_help: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.env_help {
        print!("{}", env::generate_env_docs());
        return;
    }

    init_logging(&cli);

    if let Err(err) = run(&cli) {
        match (&err, cli.archive.as_deref()) {
            (MhtmlError::Config(_), _) | (_, None) => {
                eprintln!("{ANSI_COLOR_RED}Error: {err}{ANSI_COLOR_RESET}")
            }
            (_, Some(archive)) => {
                eprintln!("{ANSI_COLOR_RED}Error: {archive}: {err}{ANSI_COLOR_RESET}")
            }
        }
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        match env::core::LogLevel::get().as_deref() {
            Ok("trace") => Level::TRACE,
            Ok("debug") => Level::DEBUG,
            Ok("warn") => Level::WARN,
            Ok("error") => Level::ERROR,
            _ => Level::INFO,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut options = MhtmlOptions::from_env()?;
    if let Some(prefix) = &cli.prefix {
        options.resource_prefix = env::archive::ResourcePrefix::parse(prefix)?;
    }
    if let Some(max_depth) = cli.max_depth {
        options.max_depth = env::archive::MaxDepth::parse(&max_depth.to_string())?;
    }

    // clap 保证未传 --env-help 时一定有归档参数
    let Some(archive) = cli.archive.as_deref() else {
        return Ok(());
    };
    let session = Session::new(options);
    let report = session.parse(archive)?;

    let mut stdout = io::stdout().lock();

    if cli.list {
        for key in report.resource_keys.iter().chain(std::iter::once(&report.html_key)) {
            if let Some(resource) = session.cache_get(key) {
                writeln!(
                    stdout,
                    "{}\t{}\t{}",
                    key,
                    resource.content_type,
                    resource.content.len()
                )?;
            }
        }
        return Ok(());
    }

    let Some(html) = session.cache_get(&report.html_key) else {
        return Err(MhtmlError::HtmlNotFound);
    };

    match cli.output.as_deref() {
        Some(path) if path != "-" => fs::write(path, &html.content)?,
        _ => stdout.write_all(&html.content)?,
    }
    Ok(())
}
