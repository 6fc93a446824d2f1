//! CLI entry point for `html2eml`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};

use html2eml::config::{self, Config};
use html2eml::model::address::EmailAddress;
use html2eml::{Converter, Options};

#[derive(Parser)]
#[command(
    name = "html2eml",
    version,
    about = "Convert .html files (and their local images) to .eml",
    after_help = "With no FILE, every *.html file in the current directory is converted.\n\
                  Existing non-empty .eml files are left alone, so an interrupted run can be repeated."
)]
struct Cli {
    /// HTML files to convert
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Set the From field
    #[arg(short, long, value_name = "ADDRESS")]
    from: Option<String>,

    /// Set the To field
    #[arg(short, long, value_name = "ADDRESS")]
    to: Option<String>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print where this tool comes from and exit
    #[arg(long)]
    about: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,

    /// Generate a man page and exit
    #[arg(long)]
    manpage: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.about {
        print_about();
        return Ok(());
    }
    if let Some(shell) = cli.completions {
        return cmd_completions(shell);
    }
    if cli.manpage {
        return cmd_manpage();
    }

    let loaded = config::load_config();
    let config = &loaded.config;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, config);
    loaded.log();

    let options = Options {
        from: address(cli.from.as_deref(), config.message.from.as_deref()),
        to: address(cli.to.as_deref(), config.message.to.as_deref()),
        extra_selectors: config.sanitize.extra_selectors.clone(),
    };

    let inputs = expand_inputs(cli.files)?;
    Converter::new(options).convert_all(&inputs)?;
    Ok(())
}

/// Pick the command-line value over the configured one.
fn address(flag: Option<&str>, configured: Option<&str>) -> EmailAddress {
    flag.or(configured)
        .map(EmailAddress::parse)
        .unwrap_or_default()
}

/// Use the given files, or every `*.html` file in the current directory.
///
/// A single literal `*.html` (as passed by shells that do not expand globs)
/// is treated like no argument at all.
fn expand_inputs(files: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let wants_glob = files.is_empty() || (files.len() == 1 && files[0] == Path::new("*.html"));
    if !wants_glob {
        return Ok(files);
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(".")? {
        let entry = entry?;
        let path = PathBuf::from(entry.file_name());
        let is_html = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        if is_html && entry.file_type()?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn print_about() {
    println!(
        "{} {}\n{}\nby {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_AUTHORS"),
    );
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if config.general.log_file && std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "html2eml.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "html2eml", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
