mod render;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use hsfscan_core::analyze::{Pass, PassSet};
use hsfscan_core::config::{Config, DEFAULT_SAMPLE_PATH};
use hsfscan_core::decode::{decode_loaded, read_bytes, ByteDump};
use hsfscan_core::report::Report;
use hsfscan_core::{analyze_decoded, analyze_file, AnalyzeOptions};

const RAW_HEAD_BYTES: usize = 200;
const RAW_TAIL_BYTES: usize = 50;

#[derive(Parser, Debug)]
#[command(
    name = "hsfscan",
    version,
    about = "Read-only diagnostics for .hsf farming-rule files"
)]
struct Cli {
    /// Config file (defaults to ./hsfscan.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    no_color: bool,

    /// Log to stderr; repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run analysis passes and print the findings
    #[command(visible_alias = "analyse")]
    Analyze {
        path: Option<PathBuf>,

        /// Run only these passes (repeatable)
        #[arg(long = "pass", value_name = "NAME")]
        passes: Vec<String>,

        #[arg(long)]
        format: Option<OutputFormat>,
    },
    /// Value sets, key unions and shape checks across every rule
    Fields { path: Option<PathBuf> },
    /// BOM flag, top-level keys and the first rules verbatim
    Structure { path: Option<PathBuf> },
    /// File size, byte previews and hand-check samples
    Raw { path: Option<PathBuf> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    cyan: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    cyan: "\x1b[36m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    cyan: "",
    reset: "",
};

fn style(no_color: bool) -> &'static Style {
    if no_color {
        &PLAIN
    } else {
        &COLOR
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let s = style(cli.no_color);

    let res = load_config(cli.config.as_deref()).and_then(|cfg| run(cli.cmd, &cfg, s));

    match res {
        Ok(code) => code,
        Err(e) => {
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p),
        None => Ok(Config::discover()?.unwrap_or_default()),
    }
}

/// Positional argument, then the config file, then the bundled sample path.
fn resolve_path(arg: Option<PathBuf>, cfg: &Config) -> PathBuf {
    arg.or_else(|| cfg.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SAMPLE_PATH))
}

fn resolve_passes(args: &[String], cfg: &Config) -> anyhow::Result<PassSet> {
    if args.is_empty() {
        cfg.pass_set()
    } else {
        PassSet::from_names(args).context("invalid --pass")
    }
}

fn resolve_format(arg: Option<OutputFormat>, cfg: &Config) -> anyhow::Result<OutputFormat> {
    if let Some(f) = arg {
        return Ok(f);
    }
    match &cfg.format {
        Some(name) => OutputFormat::from_str(name, true)
            .map_err(|e| anyhow::anyhow!("invalid `format` in config: {e}")),
        None => Ok(OutputFormat::Text),
    }
}

fn run(cmd: Commands, cfg: &Config, s: &Style) -> anyhow::Result<std::process::ExitCode> {
    match cmd {
        Commands::Analyze {
            path,
            passes,
            format,
        } => {
            let opts = AnalyzeOptions {
                path: resolve_path(path, cfg),
                passes: resolve_passes(&passes, cfg)?,
            };
            let format = resolve_format(format, cfg)?;
            run_analyze(&opts, format, s)
        }
        Commands::Fields { path } => {
            let opts = AnalyzeOptions {
                path: resolve_path(path, cfg),
                passes: PassSet::all().without(Pass::Sample),
            };
            let report = analyze_file(&opts)?;
            print!("{}", render::field_analysis(&report.findings));
            Ok(finish(&report, s))
        }
        Commands::Structure { path } => {
            let opts = AnalyzeOptions {
                path: resolve_path(path, cfg),
                passes: PassSet::only([Pass::Sample]),
            };
            let report = analyze_file(&opts)?;
            if let Some(sample) = &report.findings.sample {
                print!("{}", render::structure(&report, sample));
            }
            Ok(finish(&report, s))
        }
        Commands::Raw { path } => {
            let path = resolve_path(path, cfg);
            let bytes = read_bytes(&path)?;
            let dump = ByteDump::from_bytes(&bytes, RAW_HEAD_BYTES, RAW_TAIL_BYTES);
            let decoded = decode_loaded(&path, &bytes)?;
            let report = analyze_decoded(
                decoded,
                &PassSet::only([Pass::ArtifactSetShape, Pass::Sample]),
            )?;
            print!("{}", render::raw(&dump, &report.findings));
            Ok(finish(&report, s))
        }
    }
}

fn run_analyze(
    opts: &AnalyzeOptions,
    format: OutputFormat,
    s: &Style,
) -> anyhow::Result<std::process::ExitCode> {
    let report = analyze_file(opts)?;

    match format {
        OutputFormat::Text => print!("{}", render::full(&report)),
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize report json")?;
            println!("{json}");
        }
    }

    Ok(finish(&report, s))
}

/// Summarise on stderr; any skipped pass turns the exit status to 2.
fn finish(report: &Report, s: &Style) -> std::process::ExitCode {
    let f = &report.findings;
    if f.is_complete() {
        eprintln!(
            "\n  {green}{bold}OK{reset}  {dim}{} rules, {} passes{reset}",
            f.rule_count,
            f.passes_run.len(),
            green = s.green,
            bold = s.bold,
            dim = s.dim,
            reset = s.reset
        );
        return std::process::ExitCode::from(0);
    }

    eprintln!();
    for skip in &f.skipped {
        eprintln!(
            "  {yellow}{bold}pass skipped{reset} {cyan}{}{reset}: {}",
            skip.pass,
            skip.reason,
            yellow = s.yellow,
            bold = s.bold,
            cyan = s.cyan,
            reset = s.reset
        );
    }
    eprintln!(
        "  {red}{bold}INCOMPLETE{reset}  {dim}({} of {} passes skipped in {}){reset}",
        f.skipped.len(),
        f.skipped.len() + f.passes_run.len(),
        report.inputs.input_path,
        red = s.red,
        bold = s.bold,
        dim = s.dim,
        reset = s.reset
    );
    std::process::ExitCode::from(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_respects_no_color() {
        assert_eq!(style(true).bold, "");
        assert_ne!(style(false).bold, "");
    }

    #[test]
    fn path_prefers_argument_then_config_then_sample() {
        let cfg = Config {
            path: Some(PathBuf::from("from-config.hsf")),
            ..Config::default()
        };
        assert_eq!(
            resolve_path(Some(PathBuf::from("arg.hsf")), &cfg),
            PathBuf::from("arg.hsf")
        );
        assert_eq!(resolve_path(None, &cfg), PathBuf::from("from-config.hsf"));
        assert_eq!(
            resolve_path(None, &Config::default()),
            PathBuf::from(DEFAULT_SAMPLE_PATH)
        );
    }

    #[test]
    fn passes_prefer_arguments_over_config() {
        let cfg = Config {
            passes: vec!["sample".to_string()],
            ..Config::default()
        };
        assert_eq!(
            resolve_passes(&["rule-keys".to_string()], &cfg).unwrap(),
            PassSet::only([Pass::RuleKeys])
        );
        assert_eq!(
            resolve_passes(&[], &cfg).unwrap(),
            PassSet::only([Pass::Sample])
        );
        assert!(resolve_passes(&["bogus".to_string()], &cfg).is_err());
    }

    #[test]
    fn format_falls_back_to_config_then_text() {
        let cfg = Config {
            format: Some("markdown".to_string()),
            ..Config::default()
        };
        assert_eq!(resolve_format(None, &cfg).unwrap(), OutputFormat::Markdown);
        assert_eq!(
            resolve_format(Some(OutputFormat::Json), &cfg).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(None, &Config::default()).unwrap(),
            OutputFormat::Text
        );

        let bad = Config {
            format: Some("yaml".to_string()),
            ..Config::default()
        };
        assert!(resolve_format(None, &bad).is_err());
    }
}
