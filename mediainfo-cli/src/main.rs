mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

/// MediaInfo-style container/codec analyzer.
#[derive(Parser, Debug)]
#[command(name = "mediainfo", disable_version_flag = true)]
struct Args {
    /// Files to analyze.
    paths: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Print version information and exit.
    #[arg(long)]
    version: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Xml,
    Html,
    Csv,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.version {
        println!("MediaInfo Command line, {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.paths.is_empty() {
        eprintln!("no input files given");
        return ExitCode::FAILURE;
    }

    let mut reports = Vec::with_capacity(args.paths.len());
    let mut had_error = false;
    for path in &args.paths {
        match mediainfo_core::analyze(path) {
            Ok(report) => reports.push(report),
            Err(err) => {
                log::error!("{err}");
                had_error = true;
            }
        }
    }

    let rendered = match args.output {
        OutputFormat::Text => render::render_text(&reports),
        OutputFormat::Json => render::render_json(&reports),
        OutputFormat::Xml => render::render_xml(&reports),
        OutputFormat::Html => render::render_html(&reports),
        OutputFormat::Csv => render::render_csv(&reports),
    };
    print!("{rendered}");

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
