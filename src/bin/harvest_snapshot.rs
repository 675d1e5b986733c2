//! Harvest a saved thread page and write the JSON payload to disk.
//!
//! Usage: `harvest_snapshot [--config FILE] [--url URL] [--out DIR] [INPUT]`
//!
//! Reads HTML from INPUT (or stdin), runs the pipeline against it as a
//! static page and writes `<out>/<source>_<millis>.json`. Set `RUST_LOG`
//! for diagnostics on stderr.

use rs_thread_harvest::{harvest, Options, StaticPage};
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    url: String,
    out: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut parsed = Args::default();
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().ok_or("--config needs a path")?.into()),
            "--url" => parsed.url = args.next().ok_or("--url needs a value")?,
            "--out" => parsed.out = Some(args.next().ok_or("--out needs a directory")?.into()),
            "-h" | "--help" => {
                println!("usage: harvest_snapshot [--config FILE] [--url URL] [--out DIR] [INPUT]");
                std::process::exit(0);
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {other}").into()),
            _ => parsed.input = Some(arg.into()),
        }
    }

    Ok(parsed)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;

    let options = match &args.config {
        Some(path) => Options::from_json_file(path)?,
        None => Options::default(),
    };

    let html = match &args.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let mut page = StaticPage::from_bytes(&html, args.url);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let harvest = runtime.block_on(harvest(&mut page, &options))?;

    for warning in &harvest.report.warnings {
        eprintln!("warning: {warning}");
    }

    let dir = args.out.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    let path = dir.join(&harvest.suggested_name);
    fs::write(&path, &harvest.payload)?;

    eprintln!(
        "{} comments ({} skipped, {} duplicates) -> {}",
        harvest.result.children.len(),
        harvest.report.skipped,
        harvest.report.duplicates,
        path.display()
    );

    Ok(())
}
