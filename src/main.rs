use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pe_version_info::Extractor;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    input: PathBuf,

    /// Print only these keys
    #[arg(short, long)]
    key: Vec<String>,

    /// Write the entries to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let extractor = Extractor::new(file)?;
    let info = extractor
        .version_info()
        .context("No version information found")?;

    let mut out = String::new();
    if args.key.is_empty() {
        for (key, value) in info.iter() {
            writeln!(out, "{key}={value}")?;
        }
    } else {
        for key in &args.key {
            let value = info
                .get(key)
                .ok_or_else(|| anyhow!("Key not found: {}", key))?;
            writeln!(out, "{key}={value}")?;
        }
    }

    match args.output {
        Some(path) => fs::write(path, out)?,
        None => print!("{out}"),
    }

    Ok(())
}
