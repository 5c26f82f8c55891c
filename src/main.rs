use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use csrkit::config::GeneratorConfig;
use csrkit::persist::FileSink;

/// Generate a certificate signing request and its private key.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file; the example request is used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the request, overriding the configuration.
    #[arg(long)]
    request_out: Option<PathBuf>,

    /// Where to write the private key, overriding the configuration.
    #[arg(long)]
    key_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(path) = args.request_out {
        config.output.request = path;
    }
    if let Some(path) = args.key_out {
        config.output.private_key = path;
    }

    let mut sink = FileSink::new(&config.output.request, &config.output.private_key);
    let generated = csrkit::pipeline::run(&config, &mut rand_core::OsRng, &mut sink)?;

    println!("CSR written to {}", generated.request_location);
    println!("Private key written to {}", generated.private_key_location);
    Ok(())
}
