use std::path::PathBuf;

use clap::Parser;
use swagger_loader::{assemble, Error};

#[derive(Parser, Debug)]
#[clap(name = "Swagger Document Loader")]
#[clap(
    about = "CLI to load and validate Swagger 2.0 documents.",
    version,
    author
)]
#[clap(arg_required_else_help(true))]
struct Args {
    #[clap(name = "debug", short, long, help = "Enable debug logging")]
    debug: bool,

    #[clap(name = "json", long, help = "Print the error report as JSON")]
    json: bool,

    #[clap(name = "file", help = "The Swagger document to load.")]
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if args.debug {
                    "debug".into()
                } else {
                    "info".into()
                }
            }),
        )
        .init();

    let contents = std::fs::read_to_string(&args.file).map_err(Error::Io)?;
    let raw: serde_json::Value = if args.file.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(&contents).map_err(Error::SerdeJson)?
    } else {
        serde_yaml::from_str(&contents).map_err(Error::SerdeYaml)?
    };

    match assemble(&raw) {
        Ok(assembly) => {
            for warning in &assembly.warnings {
                tracing::warn!("{}", warning);
            }
            tracing::info!(
                "loaded `{}` version {} with {} path(s) and {} definition(s)",
                assembly.document.info.title,
                assembly.document.info.version,
                assembly.document.paths.len(),
                assembly.document.definitions.len(),
            );
            Ok(())
        }
        Err(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report).map_err(Error::SerdeJson)?);
            } else {
                for error in report.iter() {
                    eprintln!("{}", error);
                }
            }
            Err(Error::Rejected(report).into())
        }
    }
}
