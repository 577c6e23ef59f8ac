use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use concurrent_download::{Downloader, Options, ProgressBarReporter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[clap(long, value_parser = url_parser)]
    /// provide the url of the file to download
    url: String,

    #[clap(long)]
    /// provide the location to save the file, or the directory to extract an archive into
    path: PathBuf,

    #[clap(short, long, default_value = "10")]
    /// set the number of concurrent range downloads
    routines: usize,

    #[clap(long, default_value = "600")]
    /// set the timeout of a single range request in seconds
    timeout: u64,

    #[clap(long)]
    /// set the directory holding partial downloads
    temp_dir: Option<PathBuf>,
}

fn url_parser(url: &str) -> Result<String, String> {
    if url.trim().starts_with("http") {
        Ok(url.trim().to_string())
    } else {
        Err("URL must start with http or https".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut options = Options {
        routines: args.routines,
        timeout: Duration::from_secs(args.timeout),
        ..Options::default()
    };
    if let Some(temp_dir) = args.temp_dir {
        options.temp_dir = temp_dir;
    }

    info!("Options: {:?}", options);

    let downloader = Downloader::new(&args.url, &args.path, options)?
        .with_reporter(Arc::new(ProgressBarReporter::new()));

    match downloader.download().await {
        Ok(path) => {
            info!("Saved {} to {}", args.url, path.display());
            Ok(())
        }
        Err(err) => {
            error!("Error downloading {} ({:?} stage): {}", args.url, err.stage(), err);
            Err(Box::new(err) as Box<dyn std::error::Error>)
        }
    }
}
