use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use blob_store::{
    BlobResult, BlobStore, BlobStoreError, Context, DiskBlobStore, DiskBlobStoreConfig,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "blobctl", about = "Inspect and modify a disk blob store")]
struct Args {
    #[clap(flatten)]
    store: DiskBlobStoreConfig,

    /// Abort the operation if it has not finished after this many milliseconds.
    #[clap(long)]
    timeout_ms: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a blob, reading from `--file` or stdin.
    Put {
        name: String,
        #[clap(long)]
        file: Option<PathBuf>,
    },
    /// Print a blob to `--out` or stdout.
    Get {
        name: String,
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Prints true or false; exits 1 when the blob is missing.
    Exists { name: String },
    Delete { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("blobctl failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> BlobResult<ExitCode> {
    let store = DiskBlobStore::from_config(&args.store)?;
    let ctx = match args.timeout_ms {
        Some(ms) => Context::background().with_timeout(Duration::from_millis(ms)),
        None => Context::background(),
    };

    match args.command {
        Command::Put { name, file } => {
            let data = match file {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .map_err(|e| io_err(&path, e))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .map_err(|e| io_err(Path::new("<stdin>"), e))?;
                    buf
                }
            };
            let n = store.write_blob(&ctx, &name, &data).await?;
            tracing::info!("stored {} bytes as {}", n, name);
        }
        Command::Get { name, out } => {
            let data = store.read_blob(&ctx, &name).await?;
            match out {
                Some(path) => tokio::fs::write(&path, &data)
                    .await
                    .map_err(|e| io_err(&path, e))?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    let stdout_path = Path::new("<stdout>");
                    stdout.write_all(&data).await.map_err(|e| io_err(stdout_path, e))?;
                    stdout.flush().await.map_err(|e| io_err(stdout_path, e))?;
                }
            }
        }
        Command::Exists { name } => {
            let exists = store.blob_exists(&ctx, &name).await?;
            println!("{}", exists);
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Delete { name } => {
            store.delete_blob(&ctx, &name).await?;
            tracing::info!("deleted {}", name);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn io_err(path: &Path, source: std::io::Error) -> BlobStoreError {
    BlobStoreError::io(path, source)
}
