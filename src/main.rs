//! `iopool` — demonstration CLI over the `iopool` library.
//!
//! Usage:
//!   iopool cat    --config iopool.toml <path>...
//!   iopool ranges --config iopool.toml <path>

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use iopool::config::PoolConfig;
use iopool::{AccessFlags, Pool, Stream, Whence, READ};

#[derive(Parser)]
#[command(name = "iopool", about = "Bounded-concurrency stream pool demo", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open each path as a pooled stream and write its bytes to stdout.
    Cat {
        #[arg(short, long, default_value = "iopool.toml")]
        config: PathBuf,
        /// Cap on concurrently open descriptors, overriding the config file.
        #[arg(long)]
        max_open: Option<u32>,
        /// Files to stream, in order.
        paths: Vec<PathBuf>,
    },
    /// Read one file sequentially while tracking which byte ranges were
    /// actually returned, then print the resulting range index.
    Ranges {
        #[arg(short, long, default_value = "iopool.toml")]
        config: PathBuf,
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Cat { config, max_open, paths } => run_cat(&config, max_open, paths),
        Command::Ranges { config, path } => run_ranges(&config, path),
    };

    if let Err(e) = result {
        error!(error = %e, "iopool command failed");
        std::process::exit(1);
    }
}

fn load_config(path: &std::path::Path) -> PoolConfig {
    match PoolConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            info!(error = %e, path = %path.display(), "no usable config file, using defaults");
            PoolConfig::default()
        }
    }
}

fn run_cat(
    config_path: &std::path::Path,
    max_open_override: Option<u32>,
    paths: Vec<PathBuf>,
) -> iopool::Result<()> {
    let cfg = load_config(config_path);
    let max_open = iopool::config::resolve_max_open(max_open_override, &cfg);

    let mut pool = Pool::new(cfg.initial_slots, max_open);
    let mut entries = Vec::with_capacity(paths.len());
    for path in &paths {
        let stream = Stream::new_file(path);
        let entry = pool.append(stream, AccessFlags::from_bits(READ))?;
        entries.push(entry);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = vec![0u8; cfg.read_chunk_bytes];

    for entry in entries {
        loop {
            let n = pool.read(entry, &mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])
                .map_err(|e| iopool::Error::io(iopool::error::IoKind::Write, e))?;
        }
    }

    info!(
        open_count = pool.open_count(),
        num_slots = pool.num_slots(),
        max_open = ?pool.get_max_open(),
        "cat complete"
    );
    pool.close_all()?;
    Ok(())
}

fn run_ranges(config_path: &std::path::Path, path: PathBuf) -> iopool::Result<()> {
    let cfg = load_config(config_path);

    let mut stream = Stream::new_file(&path);
    stream.open(AccessFlags::from_bits(READ))?;
    stream.set_track_reads(true);

    let mut buf = vec![0u8; cfg.read_chunk_bytes];
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
    }

    // Demonstrate a backward seek + re-read to show merging in action.
    stream.seek(0, Whence::Set)?;
    let mut head = vec![0u8; cfg.read_chunk_bytes.min(16)];
    stream.read(&mut head)?;

    println!("=== Read ranges for {} ===", path.display());
    for i in 0..stream.read_ranges_len() {
        let r = stream.get_read_range(i).expect("index in bounds");
        println!("[{}, {}) ({} bytes)", r.offset, r.last(), r.size);
    }
    stream.close()?;
    Ok(())
}
