// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figura: turn a prompt or a photo into a stylized 3D figure.
//!
//! This is the binary entry point. `serve` runs the HTTP API; `generate`
//! and `status` talk to the 3D service directly.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config_view;
mod generate;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figura_config::model::FiguraConfig;

/// Figura: turn a prompt or a photo into a stylized 3D figure.
#[derive(Parser, Debug)]
#[command(name = "figura", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
    /// Submit an image to the 3D service and wait for the mesh.
    Generate {
        /// Path of the PNG, JPEG, GIF or WebP image to convert.
        image: PathBuf,
        /// Status queries before giving up (defaults to mesh.max_poll_attempts).
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Seconds between status queries (defaults to mesh.poll_interval_secs).
        #[arg(long)]
        interval: Option<u64>,
        /// Download the finished mesh to this path.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Query the status of a submitted job once.
    Status {
        request_id: String,
        /// Print the raw report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> FiguraConfig {
    let loaded = match path {
        Some(path) => figura_config::load_and_validate_path(path),
        None => figura_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            figura_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.logging.level);
            serve::run_serve(config).await
        }
        Some(Commands::Generate {
            image,
            max_attempts,
            interval,
            output,
        }) => {
            init_tracing(&config.logging.level);
            let args = generate::GenerateArgs {
                image,
                max_attempts,
                interval,
                output,
            };
            generate::run_generate(&config, args).await
        }
        Some(Commands::Status { request_id, json }) => {
            init_tracing(&config.logging.level);
            generate::run_status(&config, &request_id, json).await
        }
        Some(Commands::Config) => config_view::render(&config).map(|toml| print!("{toml}")),
        None => {
            println!("figura: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("figura={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    #[serial]
    fn binary_loads_config_defaults() {
        let config = figura_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.mesh.max_poll_attempts, 60);
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "figura",
            "generate",
            "knight.png",
            "--max-attempts",
            "5",
            "--interval",
            "1",
            "-o",
            "knight.glb",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Generate {
                image,
                max_attempts,
                interval,
                output,
            }) => {
                assert_eq!(image, PathBuf::from("knight.png"));
                assert_eq!(max_attempts, Some(5));
                assert_eq!(interval, Some(1));
                assert_eq!(output, Some(PathBuf::from("knight.glb")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["figura", "status", "abc", "--config", "/tmp/f.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/f.toml")));
        assert!(matches!(cli.command, Some(Commands::Status { json: false, .. })));
    }
}
