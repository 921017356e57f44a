use std::process;

use clap::Parser;
use infotainment_ui_runtime::config::{DEFAULT_ART, DEFAULT_CONTENT, DEFAULT_SHELL};
use infotainment_ui_runtime::{ContentLocation, DEFAULT_UI_OUTBOUND_QUEUE_CAP, HostConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "INFOTAINMENT_UI_LOG";

/// Headless infotainment front-end driven by a host process over stdio.
#[derive(Debug, Parser)]
#[command(name = "ui_host", version, about)]
struct Args {
    /// Directory or http(s) base URL holding the shell and screen fragments
    #[arg(long, env = "INFOTAINMENT_UI_CONTENT", default_value = DEFAULT_CONTENT)]
    content: ContentLocation,

    /// Page shell, relative to the content location
    #[arg(long, env = "INFOTAINMENT_UI_SHELL", default_value = DEFAULT_SHELL)]
    shell: String,

    /// Outbound events buffered before new ones are dropped
    #[arg(
        long,
        env = "INFOTAINMENT_UI_OUTBOUND_QUEUE_CAP",
        default_value_t = DEFAULT_UI_OUTBOUND_QUEUE_CAP
    )]
    outbound_queue_cap: usize,

    /// Artwork shown when the media payload carries none
    #[arg(long, env = "INFOTAINMENT_UI_DEFAULT_ART", default_value = DEFAULT_ART)]
    default_art: String,
}

impl From<Args> for HostConfig {
    fn from(args: Args) -> Self {
        HostConfig {
            content: args.content,
            shell: args.shell,
            outbound_queue_cap: args.outbound_queue_cap,
            default_art: args.default_art,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the host protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = infotainment_ui_runtime::run(args.into()) {
        error!(error = %err, "ui_host fatal error");
        process::exit(1);
    }
}
