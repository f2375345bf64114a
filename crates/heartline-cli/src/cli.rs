use std::path::PathBuf;

use clap::Parser;

/// Hold the heart together, from two terminals.
#[derive(Parser, Debug)]
#[command(name = "heartline", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Login identity used to pick your role.
    #[arg(long, env = "HEARTLINE_IDENTITY")]
    pub identity: Option<String>,

    /// Log filter override, e.g. `heartline=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run against an in-process server with a simulated partner.
    #[arg(long)]
    pub loopback: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
