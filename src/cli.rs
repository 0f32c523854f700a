use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pingmon")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Endpoint liveness and latency prober")]
pub struct Cli {
    /// Id of the configured server to probe
    pub server_id: Option<String>,

    /// Create the data directory and a default configuration file
    #[arg(long = "init")]
    pub init: bool,

    /// Validate the configuration file and exit
    #[arg(short = 'c', long = "check")]
    pub check: bool,

    /// Directory holding config.json and the per-server record files
    #[arg(long = "data-dir", default_value = "./data")]
    pub data_dir: PathBuf,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
