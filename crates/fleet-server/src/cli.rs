use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleetd",
    version,
    about = "Fleet command server with audit trail"
)]
pub(crate) struct Args {
    #[arg(long, default_value = "config/fleetd.toml")]
    pub(crate) config: PathBuf,
    /// Overrides `listen_addr` from the config file
    #[arg(long)]
    pub(crate) listen_addr: Option<String>,
    #[arg(long, default_value = "logs")]
    pub(crate) log_dir: PathBuf,
    #[arg(long, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
    /// Log audit records instead of persisting them
    #[arg(long, default_value_t = false)]
    pub(crate) no_store: bool,
}
