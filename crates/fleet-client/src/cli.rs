use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleetctl",
    version,
    about = "Run fleet commands locally or against fleetd"
)]
pub(crate) struct Args {
    /// Client config file [default: ~/.fleetctl.toml]
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Send remote commands as a single unary call instead of a listener stream
    #[arg(long)]
    pub(crate) unary: bool,
    #[arg(long, default_value_t = protocol::rpc::UNARY_DEADLINE.as_secs())]
    pub(crate) unary_timeout_secs: u64,
    #[arg(long, default_value_t = protocol::rpc::STREAM_DEADLINE.as_secs())]
    pub(crate) stream_timeout_secs: u64,
    /// Command to run; `help` lists them
    pub(crate) command: Option<String>,
    /// Options passed to the command verbatim
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub(crate) opts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_options_pass_through_verbatim() {
        let args = Args::try_parse_from([
            "fleetctl", "--unary", "start", "-cluster", "demo", "--force",
        ])
        .expect("parse");
        assert!(args.unary);
        assert_eq!(args.command.as_deref(), Some("start"));
        assert_eq!(args.opts, vec!["-cluster", "demo", "--force"]);
        assert_eq!(args.unary_timeout_secs, 300);
    }

    #[test]
    fn command_is_optional() {
        let args = Args::try_parse_from(["fleetctl"]).expect("parse");
        assert!(args.command.is_none());
        assert!(args.opts.is_empty());
        assert!(args.config.is_none());
    }
}
