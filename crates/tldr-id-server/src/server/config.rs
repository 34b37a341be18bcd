use anyhow::{Context, bail};
use clap::Parser;
use tldr_snowflake::checked_node_id;

/// Runtime configuration for the `tldr-id-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// node identifier has no default: every running instance must be given its
/// own, and a missing or invalid one is a fatal startup error.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tldr-id-server",
    version,
    about = "An HTTP service for Snowflake-like IDs"
)]
pub struct CliArgs {
    /// Node identifier embedded in every generated ID.
    ///
    /// Must be unique across all concurrently running instances of the
    /// deployment and lie in `0..=1023`.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, env = "NODE_ID", allow_negative_numbers = true)]
    pub node_id: i64,

    /// Address to bind.
    ///
    /// Environment variable: `APP_HOST`
    #[arg(long, env = "APP_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    /// Port to bind.
    ///
    /// Environment variable: `APP_PORT`
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Maximum number of IDs a single `/ids` request may ask for.
    ///
    /// Environment variable: `MAX_BATCH`
    #[arg(long, env = "MAX_BATCH", default_value_t = 4096)]
    pub max_batch: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node_id: u16,
    pub max_batch: usize,
    pub server_addr: String,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let node_id = checked_node_id(args.node_id).context("invalid NODE_ID")?;

        if args.max_batch == 0 {
            bail!("MAX_BATCH must be greater than 0");
        }

        Ok(Self {
            node_id,
            max_batch: args.max_batch,
            server_addr: format!("{}:{}", args.host, args.port),
        })
    }
}
