//! `vx3` command-line front end.

mod commands;
mod rpc;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};

use crate::config::{ApiProtocol, EndpointStore, RpcProtocol, RpcSource, Settings};

#[derive(Debug, Parser)]
#[command(name = "vx3", version)]
#[command(about = "Toolkit for EVM dapp development: endpoints, dev server, payments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new project with default settings
    Init(ProjectArgs),

    /// Create a new project, prompting for a name when none is given
    Create(ProjectArgs),

    /// Start the local development server
    Serve(ServeArgs),

    /// Manage RPC endpoint configurations
    #[command(subcommand)]
    Rpc(RpcCommand),

    /// IPFS helpers
    #[command(subcommand)]
    Ipfs(IpfsCommand),

    /// Show current gas fees
    Gas {
        #[command(flatten)]
        source: SourceArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the latest block number
    Block(SourceArgs),

    /// Show the balance of an address
    Balance {
        address: String,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Send native currency from a node-managed account
    Pay(PayArgs),

    /// Add tooling to the current project (hardhat, react)
    Setup { target: String },
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project name or path
    pub name: Option<String>,

    /// Template directory to copy into the project
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Where to take the JSON-RPC URL from.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// RPC URL, used as-is
    #[arg(long)]
    pub rpc: Option<String>,

    /// Named configuration in the RPC directory
    #[arg(long)]
    pub config: Option<String>,

    /// Project config file (default: vx.config.json)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl SourceArgs {
    pub fn source(&self) -> RpcSource {
        RpcSource::from_flags(self.rpc.clone(), self.config.clone(), self.path.clone())
    }
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub env: Option<String>,

    /// Enable the /debug page
    #[arg(long)]
    pub debug: bool,

    /// Log every request
    #[arg(long)]
    pub logs: bool,

    /// JSON list of chains: [{"name","chainId","rpcUrl"}]
    #[arg(long)]
    pub chains: Option<String>,

    /// Default sender for /api/pay
    #[arg(long, env = "VX3_FROM")]
    pub from: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct PayArgs {
    /// Recipient address
    pub to: String,

    /// Amount in ether, e.g. 0.01
    pub amount: String,

    /// Sender address, unlocked on the node
    #[arg(long, env = "VX3_FROM")]
    pub from: String,

    #[arg(long)]
    pub gas_limit: Option<u64>,

    /// Max fee per gas in gwei
    #[arg(long)]
    pub max_fee: Option<String>,

    /// Max priority fee per gas in gwei
    #[arg(long)]
    pub max_priority_fee: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Subcommand)]
pub enum RpcCommand {
    /// Save a single RPC endpoint, replacing the file
    Save {
        filename: String,
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        host: String,
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
        protocol: RpcProtocol,
        dir: Option<PathBuf>,
    },

    /// Print a configuration
    Load {
        filename: String,
        dir: Option<PathBuf>,
    },

    /// List configurations
    List { dir: Option<PathBuf> },

    /// Create the default configuration (http://localhost:8545)
    Create {
        filename: Option<String>,
        dir: Option<PathBuf>,
    },

    /// Append an RPC endpoint
    Add {
        filename: String,
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        host: String,
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
        protocol: RpcProtocol,
        dir: Option<PathBuf>,
    },

    /// Append an IPFS endpoint
    AddIpfs {
        filename: String,

        #[arg(long, conflicts_with_all = ["api_host", "api_port", "api_protocol"], required_unless_present = "api_host")]
        gateway: Option<String>,

        #[arg(long, requires_all = ["api_port", "api_protocol"], value_parser = NonEmptyStringValueParser::new())]
        api_host: Option<String>,

        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        api_port: Option<u16>,

        #[arg(long)]
        api_protocol: Option<ApiProtocol>,

        dir: Option<PathBuf>,
    },

    /// Write a placeholder vx.config.json
    Init,

    /// Show the primary RPC of vx.config.json
    View {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum IpfsCommand {
    /// Fetch content by CID
    Fetch {
        cid: String,

        /// Gateway URL overriding the configured one
        gateway: Option<String>,

        /// Named configuration to take the gateway from
        #[arg(long)]
        config: Option<String>,

        /// Project config file (default: vx.config.json)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Write the content to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// What every command handler gets.
pub struct Context {
    pub settings: Settings,
    pub cwd: PathBuf,
}

impl Context {
    pub fn load() -> anyhow::Result<Self> {
        let settings = Settings::load().context("Failed to load settings")?;
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self { settings, cwd })
    }

    /// Store for `dir`, defaulting to the configured directory.
    pub fn store(&self, dir: Option<PathBuf>) -> EndpointStore {
        EndpointStore::new(dir.unwrap_or_else(|| self.settings.rpc.dir.clone()))
    }

    pub fn rpc_url(&self, source: &SourceArgs) -> anyhow::Result<String> {
        let store = self.store(None);
        let url = source.source().resolve(&store, &self.cwd)?;
        tracing::debug!(url = %url, "Resolved RPC URL");
        Ok(url)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load()?;

    match cli.command {
        Commands::Init(args) => commands::init(&ctx, args.name.as_deref(), args.template),
        Commands::Create(args) => {
            let name = match args.name {
                Some(name) => name,
                None => commands::prompt("project name or path:")?,
            };
            commands::init(&ctx, Some(&name), args.template)
        }
        Commands::Serve(args) => commands::serve(&ctx, args).await,
        Commands::Rpc(command) => rpc::run(&ctx, command),
        Commands::Ipfs(command) => commands::ipfs(&ctx, command).await,
        Commands::Gas { source, json } => commands::gas(&ctx, &source, json).await,
        Commands::Block(source) => commands::block(&ctx, &source).await,
        Commands::Balance { address, source } => commands::balance(&ctx, &address, &source).await,
        Commands::Pay(args) => commands::pay(&ctx, args).await,
        Commands::Setup { target } => commands::setup(&ctx, &target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_port_zero_is_rejected() {
        let result = Cli::try_parse_from(["vx3", "rpc", "save", "net", "localhost", "0", "http"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let result = Cli::try_parse_from(["vx3", "rpc", "add", "net", "localhost", "8545", "ftp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_host_is_rejected() {
        for args in [
            vec!["vx3", "rpc", "save", "net", "", "8545", "http"],
            vec!["vx3", "rpc", "add", "net", "", "8545", "http"],
            vec![
                "vx3", "rpc", "add-ipfs", "net", "--api-host", "", "--api-port", "5001",
                "--api-protocol", "http",
            ],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn test_add_ipfs_needs_gateway_or_api() {
        assert!(Cli::try_parse_from(["vx3", "rpc", "add-ipfs", "net"]).is_err());
        assert!(Cli::try_parse_from([
            "vx3", "rpc", "add-ipfs", "net", "--gateway", "https://ipfs.io", "--api-host", "h"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "vx3", "rpc", "add-ipfs", "net", "--api-host", "127.0.0.1", "--api-port", "5001",
            "--api-protocol", "http"
        ])
        .is_ok());
    }

    #[test]
    fn test_rpc_flag_wins_over_config() {
        let cli = Cli::try_parse_from([
            "vx3", "block", "--rpc", "http://node:8545", "--config", "mainnet",
        ])
        .unwrap();
        let Commands::Block(source) = cli.command else {
            panic!("expected block command");
        };
        assert_eq!(source.source(), RpcSource::Url("http://node:8545".into()));
    }
}
