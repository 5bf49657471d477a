use anyhow::bail;

use crate::cli::{Context, RpcCommand};
use crate::config::{
    display, init_project_config, load_project_config, ApiProtocol, EndpointRecord, IpfsApi,
    IpfsEndpoint, RpcEndpoint, DEFAULT_NAME,
};

pub fn run(ctx: &Context, command: RpcCommand) -> anyhow::Result<()> {
    match command {
        RpcCommand::Save {
            filename,
            host,
            port,
            protocol,
            dir,
        } => {
            let store = ctx.store(dir);
            store.save(&filename, RpcEndpoint::new(host, port, protocol))?;
            println!("RPC configuration saved to {}", store.path_for(&filename).display());
        }

        RpcCommand::Load { filename, dir } => {
            let collection = ctx.store(dir).load(&filename)?;
            println!("RPC Configuration:");
            for line in display(&collection) {
                println!("  {line}");
            }
        }

        RpcCommand::List { dir } => {
            let store = ctx.store(dir);
            let names = store.list()?;
            if names.is_empty() {
                println!("No RPC configurations found in {} directory", store.dir().display());
            } else {
                println!("Available RPC configurations:");
                for (i, name) in names.iter().enumerate() {
                    println!("  [{i}] {name}");
                }
            }
        }

        RpcCommand::Create { filename, dir } => {
            let store = ctx.store(dir);
            let name = filename.unwrap_or_else(|| DEFAULT_NAME.to_string());
            store.create_default(&name)?;
            println!("Default RPC configuration created at {}", store.path_for(&name).display());
        }

        RpcCommand::Add {
            filename,
            host,
            port,
            protocol,
            dir,
        } => {
            let store = ctx.store(dir);
            let collection = store.add_endpoint(&filename, RpcEndpoint::new(host, port, protocol))?;
            println!(
                "Added RPC endpoint to {} ({} entries)",
                store.path_for(&filename).display(),
                collection.len()
            );
        }

        RpcCommand::AddIpfs {
            filename,
            gateway,
            api_host,
            api_port,
            api_protocol,
            dir,
        } => {
            let endpoint = ipfs_endpoint(gateway, api_host, api_port, api_protocol)?;
            let store = ctx.store(dir);
            let collection = store.add_endpoint(&filename, EndpointRecord::Ipfs(endpoint))?;
            println!(
                "Added IPFS endpoint to {} ({} entries)",
                store.path_for(&filename).display(),
                collection.len()
            );
        }

        RpcCommand::Init => {
            let path = init_project_config(&ctx.cwd)?;
            println!("Created {}", path.display());
        }

        RpcCommand::View { path } => {
            let (file, collection) = load_project_config(&ctx.cwd, path.as_deref())?;
            let Some(url) = collection.primary_rpc_url() else {
                bail!("{} has no RPC endpoint", file.display());
            };
            println!("RPC URL: {url}");
        }
    }
    Ok(())
}

fn ipfs_endpoint(
    gateway: Option<String>,
    api_host: Option<String>,
    api_port: Option<u16>,
    api_protocol: Option<ApiProtocol>,
) -> anyhow::Result<IpfsEndpoint> {
    match (gateway, api_host, api_port, api_protocol) {
        (Some(gateway), None, None, None) => Ok(IpfsEndpoint::gateway(gateway)?),
        (None, Some(host), Some(port), Some(protocol)) => Ok(IpfsEndpoint::Api(IpfsApi {
            host,
            port,
            protocol,
        })),
        _ => bail!("Provide either --gateway or all of --api-host, --api-port and --api-protocol"),
    }
}
