use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context as _};

use crate::chain::{format_ether, format_gwei, RpcClient};
use crate::cli::{Context, IpfsCommand, PayArgs, ServeArgs, SourceArgs};
use crate::config::{load_project_config, EndpointCollection};
use crate::ipfs::{fetch_cid, select_gateway, FetchedContent};
use crate::payment::{send_payment, SendPaymentOptions};
use crate::scaffold::{init_project, InitOutcome, SetupTarget, TemplateSource};
use crate::server::{parse_chains, DevServer, ServerOptions};

/// Ask one question on stdin.
pub fn prompt(question: &str) -> anyhow::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{question} ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn templates(ctx: &Context, explicit: Option<PathBuf>) -> TemplateSource {
    TemplateSource::new(
        explicit,
        ctx.settings.scaffold.templates_dir.clone(),
        ctx.cwd.clone(),
    )
}

pub fn init(ctx: &Context, name: Option<&str>, template: Option<PathBuf>) -> anyhow::Result<()> {
    match init_project(&ctx.cwd, name, &templates(ctx, template))? {
        InitOutcome::Created { path, .. } => {
            println!("Directory created at: {}", path.display());
        }
        InitOutcome::AlreadyExists { path } => {
            println!("Directory already exists at: {}", path.display());
        }
    }
    Ok(())
}

pub fn setup(ctx: &Context, target: &str) -> anyhow::Result<()> {
    let target: SetupTarget = target.parse()?;
    let report = crate::scaffold::setup(target, &ctx.cwd, &templates(ctx, None))?;

    println!("{} setup complete. Next steps:", report.target);
    for (i, step) in report.target.next_steps().iter().enumerate() {
        println!("  {}) {}", i + 1, step);
    }
    Ok(())
}

pub async fn serve(ctx: &Context, args: ServeArgs) -> anyhow::Result<()> {
    let mut options = ServerOptions::from_settings(&ctx.settings.server);
    if let Some(host) = args.host {
        options.host = host;
    }
    if let Some(port) = args.port {
        options.port = port;
    }
    if let Some(env) = args.env {
        options.env = env;
    }
    options.debug = args.debug;
    options.logs = args.logs;
    options.pay_from = args.from;
    if let Some(chains) = args.chains.as_deref() {
        options.chains = parse_chains(chains).context("Invalid --chains JSON")?;
    }

    // The server still starts without a node; RPC routes report it per request.
    options.rpc_url = match ctx.rpc_url(&args.source) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("RPC config not found ({e}); some endpoints will fail until vx.config.json is created");
            None
        }
    };

    let debug = options.debug;
    let logs = options.logs;
    let mut server = DevServer::new(options, ctx.settings.clone());
    server.try_bind().await?;

    let url = server.server_url();
    if debug {
        println!("Server on {url} with debug mode");
        println!("{url}/debug");
    } else if logs {
        println!("Server on {url}");
    }

    server.run().await?;
    Ok(())
}

fn client(ctx: &Context, source: &SourceArgs) -> anyhow::Result<RpcClient> {
    let url = ctx.rpc_url(source)?;
    Ok(RpcClient::new(url, &ctx.settings.rpc)?)
}

pub async fn gas(ctx: &Context, source: &SourceArgs, json: bool) -> anyhow::Result<()> {
    let fees = client(ctx, source)?.gas_fees().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fees)?);
        return Ok(());
    }

    println!("Gas price: {} gwei", format_gwei(fees.gas_price));
    if let Some(base) = fees.base_fee_per_gas {
        println!("Base fee: {} gwei", format_gwei(base));
    }
    if let Some(priority) = fees.max_priority_fee_per_gas {
        println!("Max priority fee: {} gwei", format_gwei(priority));
    }
    if let Some(max) = fees.max_fee_per_gas {
        println!("Max fee: {} gwei", format_gwei(max));
    }
    Ok(())
}

pub async fn block(ctx: &Context, source: &SourceArgs) -> anyhow::Result<()> {
    let number = client(ctx, source)?.block_number().await?;
    println!("Block number: {number}");
    Ok(())
}

pub async fn balance(ctx: &Context, address: &str, source: &SourceArgs) -> anyhow::Result<()> {
    crate::chain::validate_address(address)?;
    let wei = client(ctx, source)?.balance(address).await?;
    println!("Balance: {} ETH", format_ether(wei));
    Ok(())
}

pub async fn pay(ctx: &Context, args: PayArgs) -> anyhow::Result<()> {
    let options = SendPaymentOptions {
        rpc_url: ctx.rpc_url(&args.source)?,
        from: args.from,
        to: args.to,
        amount_eth: args.amount,
        gas_limit: args.gas_limit,
        max_fee_per_gas_gwei: args.max_fee,
        max_priority_fee_per_gas_gwei: args.max_priority_fee,
    };
    // Fail on bad input before printing anything.
    options.to_transaction()?;

    println!("Sending {} ETH to {} ...", options.amount_eth, options.to);
    let result = send_payment(&options, &ctx.settings).await?;

    println!("Transaction hash: {}", result.tx_hash);
    if let Some(block) = result.receipt.mined_in_block() {
        println!("Mined in block: {block}");
    }
    match result.receipt.is_success() {
        Some(true) => println!("Status: success"),
        Some(false) => println!("Status: reverted"),
        None => {}
    }
    Ok(())
}

pub async fn ipfs(ctx: &Context, command: IpfsCommand) -> anyhow::Result<()> {
    let IpfsCommand::Fetch {
        cid,
        gateway,
        config,
        path,
        output,
    } = command;

    let collection = if gateway.is_some() {
        EndpointCollection::new()
    } else if let Some(name) = config {
        ctx.store(None).load(&name)?
    } else {
        load_project_config(&ctx.cwd, path.as_deref())?.1
    };
    let gateway = select_gateway(&collection, gateway.as_deref())?;

    let http = reqwest::Client::builder()
        .timeout(ctx.settings.rpc.timeout())
        .connect_timeout(ctx.settings.rpc.connect_timeout())
        .build()?;
    let content = fetch_cid(&http, &gateway, &cid).await?;

    match (output, content) {
        (Some(file), content) => {
            let bytes = match &content {
                FetchedContent::Text(text) => text.as_bytes(),
                FetchedContent::Binary(bytes) => bytes.as_slice(),
            };
            std::fs::write(&file, bytes)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Wrote {} bytes to {}", content.len(), file.display());
        }
        (None, FetchedContent::Text(text)) => println!("{text}"),
        (None, FetchedContent::Binary(bytes)) => {
            if bytes.is_empty() {
                bail!("Gateway returned an empty body for {cid}");
            }
            println!("Received {} bytes of binary content (use --output to save it)", bytes.len());
        }
    }
    Ok(())
}
