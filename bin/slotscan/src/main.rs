use std::path::PathBuf;

use alloy_primitives::Address;
use alloy_provider::ProviderBuilder;
use clap::Parser;
use eyre::WrapErr;
use slotscan_layout::load_layout;
use slotscan_storage::{ReadOptions, RpcStorageProvider, normalize_block_reference, read_storage};
use tracing_subscriber::EnvFilter;

/// Reads a contract's storage through JSON-RPC and decodes it against a
/// compiler storage layout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON-RPC endpoint of an Ethereum node.
    #[arg(long, env = "ETH_RPC_URL")]
    rpc_url: String,

    /// Address of the deployed contract.
    #[arg(long)]
    address: Address,

    /// Storage layout file: a bare layout or `--combined-json` compiler output.
    #[arg(long)]
    layout: PathBuf,

    /// Contract to select from combined compiler output, by full or short name.
    #[arg(long)]
    contract: Option<String>,

    /// Only read these top-level variables.
    #[arg(long = "var", value_name = "LABEL")]
    vars: Vec<String>,

    /// Mapping key probe, e.g. `balances[0xabc...]`.
    #[arg(long = "map-key", value_name = "PROBE")]
    map_keys: Vec<String>,

    /// Block tag, number or hash to read at.
    #[arg(long)]
    block: Option<String>,

    /// Longest dynamic array or byte string to read. Longer values are
    /// reported as `<oversized: N>`. Unbounded by default.
    #[arg(long)]
    max_dynamic_len: Option<usize>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let layout = load_layout(&args.layout, args.contract.as_deref())
        .wrap_err_with(|| format!("failed to load layout from `{}`", args.layout.display()))?;
    let block = normalize_block_reference(args.block.as_deref()).wrap_err("invalid block")?;

    tracing::info!(
        address = %args.address,
        rpc_url = %args.rpc_url,
        variables = layout.storage.len(),
        probes = args.map_keys.len(),
        "reading contract storage"
    );

    let provider = ProviderBuilder::new()
        .connect(&args.rpc_url)
        .await
        .wrap_err("failed to connect to RPC")?;
    let storage = RpcStorageProvider::new(provider, args.address);

    let options = ReadOptions {
        map_keys: args.map_keys,
        vars: (!args.vars.is_empty()).then_some(args.vars),
        block,
        max_dynamic_len: args.max_dynamic_len,
    };
    let snapshot = read_storage(&storage, &layout, &options)
        .await
        .wrap_err("failed to read contract storage")?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{output}");

    Ok(())
}
