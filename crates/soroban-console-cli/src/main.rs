use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use soroban_console_core::config::DEFAULT_CONFIG_FILE;
use soroban_console_core::{
    contract_instance_key, decode, decode_base64, derive_key_from_input, encode, encode_base64,
    format_native, resolve, sniff, CodecError, ConsoleConfig, DecodedFrame, EntryState,
    NativeValue, ResolvedEntries, StellarRpcClient, StorageDurability, StorageKey, ValueType,
};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soroban-console")]
#[command(about = "Inspect Soroban contract storage and XDR values", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: String,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a typed value as ScVal XDR
    Encode {
        /// Value type: symbol, string, i32, u32, i128, u128, address
        #[arg(long = "type", short = 't')]
        value_type: ValueType,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Decode a base64 ScVal
    DecodeValue {
        /// Base64 XDR
        xdr: String,
    },

    /// Compute the contract-data ledger key for a storage slot
    LedgerKey {
        /// Contract ID (C...)
        #[arg(long)]
        contract: String,

        /// Key type
        #[arg(long = "type", short = 't', default_value = "symbol")]
        value_type: ValueType,

        /// Key value
        #[arg(allow_hyphen_values = true)]
        value: String,

        #[arg(long, default_value = "persistent")]
        durability: StorageDurability,
    },

    /// Fetch watched storage keys of a contract in one batch
    Storage {
        /// Contract ID (C...)
        #[arg(long)]
        contract: String,

        /// Key as <type>:<value>, repeatable
        #[arg(long = "key", required = true, allow_hyphen_values = true)]
        keys: Vec<String>,

        #[arg(long, default_value = "persistent")]
        durability: StorageDurability,

        /// Network id or custom network name from the config
        #[arg(long)]
        network: Option<String>,

        /// Explicit RPC endpoint, overrides --network
        #[arg(long)]
        rpc_url: Option<String>,
    },

    /// Detect the shape of an arbitrary base64 XDR blob
    Sniff {
        /// Base64 XDR
        xdr: String,
    },

    /// List known networks
    Networks,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let load_config = || ConsoleConfig::load(args.config.as_deref());
    let json = args.format == "json";

    match args.command {
        Commands::Encode { value_type, value } => encode_command(value_type, &value, json),
        Commands::DecodeValue { xdr } => decode_value_command(&xdr, json),
        Commands::LedgerKey {
            contract,
            value_type,
            value,
            durability,
        } => ledger_key_command(&contract, value_type, &value, durability, json),
        Commands::Storage {
            contract,
            keys,
            durability,
            network,
            rpc_url,
        } => {
            let endpoint = match rpc_url {
                Some(url) => url,
                None => load_config()?.endpoint(network.as_deref())?,
            };
            storage_command(&endpoint, &contract, &keys, durability, json).await
        }
        Commands::Sniff { xdr } => sniff_command(&xdr, json),
        Commands::Networks => networks_command(&load_config()?, json),
        Commands::Init { force } => {
            let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
            init_config(path, force)?;
            println!("{} {}", "Wrote".green(), path);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn encode_command(value_type: ValueType, value: &str, json: bool) -> Result<()> {
    let scval = encode(value_type, value)?;
    let xdr = encode_base64(&scval)?;
    let native = decode(&scval)?;

    if json {
        print_json(&EncodeReport {
            value_type,
            xdr: &xdr,
            value: &native,
        })?;
    } else {
        println!("{} {}", "Type:".bold(), value_type);
        println!("{} {}", "Value:".bold(), native);
        println!("{} {}", "XDR:".bold(), xdr.green());
    }
    Ok(())
}

fn decode_value_command(xdr: &str, json: bool) -> Result<()> {
    let native = decode_base64(xdr)?;
    if json {
        print_json(&native)?;
    } else {
        println!("{}", format_native(&native, 0));
    }
    Ok(())
}

fn ledger_key_command(
    contract: &str,
    value_type: ValueType,
    value: &str,
    durability: StorageDurability,
    json: bool,
) -> Result<()> {
    let key = derive_key_from_input(contract, value_type, value, durability)?;

    if json {
        print_json(&LedgerKeyReport {
            contract,
            key_type: value_type,
            key_value: value,
            durability,
            ledger_key: key.to_base64(),
        })?;
    } else {
        println!("{} {}", "Contract:".bold(), contract);
        println!("{} {}:{} ({})", "Key:".bold(), value_type, value, durability);
        println!("{} {}", "LedgerKey:".bold(), key.to_base64().green());
    }
    Ok(())
}

async fn storage_command(
    endpoint: &str,
    contract: &str,
    key_specs: &[String],
    durability: StorageDurability,
    json: bool,
) -> Result<()> {
    let mut watched: Vec<(&str, StorageKey)> = Vec::with_capacity(key_specs.len());
    for spec in key_specs {
        let (value_type, value) = parse_key_spec(spec)?;
        let key = derive_key_from_input(contract, value_type, value, durability)
            .with_context(|| format!("Invalid storage key '{}'", spec))?;
        debug!(key = %spec, ledger_key = %key, "derived storage key");
        watched.push((spec.as_str(), key));
    }

    info!(endpoint, contract, keys = watched.len(), "fetching contract storage");

    // The instance entry rides along in the same batch to tell a missing
    // contract apart from missing keys
    let instance_key = contract_instance_key(contract)?;
    let mut candidates: Vec<StorageKey> = watched.iter().map(|(_, key)| key.clone()).collect();
    candidates.push(instance_key.clone());

    let client = StellarRpcClient::new(endpoint);
    let resolved = resolve(&candidates, &client).await?;
    let deployed = contract_deployed(&resolved, &instance_key);

    if json {
        let entries: Vec<StorageReportEntry> = watched
            .iter()
            .map(|(spec, key)| StorageReportEntry {
                key: spec,
                ledger_key: key.to_base64(),
                entry: resolved.get(key).cloned().unwrap_or(EntryState::Absent),
            })
            .collect();
        print_json(&StorageReport {
            contract,
            endpoint,
            contract_deployed: deployed,
            entries,
        })?;
    } else {
        let rows: Vec<StorageRow> = watched
            .iter()
            .map(|(spec, key)| match resolved.get(key) {
                Some(state) => StorageRow::new(spec, state),
                None => StorageRow::new(spec, &EntryState::Absent),
            })
            .collect();
        let found = rows.iter().filter(|row| row.status == "found").count();
        println!("{} {}", "Contract Storage:".bold(), contract);
        if !deployed {
            println!("{}", "Contract instance not found on this network".yellow());
        }
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!(
            "{} found, {} absent",
            found.to_string().green(),
            (watched.len() - found).to_string().yellow()
        );
    }
    Ok(())
}

fn contract_deployed(resolved: &ResolvedEntries, instance_key: &StorageKey) -> bool {
    resolved
        .get(instance_key)
        .map(EntryState::is_present)
        .unwrap_or(false)
}

fn sniff_command(xdr: &str, json: bool) -> Result<()> {
    match sniff(xdr) {
        DecodedFrame::Matched { shape, tree } => {
            if json {
                print_json(&serde_json::json!({ "type": shape.name(), "value": tree }))?;
            } else {
                println!("{} {}", "Detected:".bold(), shape.name().green());
                println!("{}", serde_json::to_string_pretty(&tree)?);
            }
            Ok(())
        }
        DecodedFrame::NoMatch => {
            Err(anyhow!(CodecError::NoMatch).context("Invalid format or unsupported type"))
        }
    }
}

fn networks_command(config: &ConsoleConfig, json: bool) -> Result<()> {
    let listing = config.network_listing();
    if json {
        print_json(&listing)?;
    } else {
        println!("Available Networks:\n");
        for network in &listing {
            let marker = if network.id == config.network.default { "*" } else { " " };
            println!(" {} {} ({})", marker, network.id.bold(), network.name);
            println!("     RPC:        {}", network.rpc_url);
            if let Some(passphrase) = &network.passphrase {
                println!("     Passphrase: {}", passphrase.dimmed());
            }
        }
    }
    Ok(())
}

/// Write the default config to `path`, refusing to clobber an existing file
fn init_config(path: &str, force: bool) -> Result<()> {
    if Path::new(path).exists() && !force {
        return Err(anyhow!("{} already exists, pass --force to overwrite", path));
    }
    ConsoleConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path))
}

/// Split `<type>:<value>`; the value may itself contain colons
fn parse_key_spec(spec: &str) -> Result<(ValueType, &str)> {
    let (ty, value) = spec
        .split_once(':')
        .ok_or_else(|| anyhow!("Storage key '{}' must look like <type>:<value>", spec))?;
    let value_type = ty.parse::<ValueType>().map_err(|e| anyhow!(e))?;
    Ok((value_type, value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Tabled)]
struct StorageRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Last Modified")]
    last_modified: String,
}

impl StorageRow {
    fn new(spec: &str, state: &EntryState) -> Self {
        match state {
            EntryState::Absent => Self {
                key: spec.to_string(),
                status: "absent".to_string(),
                value: "-".to_string(),
                last_modified: "-".to_string(),
            },
            EntryState::Present {
                value,
                last_modified_ledger_seq,
                ..
            } => Self {
                key: spec.to_string(),
                status: "found".to_string(),
                value: match value.decoded() {
                    Some(native) => format_native(native, 0),
                    None => value.to_string(),
                },
                last_modified: last_modified_ledger_seq.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct EncodeReport<'a> {
    value_type: ValueType,
    xdr: &'a str,
    value: &'a NativeValue,
}

#[derive(Serialize)]
struct LedgerKeyReport<'a> {
    contract: &'a str,
    key_type: ValueType,
    key_value: &'a str,
    durability: StorageDurability,
    ledger_key: String,
}

#[derive(Serialize)]
struct StorageReport<'a> {
    contract: &'a str,
    endpoint: &'a str,
    contract_deployed: bool,
    entries: Vec<StorageReportEntry<'a>>,
}

#[derive(Serialize)]
struct StorageReportEntry<'a> {
    key: &'a str,
    ledger_key: String,
    entry: EntryState,
}
