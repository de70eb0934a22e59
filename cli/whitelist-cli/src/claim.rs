use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use whitelist_cli::entry::parse_amount;
use whitelist_cli::{
    hex_encode, parse_address, private_key_to_address, verify_proof, write_file_atomic, Address,
    ClaimFile, Entry, TreeFile, WhitelistError,
};

#[derive(Parser, Debug)]
#[command(about = "Generate a whitelist claim proof", long_about = None)]
#[command(group(ArgGroup::new("claimer").required(true).args(["account", "private_key"])))]
pub struct Cli {
    /// Tree JSON file written by `build-tree`
    #[arg(short = 't', long)]
    tree: PathBuf,

    /// Claiming account address
    #[arg(short = 'a', long)]
    account: Option<String>,

    /// Private key of the claiming account (hex, with or without 0x prefix)
    /// Alternatively, use "-" to read from stdin (more secure)
    #[arg(short = 'k', long)]
    private_key: Option<String>,

    /// Allocation amount being claimed
    #[arg(short = 'm', long)]
    amount: String,

    /// Output claim JSON file
    #[arg(short, long)]
    output: PathBuf,
}

fn read_private_key(arg: &str) -> Result<[u8; 32]> {
    let mut key_str = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = buffer.trim().to_string();
        buffer.zeroize();
        trimmed
    } else {
        arg.trim().to_string()
    };

    let decoded = match key_str.strip_prefix("0x").unwrap_or(&key_str) {
        "" => None,
        cleaned => Some(hex::decode(cleaned)),
    };
    key_str.zeroize();
    let mut key_bytes = decoded
        .context("Private key is empty")?
        .context("Invalid private key format")?;

    if key_bytes.len() != 32 {
        let len = key_bytes.len();
        key_bytes.zeroize();
        anyhow::bail!("Invalid private key length: expected 32 bytes, got {}", len);
    }
    let mut private_key_bytes = [0u8; 32];
    private_key_bytes.copy_from_slice(&key_bytes);
    key_bytes.zeroize();
    Ok(private_key_bytes)
}

fn resolve_account(cli: &Cli) -> Result<Address> {
    if let Some(account) = &cli.account {
        return parse_address(account).context("Invalid account address");
    }
    let key_arg = cli
        .private_key
        .as_deref()
        .context("Either --account or --private-key is required")?;

    let mut private_key_bytes = read_private_key(key_arg)?;
    let signing_key = SigningKey::from_slice(&private_key_bytes);
    private_key_bytes.zeroize();
    let signing_key = signing_key.context("Invalid private key")?;

    println!("Deriving address from private key...");
    Ok(private_key_to_address(&signing_key))
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Loading Merkle tree...");
    let tree_file = TreeFile::load(&cli.tree)?;
    let (tree, _) = tree_file
        .rebuild()
        .context("Tree file failed reproducibility check")?;

    let account = resolve_account(&cli)?;
    let amount = parse_amount(&cli.amount)?;
    let entry = Entry::new(account, amount);

    println!("Generating Merkle proof...");
    let proof = match tree.proof(&account, amount) {
        Ok(proof) => proof,
        Err(WhitelistError::LeafNotFound) => anyhow::bail!(
            "{} is not whitelisted for amount {}",
            hex_encode(account),
            amount
        ),
        Err(e) => return Err(e.into()),
    };

    if !verify_proof(&tree.root(), &account, amount, &proof) {
        anyhow::bail!("Generated proof does not verify against the tree root");
    }

    let claim = ClaimFile::new(tree.root(), &entry, &proof);
    println!("Writing claim JSON to {:?}...", cli.output);
    let json_output = serde_json::to_string_pretty(&claim).context("Failed to serialize JSON")?;
    write_file_atomic(&cli.output, &json_output).context("Failed to write claim file")?;

    println!("\nClaim generated successfully!");
    println!("Claimer address: {}", claim.account);
    println!("Amount: {}", claim.amount);
    println!("Leaf: {}", claim.leaf);
    println!("Proof length: {} nodes", proof.len());

    Ok(())
}
