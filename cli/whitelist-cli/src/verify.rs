use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use whitelist_cli::{hex_encode, validate_merkle_root, verify_proof, ClaimFile};

#[derive(Parser, Debug)]
#[command(about = "Verify a claim proof against a Merkle root", long_about = None)]
pub struct Cli {
    /// Claim JSON file written by `claim`
    #[arg(short, long)]
    input: PathBuf,

    /// Published Merkle root; defaults to the root recorded in the claim
    #[arg(short, long)]
    root: Option<String>,
}

pub fn run(cli: &Cli) -> Result<()> {
    println!("Reading claim from {:?}...", cli.input);
    let claim = ClaimFile::load(&cli.input)?
        .decode()
        .context("Malformed claim file")?;

    let root = match &cli.root {
        Some(root) => validate_merkle_root(root).context("Invalid Merkle root")?,
        None => claim.merkle_root,
    };
    if root != claim.merkle_root {
        log::warn!(
            "claim was issued for root {}, verifying against {}",
            hex_encode(claim.merkle_root),
            hex_encode(root)
        );
    }

    println!("Account: {}", hex_encode(claim.account));
    println!("Amount: {}", claim.amount);
    println!("Merkle root: {}", hex_encode(root));

    if !verify_proof(&root, &claim.account, claim.amount, &claim.proof) {
        anyhow::bail!("Proof is INVALID");
    }

    println!("\nProof is valid.");
    Ok(())
}
