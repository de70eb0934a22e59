use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use whitelist_cli::{hex_encode, load_entries, write_file_atomic, TreeFile, WhitelistTree};

#[derive(Parser, Debug)]
#[command(about = "Build the whitelist Merkle tree from a snapshot", long_about = None)]
pub struct Cli {
    /// Snapshot file with one `address,amount` entry per line
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for the Merkle root
    #[arg(short, long)]
    root_output: PathBuf,

    /// Output JSON file for the tree (needed by `claim`)
    #[arg(short, long)]
    tree_output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Reading entries from {:?}...", cli.input);
    let entries = load_entries(&cli.input)?;
    println!("Total entries: {}", entries.len());

    println!("Building Merkle tree...");
    let tree = WhitelistTree::build(&entries)?;
    let root = hex_encode(tree.root());
    println!("Merkle root: {}", root);

    write_file_atomic(&cli.root_output, &format!("{}\n", root))
        .context("Failed to write root file")?;

    if let Some(tree_path) = cli.tree_output {
        println!("Writing Merkle tree to {:?}...", tree_path);
        let tree_file = TreeFile::new(&tree, &entries);
        let json = serde_json::to_string_pretty(&tree_file).context("Failed to serialize tree")?;
        write_file_atomic(&tree_path, &json).context("Failed to write tree file")?;
    }

    log::info!("tree depth {}", tree.depth());
    println!("Done!");
    Ok(())
}
