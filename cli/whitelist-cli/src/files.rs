use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::{hex_encode, parse_address, parse_hash, Address, Hash};
use crate::entry::{parse_amount, Entry, EntryRecord};
use crate::tree::{Position, ProofStep, WhitelistTree};

/// Tree file written by `build-tree`: the root plus the entries it commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeFile {
    pub merkle_root: String,
    pub leaf_count: usize,
    pub entries: Vec<EntryRecord>,
}

impl TreeFile {
    pub fn new(tree: &WhitelistTree, entries: &[Entry]) -> Self {
        Self {
            merkle_root: hex_encode(tree.root()),
            leaf_count: tree.leaf_count(),
            entries: entries.iter().map(EntryRecord::from).collect(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read tree file")?;
        serde_json::from_str(&content).context("Failed to parse tree JSON")
    }

    /// Rebuilds the tree and checks it reproduces the recorded root.
    pub fn rebuild(&self) -> anyhow::Result<(WhitelistTree, Vec<Entry>)> {
        let recorded_root = parse_hash(&self.merkle_root).context("Invalid recorded Merkle root")?;
        let entries = self
            .entries
            .iter()
            .map(Entry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid entry in tree file")?;
        crate::entry::ensure_unique_accounts(&entries)?;

        let tree = WhitelistTree::build(&entries)?;
        if tree.leaf_count() != self.leaf_count {
            anyhow::bail!(
                "Tree file records {} leaves but contains {} entries",
                self.leaf_count,
                tree.leaf_count()
            );
        }
        if tree.root() != recorded_root {
            anyhow::bail!(
                "Rebuilt Merkle root {} does not match recorded root {}",
                hex_encode(tree.root()),
                self.merkle_root
            );
        }
        Ok((tree, entries))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStepRecord {
    pub sibling: String,
    pub position: Position,
}

/// Claim file written by `claim` and read by `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFile {
    pub merkle_root: String,
    pub account: String,
    pub amount: String,
    pub leaf: String,
    pub proof: Vec<ProofStepRecord>,
}

/// Claim file contents in binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub merkle_root: Hash,
    pub account: Address,
    pub amount: u128,
    pub proof: Vec<ProofStep>,
}

impl ClaimFile {
    pub fn new(root: Hash, entry: &Entry, proof: &[ProofStep]) -> Self {
        Self {
            merkle_root: hex_encode(root),
            account: hex_encode(entry.account),
            amount: entry.amount.to_string(),
            leaf: hex_encode(entry.leaf()),
            proof: proof
                .iter()
                .map(|step| ProofStepRecord {
                    sibling: hex_encode(step.sibling),
                    position: step.position,
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read claim file")?;
        serde_json::from_str(&content).context("Failed to parse claim JSON")
    }

    /// Decodes the hex fields.
    ///
    /// The `leaf` field is informational and is not trusted; verification
    /// always rehashes the account and amount.
    pub fn decode(&self) -> anyhow::Result<Claim> {
        let proof = self
            .proof
            .iter()
            .enumerate()
            .map(|(i, step)| {
                Ok(ProofStep {
                    sibling: parse_hash(&step.sibling)
                        .with_context(|| format!("Invalid proof node {}", i))?,
                    position: step.position,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Claim {
            merkle_root: parse_hash(&self.merkle_root).context("Invalid Merkle root")?,
            account: parse_address(&self.account).context("Invalid account")?,
            amount: parse_amount(&self.amount)?,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (WhitelistTree, Vec<Entry>) {
        let entries = vec![
            Entry::new([1u8; 20], 500),
            Entry::new([2u8; 20], 300),
            Entry::new([3u8; 20], 100),
        ];
        (WhitelistTree::build(&entries).unwrap(), entries)
    }

    #[test]
    fn test_tree_file_rebuild() {
        let (tree, entries) = sample();
        let file = TreeFile::new(&tree, &entries);
        let json = serde_json::to_string(&file).unwrap();
        let parsed: TreeFile = serde_json::from_str(&json).unwrap();

        let (rebuilt, rebuilt_entries) = parsed.rebuild().unwrap();
        assert_eq!(rebuilt.root(), tree.root());
        assert_eq!(rebuilt_entries, entries);
    }

    #[test]
    fn test_tree_file_detects_tampering() {
        let (tree, entries) = sample();
        let mut file = TreeFile::new(&tree, &entries);
        file.entries[0].amount = "501".to_string();
        let err = file.rebuild().unwrap_err();
        assert!(err.to_string().contains("does not match"));

        let mut file = TreeFile::new(&tree, &entries);
        file.leaf_count = 4;
        assert!(file.rebuild().is_err());
    }

    #[test]
    fn test_claim_file_decode() {
        let (tree, entries) = sample();
        let proof = tree.proof(&entries[1].account, entries[1].amount).unwrap();
        let file = ClaimFile::new(tree.root(), &entries[1], &proof);

        let json = serde_json::to_string_pretty(&file).unwrap();
        assert!(json.contains("\"position\": \"left\"") || json.contains("\"position\": \"right\""));

        let claim: ClaimFile = serde_json::from_str(&json).unwrap();
        let claim = claim.decode().unwrap();
        assert_eq!(claim.merkle_root, tree.root());
        assert_eq!(claim.account, entries[1].account);
        assert_eq!(claim.amount, 300);
        assert_eq!(claim.proof, proof);
    }

    #[test]
    fn test_claim_file_bad_node() {
        let (tree, entries) = sample();
        let proof = tree.proof(&entries[0].account, entries[0].amount).unwrap();
        let mut file = ClaimFile::new(tree.root(), &entries[0], &proof);
        file.proof[0].sibling = "0x1234".to_string();
        let err = file.decode().unwrap_err();
        assert!(format!("{:#}", err).contains("proof node 0"));
    }
}
