use serde::{Deserialize, Serialize};

use crate::common::{keccak256_hash, Address, Hash};
use crate::entry::{leaf_hash, Entry};
use crate::error::{Result, WhitelistError};

/// Which side of the running hash a proof sibling sat on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Hash,
    pub position: Position,
}

/// Parent of two nodes: Keccak256 of the pair in ascending byte order.
pub fn hash_pair_sorted(a: Hash, b: Hash) -> Hash {
    if a <= b {
        keccak256_hash(a, b)
    } else {
        keccak256_hash(b, a)
    }
}

/// Merkle tree over the sorted leaves of a whitelist.
///
/// `levels[0]` holds the sorted leaves, the last level holds the root. An
/// unpaired last node is carried up to the next level unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistTree {
    levels: Vec<Vec<Hash>>,
}

impl WhitelistTree {
    /// Builds the tree for `entries`.
    ///
    /// The root only depends on the set of entries, not on their order.
    pub fn build(entries: &[Entry]) -> Result<Self> {
        if entries.is_empty() {
            return Err(WhitelistError::EmptyWhitelist);
        }

        let mut leaves: Vec<Hash> = entries.iter().map(Entry::leaf).collect();
        leaves.sort_unstable();

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next_level: Vec<Hash> = level
                .chunks(2)
                .map(|chunk| {
                    let left = chunk[0];
                    match chunk.get(1) {
                        Some(&right) => hash_pair_sorted(left, right),
                        None => left,
                    }
                })
                .collect();
            levels.push(next_level);
        }

        let tree = Self { levels };
        log::debug!(
            "built whitelist tree: {} leaves, depth {}, root {}",
            tree.leaf_count(),
            tree.depth(),
            crate::common::hex_encode(tree.root())
        );
        Ok(tree)
    }

    /// Parses raw `(account, amount)` text pairs and builds the tree.
    ///
    /// Fails on the first malformed pair; no partial tree is returned.
    pub fn build_from_pairs<A, M>(pairs: &[(A, M)]) -> Result<Self>
    where
        A: AsRef<str>,
        M: AsRef<str>,
    {
        let entries = pairs
            .iter()
            .map(|(account, amount)| Entry::parse(account.as_ref(), amount.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::build(&entries)
    }

    pub fn root(&self) -> Hash {
        // `build` never produces an empty level.
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Sorted leaves.
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    pub fn contains(&self, account: &Address, amount: u128) -> bool {
        self.leaf_index(&leaf_hash(account, amount)).is_some()
    }

    fn leaf_index(&self, leaf: &Hash) -> Option<usize> {
        self.levels[0].binary_search(leaf).ok()
    }

    /// Sibling path from the `(account, amount)` leaf up to the root.
    pub fn proof(&self, account: &Address, amount: u128) -> Result<Vec<ProofStep>> {
        let leaf = leaf_hash(account, amount);
        let leaf_index = self.leaf_index(&leaf).ok_or(WhitelistError::LeafNotFound)?;
        Ok(self.proof_for_index(leaf_index))
    }

    fn proof_for_index(&self, leaf_index: usize) -> Vec<ProofStep> {
        let mut proof = Vec::with_capacity(self.depth());
        let mut current_index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = current_index ^ 1;
            if let Some(&sibling) = level.get(sibling_index) {
                let position = if sibling_index < current_index {
                    Position::Left
                } else {
                    Position::Right
                };
                proof.push(ProofStep { sibling, position });
            }
            current_index /= 2;
        }

        proof
    }
}

/// Recomputes the root from `leaf` through `proof` and compares it to `root`.
///
/// Each step hashes the sorted pair, so the position hints are not consulted.
pub fn verify_leaf(root: &Hash, leaf: Hash, proof: &[ProofStep]) -> bool {
    let computed = proof
        .iter()
        .fold(leaf, |current, step| hash_pair_sorted(current, step.sibling));
    computed == *root
}

/// Checks that `(account, amount)` is committed to by `root`.
///
/// A forged, truncated or mismatched proof yields `false`, never an error.
pub fn verify_proof(root: &Hash, account: &Address, amount: u128, proof: &[ProofStep]) -> bool {
    verify_leaf(root, leaf_hash(account, amount), proof)
}
