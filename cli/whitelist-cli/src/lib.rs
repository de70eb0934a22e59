#![forbid(unsafe_code)]

pub mod common;
pub mod entry;
pub mod error;
pub mod files;
pub mod ledger;
pub mod tree;

pub use common::{
    hex_encode, keccak256_hash, parse_address, parse_hash, private_key_to_address,
    validate_merkle_root, write_file_atomic, Address, Hash,
};
pub use entry::{leaf_hash, load_entries, Entry};
pub use error::{ClaimError, WhitelistError};
pub use files::{Claim, ClaimFile, TreeFile};
pub use ledger::ClaimLedger;
pub use tree::{hash_pair_sorted, verify_leaf, verify_proof, Position, ProofStep, WhitelistTree};
