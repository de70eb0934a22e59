use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

pub type Address = [u8; 20];
pub type Hash = [u8; 32];

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Returns
/// A 20-byte array representing the address
///
/// # Errors
/// Returns an error if the address is not 40 hex characters, contains invalid
/// hex, or is the zero address
pub fn parse_address(addr_str: &str) -> anyhow::Result<Address> {
    let cleaned = strip_hex_prefix(addr_str);
    if cleaned.len() != 40 {
        anyhow::bail!(
            "Invalid address length: expected 40 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    if address == [0u8; 20] {
        anyhow::bail!("Zero address not allowed");
    }
    Ok(address)
}

/// Parses a 32-byte hash (Merkle root, leaf or proof node) from hex.
pub fn parse_hash(hash_str: &str) -> anyhow::Result<Hash> {
    let cleaned = strip_hex_prefix(hash_str);
    if cleaned.len() != 64 {
        anyhow::bail!(
            "Invalid hash length: expected 64 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    Ok(hash)
}

/// Validates a Merkle root given on the command line.
///
/// An all-zero root is never produced by a real tree and is rejected.
pub fn validate_merkle_root(root_str: &str) -> anyhow::Result<Hash> {
    let root = parse_hash(root_str)?;
    if root == [0u8; 32] {
        anyhow::bail!("Zero Merkle root not allowed");
    }
    Ok(root)
}

fn strip_hex_prefix(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Lowercase `0x`-prefixed hex.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Keccak256 over arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Computes a Keccak256 hash of two 32-byte values concatenated.
///
/// Callers that need an order-independent parent must sort the pair first;
/// see [`crate::tree::hash_pair_sorted`].
pub fn keccak256_hash(left: Hash, right: Hash) -> Hash {
    let hash = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();
    hash.into()
}

/// Derives the Ethereum address controlled by a secp256k1 signing key.
pub fn private_key_to_address(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key();
    let encoded = public_key.to_encoded_point(false);
    let pub_bytes = encoded.as_bytes();
    let hash = Keccak256::digest(&pub_bytes[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
///
/// The temp file is removed if any step fails.
pub fn write_file_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let temp_path = temp_path_for(path);
    let result = write_and_rename(&temp_path, path, contents);
    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

/// `<name>.tmp` next to `path`; never equal to `path` itself.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_and_rename(temp_path: &Path, path: &Path, contents: &str) -> anyhow::Result<()> {
    let mut file = File::create(temp_path).context("Failed to create temp file")?;
    file.write_all(contents.as_bytes())
        .context("Failed to write to temp file")?;
    file.flush().context("Failed to flush temp file")?;
    file.sync_all().context("Failed to sync temp file")?;
    drop(file);
    std::fs::rename(temp_path, path).context("Failed to move temp file to output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = "0x1234567890abcdef1234567890abcdef12345678";
        let result = parse_address(addr).unwrap();
        assert_eq!(result[0], 0x12);
        assert_eq!(result[19], 0x78);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let addr = "1234567890abcdef1234567890abcdef12345678";
        assert!(parse_address(addr).is_ok());
    }

    #[test]
    fn test_parse_address_mixed_case_checksum() {
        let addr = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        let result = parse_address(addr).unwrap();
        assert_eq!(hex_encode(result), addr.to_lowercase());
    }

    #[test]
    fn test_parse_address_invalid_length() {
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        assert!(parse_address("0xghijklmnopqrstuvwxyz1234567890abcdefghij").is_err());
    }

    #[test]
    fn test_parse_address_zero() {
        assert!(parse_address("0x0000000000000000000000000000000000000000").is_err());
    }

    #[test]
    fn test_validate_merkle_root() {
        let root = format!("0x{}", "ab".repeat(32));
        assert_eq!(validate_merkle_root(&root).unwrap(), [0xab; 32]);
        assert!(validate_merkle_root(&"00".repeat(32)).is_err());
        assert!(validate_merkle_root("0xabcd").is_err());
    }

    #[test]
    fn test_keccak256_empty() {
        // Well-known Keccak256 of the empty string.
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_hash_matches_concatenation() {
        let left: Hash = [1u8; 32];
        let right: Hash = [2u8; 32];
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&left);
        buf[32..].copy_from_slice(&right);
        assert_eq!(keccak256_hash(left, right), keccak256(&buf));
        assert_ne!(keccak256_hash(left, right), keccak256_hash(right, left));
    }

    #[test]
    fn test_private_key_to_address_known_vector() {
        // First default Hardhat/Anvil account.
        let key = hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();
        let signing_key = SigningKey::from_slice(&key).unwrap();
        assert_eq!(
            hex_encode(private_key_to_address(&signing_key)),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_write_file_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.txt");
        write_file_atomic(&path, "0xabc\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0xabc\n");
        assert!(!dir.path().join("root.txt.tmp").exists());
    }

    #[test]
    fn test_write_file_atomic_tmp_named_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim.tmp");
        write_file_atomic(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("claim.tmp.tmp").exists());
    }

    #[test]
    fn test_write_file_atomic_cleans_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory fails.
        let path = dir.path().join("out");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(write_file_atomic(&path, "data").is_err());
        assert!(!dir.path().join("out.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_uppercase_hex_prefix() {
        let addr = "0X70997970C51812dc3A010C7d01b50e0d17dc79C8";
        assert_eq!(
            hex_encode(parse_address(addr).unwrap()),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
        let root = format!("0X{}", "ab".repeat(32));
        assert_eq!(parse_hash(&root).unwrap(), [0xab; 32]);
        assert_eq!(validate_merkle_root(&root).unwrap(), [0xab; 32]);
    }
}
