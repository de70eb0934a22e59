use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::{hex_encode, keccak256, parse_address, Address, Hash};
use crate::error::{Result, WhitelistError};

/// One whitelist allocation: an account and the amount it may claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    pub account: Address,
    pub amount: u128,
}

impl Entry {
    pub fn new(account: Address, amount: u128) -> Self {
        Self { account, amount }
    }

    /// Parses an entry from its textual account and amount.
    pub fn parse(account: &str, amount: &str) -> Result<Self> {
        let account = parse_address(account)
            .map_err(|e| WhitelistError::InvalidEntry(format!("account {:?}: {}", account, e)))?;
        let amount = parse_amount(amount)?;
        Ok(Self { account, amount })
    }

    /// Leaf commitment for this entry, see [`leaf_hash`].
    pub fn leaf(&self) -> Hash {
        leaf_hash(&self.account, self.amount)
    }
}

/// Parses a non-negative decimal allocation amount.
///
/// Signs, separators, exponents and values above `u128::MAX` are rejected.
pub fn parse_amount(amount: &str) -> Result<u128> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WhitelistError::InvalidEntry(format!(
            "amount {:?} is not a non-negative integer",
            amount
        )));
    }
    trimmed
        .parse::<u128>()
        .map_err(|_| WhitelistError::InvalidEntry(format!("amount {:?} is out of range", amount)))
}

/// Encodes an amount as a big-endian `uint256` word.
pub fn amount_to_word(amount: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..32].copy_from_slice(&amount.to_be_bytes());
    word
}

/// Computes the whitelist leaf for an account and amount.
///
/// `keccak256(account || uint256(amount))`, matching Solidity's
/// `keccak256(abi.encodePacked(address, uint256))`.
pub fn leaf_hash(account: &Address, amount: u128) -> Hash {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(account);
    packed[20..].copy_from_slice(&amount_to_word(amount));
    keccak256(&packed)
}

/// Serialized form of an entry, used in tree files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub account: String,
    pub amount: String,
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            account: hex_encode(entry.account),
            amount: entry.amount.to_string(),
        }
    }
}

impl TryFrom<&EntryRecord> for Entry {
    type Error = WhitelistError;

    fn try_from(record: &EntryRecord) -> Result<Self> {
        Entry::parse(&record.account, &record.amount)
    }
}

/// Fails with [`WhitelistError::DuplicateAccount`] on the first account seen twice.
pub fn ensure_unique_accounts(entries: &[Entry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.account) {
            return Err(WhitelistError::DuplicateAccount(hex_encode(entry.account)));
        }
    }
    Ok(())
}

/// Parses one `address,amount` snapshot line.
pub fn parse_snapshot_line(line: &str) -> Result<Entry> {
    let (account, amount) = line.split_once(',').ok_or_else(|| {
        WhitelistError::InvalidEntry(format!("expected 'address,amount', got {:?}", line))
    })?;
    Entry::parse(account, amount)
}

fn is_header_line(line: &str) -> bool {
    match line.split_once(',') {
        Some((account, amount)) => {
            let account = account.trim();
            (account.eq_ignore_ascii_case("address") || account.eq_ignore_ascii_case("account"))
                && amount.trim().eq_ignore_ascii_case("amount")
        }
        None => false,
    }
}

/// Loads a whitelist snapshot: one `address,amount` entry per line.
///
/// Blank lines and `#` comments are skipped, as is a leading
/// `address,amount` (or `account,amount`) header row.
pub fn load_entries(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let file = File::open(path).context("Failed to open snapshot file")?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    let mut seen_content = false;
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let first_content = !seen_content;
        seen_content = true;
        if first_content && is_header_line(trimmed) {
            continue;
        }
        let entry = parse_snapshot_line(trimmed)
            .with_context(|| format!("Invalid entry at line {}", line_num + 1))?;
        entries.push(entry);
    }

    if entries.is_empty() {
        anyhow::bail!("Snapshot file contains no entries");
    }
    ensure_unique_accounts(&entries)?;
    log::debug!("loaded {} entries from {:?}", entries.len(), path);

    Ok(entries)
}
