use std::collections::HashSet;

use crate::common::{hex_encode, Address, Hash};
use crate::error::ClaimError;
use crate::tree::{verify_proof, ProofStep};

/// Off-chain mirror of the airdrop contract's claim bookkeeping.
///
/// The root can be published once; each account can claim once, and only
/// with a proof that verifies against the published root.
#[derive(Debug, Default, Clone)]
pub struct ClaimLedger {
    root: Option<Hash>,
    claimed: HashSet<Address>,
    total_claimed: u128,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<Hash> {
        self.root
    }

    pub fn set_root(&mut self, root: Hash) -> Result<(), ClaimError> {
        if self.root.is_some() {
            log::warn!("rejected second Merkle root {}", hex_encode(root));
            return Err(ClaimError::RootAlreadySet);
        }
        self.root = Some(root);
        Ok(())
    }

    /// Records a claim of `amount` by `account` and returns the amount.
    ///
    /// Nothing is recorded when the claim is rejected.
    pub fn claim(
        &mut self,
        account: &Address,
        amount: u128,
        proof: &[ProofStep],
    ) -> Result<u128, ClaimError> {
        let root = self.root.ok_or(ClaimError::RootNotSet)?;
        if self.claimed.contains(account) {
            log::warn!("rejected repeat claim by {}", hex_encode(account));
            return Err(ClaimError::AlreadyClaimed);
        }
        if !verify_proof(&root, account, amount, proof) {
            log::warn!(
                "rejected claim by {} for {}: invalid proof",
                hex_encode(account),
                amount
            );
            return Err(ClaimError::InvalidProof);
        }

        self.claimed.insert(*account);
        self.total_claimed = self.total_claimed.saturating_add(amount);
        log::debug!("{} claimed {}", hex_encode(account), amount);
        Ok(amount)
    }

    pub fn has_claimed(&self, account: &Address) -> bool {
        self.claimed.contains(account)
    }

    pub fn total_claimed(&self) -> u128 {
        self.total_claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::tree::WhitelistTree;

    fn setup() -> (WhitelistTree, ClaimLedger) {
        let tree = WhitelistTree::build(&[
            Entry::new([1u8; 20], 500),
            Entry::new([2u8; 20], 300),
            Entry::new([3u8; 20], 200),
        ])
        .unwrap();
        let mut ledger = ClaimLedger::new();
        ledger.set_root(tree.root()).unwrap();
        (tree, ledger)
    }

    #[test]
    fn test_root_set_once() {
        let (tree, mut ledger) = setup();
        assert_eq!(ledger.root(), Some(tree.root()));
        assert_eq!(ledger.set_root(tree.root()), Err(ClaimError::RootAlreadySet));
        assert_eq!(ledger.set_root([7u8; 32]), Err(ClaimError::RootAlreadySet));
        assert_eq!(ledger.root(), Some(tree.root()));
    }

    #[test]
    fn test_claim_requires_root() {
        let (tree, _) = setup();
        let proof = tree.proof(&[1u8; 20], 500).unwrap();
        let mut ledger = ClaimLedger::new();
        assert_eq!(
            ledger.claim(&[1u8; 20], 500, &proof),
            Err(ClaimError::RootNotSet)
        );
    }

    #[test]
    fn test_claim_once() {
        let (tree, mut ledger) = setup();
        let proof = tree.proof(&[1u8; 20], 500).unwrap();

        assert_eq!(ledger.claim(&[1u8; 20], 500, &proof), Ok(500));
        assert!(ledger.has_claimed(&[1u8; 20]));
        assert_eq!(
            ledger.claim(&[1u8; 20], 500, &proof),
            Err(ClaimError::AlreadyClaimed)
        );
        assert_eq!(ledger.total_claimed(), 500);
    }

    #[test]
    fn test_rejected_claim_is_not_recorded() {
        let (tree, mut ledger) = setup();
        let proof = tree.proof(&[1u8; 20], 500).unwrap();

        assert_eq!(
            ledger.claim(&[1u8; 20], 501, &proof),
            Err(ClaimError::InvalidProof)
        );
        assert_eq!(
            ledger.claim(&[2u8; 20], 500, &proof),
            Err(ClaimError::InvalidProof)
        );
        assert!(!ledger.has_claimed(&[1u8; 20]));
        assert_eq!(ledger.total_claimed(), 0);

        // The honest claim still goes through afterwards.
        assert_eq!(ledger.claim(&[1u8; 20], 500, &proof), Ok(500));
    }

    #[test]
    fn test_independent_claims() {
        let (tree, mut ledger) = setup();
        for (account, amount) in [([1u8; 20], 500), ([2u8; 20], 300), ([3u8; 20], 200)] {
            let proof = tree.proof(&account, amount).unwrap();
            ledger.claim(&account, amount, &proof).unwrap();
        }
        assert_eq!(ledger.total_claimed(), 1000);
    }
}
