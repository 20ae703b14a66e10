//! Genesis seeding.
//!
//! The store does not construct the genesis block itself — block
//! construction, hashing, and signing stay the caller's job. `Genesis` only
//! calls the primitives the store already exposes to land the well-known
//! opening block of an account.

use crate::block::{Block, OpenBlock};
use crate::codec::{Account, Hash256, Signature, Work};
use crate::error::StoreError;
use crate::store::Store;
use crate::tables::Frontier;

/// The well-known opening block of the ledger's genesis account.
pub struct Genesis {
    pub account: Account,
    pub representative: Account,
    pub signature: Signature,
    pub work: Work,
}

impl Genesis {
    /// Seeds `store` with this genesis account's open block and frontier.
    ///
    /// After this call, `store.latest_get(self.account)` returns a frontier
    /// whose `hash` is the open block's hash and whose `timestamp` is
    /// `Store::now()`, and the block is retrievable as an `open` variant.
    pub fn seed(&self, store: &Store) -> Result<(), StoreError> {
        let block = Block::Open(OpenBlock {
            source: Hash256::ZERO,
            representative: self.representative,
            account: self.account,
            signature: self.signature,
            work: self.work,
        });
        let hash = block.hash();
        store.block_put(hash, block)?;
        store.latest_put(
            self.account,
            Frontier {
                hash,
                representative: self.representative,
                balance: Default::default(),
                timestamp: Store::now(),
            },
        )
    }
}
