//! The block polymorphic codec.
//!
//! Blocks form a closed set of variants (`send`, `receive`, `open`,
//! `change`). The store never interprets their fields: it only serializes,
//! recovers the right variant from bytes, compares decoded blocks for value
//! equality, and clones them. Hashing, signing, and signature verification
//! are the caller's job.

use crate::codec::{Account, Hash256, Signature, Work};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use libmdbx::orm::{Decodable, Encodable};

/// One-byte on-disk tag. Stable wire values, pinned here for the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockType {
    Send = 0,
    Receive = 1,
    Open = 2,
    Change = 3,
}

impl BlockType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Send),
            1 => Some(Self::Receive),
            2 => Some(Self::Open),
            3 => Some(Self::Change),
            _ => None,
        }
    }
}

/// A send block: debits `balance` from the account extending `previous`
/// and earmarks the remainder for `destination` as a pending receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendBlock {
    pub previous: Hash256,
    pub destination: Account,
    pub balance: u128,
    pub signature: Signature,
    pub work: Work,
}

/// A receive block: claims the pending receivable created by `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub previous: Hash256,
    pub source: Hash256,
    pub signature: Signature,
    pub work: Work,
}

/// An open block: the first block of an account, claiming the receivable
/// at `source` and naming both the account itself and its representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    pub source: Hash256,
    pub representative: Account,
    pub account: Account,
    pub signature: Signature,
    pub work: Work,
}

/// A change block: changes the account's representative without moving
/// funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeBlock {
    pub previous: Hash256,
    pub representative: Account,
    pub signature: Signature,
    pub work: Work,
}

/// The closed set of block variants this ledger can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Send(_) => BlockType::Send,
            Block::Receive(_) => BlockType::Receive,
            Block::Open(_) => BlockType::Open,
            Block::Change(_) => BlockType::Change,
        }
    }

    /// The hash the block extends: `previous` for every variant except
    /// `open`, which instead extends the account itself (it has no
    /// predecessor).
    pub fn root(&self) -> Hash256 {
        match self {
            Block::Send(b) => b.previous,
            Block::Receive(b) => b.previous,
            Block::Open(b) => b.account,
            Block::Change(b) => b.previous,
        }
    }

    pub fn work(&self) -> Work {
        match self {
            Block::Send(b) => b.work,
            Block::Receive(b) => b.work,
            Block::Open(b) => b.work,
            Block::Change(b) => b.work,
        }
    }

    pub fn signature(&self) -> Signature {
        match self {
            Block::Send(b) => b.signature,
            Block::Receive(b) => b.signature,
            Block::Open(b) => b.signature,
            Block::Change(b) => b.signature,
        }
    }

    /// Content hash over the block's hashable fields (excludes signature
    /// and work, which do not participate in what is being signed).
    pub fn hash(&self) -> Hash256 {
        let mut hasher = Blake2bVar::new(32).expect("32 is a valid blake2b digest size");
        hasher.update(&[self.block_type() as u8]);
        match self {
            Block::Send(b) => {
                hasher.update(&b.previous.0);
                hasher.update(&b.destination.0);
                hasher.update(&b.balance.to_be_bytes());
            }
            Block::Receive(b) => {
                hasher.update(&b.previous.0);
                hasher.update(&b.source.0);
            }
            Block::Open(b) => {
                hasher.update(&b.source.0);
                hasher.update(&b.representative.0);
                hasher.update(&b.account.0);
            }
            Block::Change(b) => {
                hasher.update(&b.previous.0);
                hasher.update(&b.representative.0);
            }
        }
        let mut out = [0u8; 32];
        hasher
            .finalize_variable(&mut out)
            .expect("32-byte buffer matches the configured digest size");
        Hash256(out)
    }

    fn body_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(body_len(self.block_type()));
        match self {
            Block::Send(b) => {
                out.extend_from_slice(&b.previous.0);
                out.extend_from_slice(&b.destination.0);
                out.extend_from_slice(&b.balance.to_be_bytes());
            }
            Block::Receive(b) => {
                out.extend_from_slice(&b.previous.0);
                out.extend_from_slice(&b.source.0);
            }
            Block::Open(b) => {
                out.extend_from_slice(&b.source.0);
                out.extend_from_slice(&b.representative.0);
                out.extend_from_slice(&b.account.0);
            }
            Block::Change(b) => {
                out.extend_from_slice(&b.previous.0);
                out.extend_from_slice(&b.representative.0);
            }
        }
        out.extend_from_slice(&self.signature().0);
        out.extend_from_slice(&self.work().to_be_bytes());
        out
    }
}

/// Length of a variant's hashable body plus its trailing signature and
/// work nonce, used to validate decode input and size encode buffers.
/// There is no length prefix on disk: the tag alone determines how many
/// trailing bytes to read.
const fn body_len(tag: BlockType) -> usize {
    let hashable = match tag {
        BlockType::Send => 32 + 32 + 16,
        BlockType::Receive => 32 + 32,
        BlockType::Open => 32 + 32 + 32,
        BlockType::Change => 32 + 32,
    };
    hashable + 64 + 8
}

impl Encodable for Block {
    type Encoded = Vec<u8>;

    fn encode(self) -> Self::Encoded {
        let mut out = Vec::with_capacity(1 + body_len(self.block_type()));
        out.push(self.block_type() as u8);
        out.extend_from_slice(&self.body_bytes());
        out
    }
}

impl Decodable for Block {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let (&tag, body) = bytes
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty block record"))?;
        let block_type =
            BlockType::from_tag(tag).ok_or_else(|| anyhow::anyhow!("unknown block tag {tag}"))?;
        if body.len() != body_len(block_type) {
            anyhow::bail!(
                "block tag {tag} expects a {}-byte body, got {}",
                body_len(block_type),
                body.len()
            );
        }

        let mut cursor = body;
        let mut take = |n: usize| -> &[u8] {
            let (head, rest) = cursor.split_at(n);
            cursor = rest;
            head
        };
        let hash32 = |s: &[u8]| Hash256(s.try_into().expect("exact length sliced above"));

        let block = match block_type {
            BlockType::Send => {
                let previous = hash32(take(32));
                let destination = hash32(take(32));
                let balance = u128::from_be_bytes(take(16).try_into()?);
                let signature = Signature(take(64).try_into()?);
                let work = u64::from_be_bytes(take(8).try_into()?);
                Block::Send(SendBlock {
                    previous,
                    destination,
                    balance,
                    signature,
                    work,
                })
            }
            BlockType::Receive => {
                let previous = hash32(take(32));
                let source = hash32(take(32));
                let signature = Signature(take(64).try_into()?);
                let work = u64::from_be_bytes(take(8).try_into()?);
                Block::Receive(ReceiveBlock {
                    previous,
                    source,
                    signature,
                    work,
                })
            }
            BlockType::Open => {
                let source = hash32(take(32));
                let representative = hash32(take(32));
                let account = hash32(take(32));
                let signature = Signature(take(64).try_into()?);
                let work = u64::from_be_bytes(take(8).try_into()?);
                Block::Open(OpenBlock {
                    source,
                    representative,
                    account,
                    signature,
                    work,
                })
            }
            BlockType::Change => {
                let previous = hash32(take(32));
                let representative = hash32(take(32));
                let signature = Signature(take(64).try_into()?);
                let work = u64::from_be_bytes(take(8).try_into()?);
                Block::Change(ChangeBlock {
                    previous,
                    representative,
                    signature,
                    work,
                })
            }
        };
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_open(account: u64) -> Block {
        Block::Open(OpenBlock {
            source: Hash256::from_u64(0),
            representative: Hash256::from_u64(0),
            account: Hash256::from_u64(account),
            signature: Signature::default(),
            work: 0,
        })
    }

    #[test]
    fn round_trips_through_bytes() {
        let block = sample_open(7);
        let encoded = block.encode();
        let decoded = Block::decode(&encoded).expect("well-formed body decodes");
        assert_eq!(block, decoded);
    }

    #[test]
    fn unknown_tag_is_a_decode_failure() {
        let mut bytes = sample_open(1).encode();
        bytes[0] = 0xFF;
        assert!(Block::decode(&bytes).is_err());
    }

    #[test]
    fn truncated_body_is_a_decode_failure() {
        let bytes = sample_open(1).encode();
        assert!(Block::decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn roots_match_spec() {
        let send = Block::Send(SendBlock {
            previous: Hash256::from_u64(1),
            destination: Hash256::from_u64(2),
            balance: 3,
            signature: Signature::default(),
            work: 4,
        });
        assert_eq!(send.root(), Hash256::from_u64(1));

        let open = sample_open(9);
        assert_eq!(open.root(), Hash256::from_u64(9));
    }

    #[test]
    fn distinct_opens_hash_differently() {
        let a = sample_open(1);
        let b = sample_open(3);
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a, b);
    }
}
