//! The seven logical tables and the value records stored in them.
//!
//! Table names are the libmdbx sub-database names; the on-disk unit backing
//! all of them is a single environment file shared by every table, rather
//! than one file per table.

use crate::codec::{Account, Amount, ChecksumKey, Hash256, Level, Unit};
use libmdbx::orm::{table, Decodable, Encodable};

/// An account's head pointer and metadata. Rewritten on every accepted
/// block for that account; the initial write happens on `open_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frontier {
    pub hash: Hash256,
    pub representative: Account,
    pub balance: Amount,
    pub timestamp: u64,
}

impl Encodable for Frontier {
    type Encoded = Vec<u8>;

    fn encode(self) -> Self::Encoded {
        let mut out = Vec::with_capacity(32 + 32 + 16 + 8);
        out.extend_from_slice(&self.hash.0);
        out.extend_from_slice(&self.representative.0);
        out.extend_from_slice(&self.balance.0.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out
    }
}

impl Decodable for Frontier {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() != 32 + 32 + 16 + 8 {
            anyhow::bail!("frontier record has the wrong length: {}", bytes.len());
        }
        Ok(Frontier {
            hash: Hash256(bytes[0..32].try_into()?),
            representative: Hash256(bytes[32..64].try_into()?),
            balance: Amount(u128::from_be_bytes(bytes[64..80].try_into()?)),
            timestamp: u64::from_be_bytes(bytes[80..88].try_into()?),
        })
    }
}

/// An unclaimed incoming transfer, keyed by the hash of the send block that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Receivable {
    pub source: Account,
    pub amount: Amount,
    pub destination: Account,
}

impl Encodable for Receivable {
    type Encoded = Vec<u8>;

    fn encode(self) -> Self::Encoded {
        let mut out = Vec::with_capacity(32 + 16 + 32);
        out.extend_from_slice(&self.source.0);
        out.extend_from_slice(&self.amount.0.to_be_bytes());
        out.extend_from_slice(&self.destination.0);
        out
    }
}

impl Decodable for Receivable {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() != 32 + 16 + 32 {
            anyhow::bail!("receivable record has the wrong length: {}", bytes.len());
        }
        Ok(Receivable {
            source: Hash256(bytes[0..32].try_into()?),
            amount: Amount(u128::from_be_bytes(bytes[32..48].try_into()?)),
            destination: Hash256(bytes[48..80].try_into()?),
        })
    }
}

table!(
    /// Canonical content-addressed block storage, keyed by block hash.
    ///
    /// Stored as raw encoded bytes rather than `Block` directly: a record
    /// that fails to decode is data corruption, not an engine fault, and
    /// must surface as absent rather than as an error. The `Store` layer
    /// handles that decode step itself rather than leaning on the table's
    /// own codec.
    ( Blocks ) Hash256 => Vec<u8>
);

table!(
    /// Per-account head pointer and metadata, keyed by account id.
    ( Accounts ) Account => Frontier
);

table!(
    /// Unclaimed incoming transfers, keyed by the hash of the send block.
    ( Pending ) Hash256 => Receivable
);

table!(
    /// Cached representative vote weight. Absent is treated as zero.
    ( Representation ) Account => Amount
);

table!(
    /// Orphan blocks awaiting their predecessor, keyed by the predecessor
    /// hash they are waiting on (not by their own hash). Raw bytes, for the
    /// same reason as `Blocks`.
    ( Unchecked ) Hash256 => Vec<u8>
);

table!(
    /// Hashes known by reference but not yet fetched.
    ( Unsynced ) Hash256 => Unit
);

table!(
    /// LIFO scratch keyed by traversal depth: each level holds exactly one
    /// slot, and `push` overwrites whatever was there.
    ( Stack ) Level => Hash256
);

table!(
    /// Hierarchical running checksum of account frontiers, keyed by a
    /// `(prefix, mask)` pair.
    ( Checksum ) ChecksumKey => Hash256
);
