//! Fixed-width binary codecs.
//!
//! Every scalar the store persists is a big-endian unsigned integer of a
//! fixed width (64/128/256/512 bits); lexicographic byte order therefore
//! equals numeric order, which the table iterators rely on.

use libmdbx::orm::{Decodable, Encodable};

/// A 256-bit hash: a block hash or an account id (the account's public key
/// doubles as its identifier, as in the original ledger this store is
/// modeled on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Hash256(bytes)
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// An account id. Accounts and hashes share a representation (both are
/// 256-bit), but are kept as distinct types so a hash can't be passed where
/// an account is expected, and vice versa.
pub type Account = Hash256;

/// A 128-bit unsigned scalar: an account balance or a representative's
/// cached vote weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

/// A 512-bit opaque signature. The store never verifies it; it is stored
/// and returned as-is (signature verification is an external collaborator,
/// per the scope boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Default for Signature {
    fn default() -> Self {
        Signature([0u8; 64])
    }
}

/// A proof-of-work nonce. The store never validates it; generation and
/// validation both live outside this crate.
pub type Work = u64;

macro_rules! fixed_width_codec {
    ($ty:ty, $len:expr, $from_bytes:expr) => {
        impl Encodable for $ty {
            type Encoded = [u8; $len];

            fn encode(self) -> Self::Encoded {
                self.0
            }
        }

        impl Decodable for $ty {
            fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
                let array: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("expected {} bytes, got {}", $len, bytes.len()))?;
                Ok($from_bytes(array))
            }
        }
    };
}

fixed_width_codec!(Hash256, 32, Hash256);
fixed_width_codec!(Signature, 64, Signature);

impl Encodable for Amount {
    type Encoded = [u8; 16];

    fn encode(self) -> Self::Encoded {
        self.0.to_be_bytes()
    }
}

impl Decodable for Amount {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let array: [u8; 16] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected 16 bytes, got {}", bytes.len()))?;
        Ok(Amount(u128::from_be_bytes(array)))
    }
}

/// A big-endian `u64` key, used for the `stack` table's level index and as
/// a building block for the `checksum` table's composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(pub u64);

impl Encodable for Level {
    type Encoded = [u8; 8];

    fn encode(self) -> Self::Encoded {
        self.0.to_be_bytes()
    }
}

impl Decodable for Level {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let array: [u8; 8] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected 8 bytes, got {}", bytes.len()))?;
        Ok(Level(u64::from_be_bytes(array)))
    }
}

/// The `checksum` table's composite key: a 32-bit prefix and an 8-bit mask,
/// packed big-endian as `(prefix << 8) | mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChecksumKey {
    pub prefix: u32,
    pub mask: u8,
}

impl Encodable for ChecksumKey {
    type Encoded = [u8; 5];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 5];
        out[..4].copy_from_slice(&self.prefix.to_be_bytes());
        out[4] = self.mask;
        out
    }
}

impl Decodable for ChecksumKey {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() != 5 {
            anyhow::bail!("expected 5 bytes, got {}", bytes.len());
        }
        let mut prefix_bytes = [0u8; 4];
        prefix_bytes.copy_from_slice(&bytes[..4]);
        Ok(ChecksumKey {
            prefix: u32::from_be_bytes(prefix_bytes),
            mask: bytes[4],
        })
    }
}

/// An empty value, used for the `unsynced` set table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unit;

impl Encodable for Unit {
    type Encoded = [u8; 0];

    fn encode(self) -> Self::Encoded {
        []
    }
}

impl Decodable for Unit {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        if !bytes.is_empty() {
            anyhow::bail!("expected an empty value, got {} bytes", bytes.len());
        }
        Ok(Unit)
    }
}
