//! The store itself: table open/close discipline, typed accessors, ordered
//! iterators, and the batch primitive.

use crate::block::Block;
use crate::codec::{Account, Amount, ChecksumKey, Hash256, Level, Unit};
use crate::error::StoreError;
use crate::tables::{Accounts, Blocks, Checksum, Frontier, Pending, Receivable, Representation};
use crate::tables::{Stack, Unchecked, Unsynced};
use libmdbx::orm::{Database, Decodable, Encodable, Table};
use libmdbx::{table_info, DatabaseOptions, Mode, PageSize, ReadWriteOptions, RW};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Default page size recommended by libmdbx for small-to-medium stores.
const DB_PAGE_SIZE: usize = 4096;
/// Generous upper bound on map size; libmdbx grows the backing file lazily,
/// so this is a ceiling rather than a pre-allocation.
const MAX_MAP_SIZE: isize = 1024_isize.pow(3) * 64; // 64 GB

fn open_options() -> DatabaseOptions {
    DatabaseOptions {
        page_size: Some(PageSize::Set(DB_PAGE_SIZE)),
        mode: Mode::ReadWrite(ReadWriteOptions {
            max_size: Some(MAX_MAP_SIZE),
            ..Default::default()
        }),
        ..Default::default()
    }
}

macro_rules! table_set {
    () => {
        [
            table_info!(Blocks),
            table_info!(Accounts),
            table_info!(Pending),
            table_info!(Representation),
            table_info!(Unchecked),
            table_info!(Unsynced),
            table_info!(Stack),
            table_info!(Checksum),
        ]
        .into_iter()
        .collect()
    };
}

/// The persistent block store.
///
/// Single-writer, multi-reader: every call is synchronous and returns once
/// the engine has accepted it. Opening a path already held by another live
/// `Store` fails construction rather than blocking.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish()
    }
}

impl Store {
    /// Opens (creating if absent) the store rooted at `path`. Fails if the
    /// directory cannot be created or used, or if another live handle
    /// already holds a lock on the tables there — both surface as the
    /// same non-ok construction status.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source: source.into(),
        })?;
        let tables = table_set!();
        let db = Database::create_with_options(Some(path.clone()), open_options(), &tables)
            .map_err(|source| StoreError::Open {
                path: path.display().to_string(),
                source: source.into(),
            })?;
        debug!(path = %path.display(), "opened block store");
        Ok(Store { db })
    }

    /// Opens an ephemeral, engine-backed store with no on-disk footprint.
    /// Used by tests and by short-lived bootstrap scratch work.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let tables = table_set!();
        let db = Database::create_with_options(None, open_options(), &tables).map_err(|source| {
            StoreError::Open {
                path: "<temporary>".to_string(),
                source: source.into(),
            }
        })?;
        Ok(Store { db })
    }

    /// Current wall-clock time in seconds since the epoch. The sole source
    /// of timestamps for newly written frontiers.
    pub fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is after the unix epoch")
            .as_secs()
    }

    fn get<T: Table>(&self, key: T::Key) -> Result<Option<T::Value>, StoreError> {
        let txn = self.db.begin_read()?;
        Ok(txn.get::<T>(key)?)
    }

    fn put<T: Table>(&self, key: T::Key, value: T::Value) -> Result<(), StoreError> {
        let txn = self.db.begin_readwrite()?;
        txn.upsert::<T>(key, value)?;
        txn.commit()?;
        Ok(())
    }

    fn del<T: Table>(&self, key: T::Key) -> Result<(), StoreError> {
        let txn = self.db.begin_readwrite()?;
        // Idempotent: deleting an absent key is a no-op.
        txn.delete::<T>(key, None)?;
        txn.commit()?;
        Ok(())
    }

    fn iter<T: Table>(&self, start: Option<T::Key>) -> Result<Vec<(T::Key, T::Value)>, StoreError>
    where
        T::Key: Clone,
    {
        let txn = self.db.begin_read()?;
        let mut cursor = txn.cursor::<T>()?;
        let mut out = Vec::new();
        for row in cursor.walk(start) {
            out.push(row?);
        }
        Ok(out)
    }

    // ---- blocks -------------------------------------------------------

    /// Encodes and stores `block` under `hash`, overwriting any prior value.
    pub fn block_put(&self, hash: Hash256, block: Block) -> Result<(), StoreError> {
        self.put::<Blocks>(hash, block.encode())
    }

    /// Decodes the block stored at `hash`, or `None` if absent or
    /// unreadable (the caller cannot distinguish the two, and must not).
    pub fn block_get(&self, hash: Hash256) -> Result<Option<Block>, StoreError> {
        decode_or_absent(self.get::<Blocks>(hash)?, hash)
    }

    pub fn block_exists(&self, hash: Hash256) -> Result<bool, StoreError> {
        Ok(self.block_get(hash)?.is_some())
    }

    pub fn block_del(&self, hash: Hash256) -> Result<(), StoreError> {
        self.del::<Blocks>(hash)
    }

    /// All stored blocks in ascending hash order. A record that fails to
    /// decode is logged and skipped rather than failing the whole walk.
    pub fn blocks_iter(&self) -> Result<Vec<(Hash256, Block)>, StoreError> {
        decode_rows(self.iter::<Blocks>(None)?)
    }

    /// Stored blocks from the smallest hash `>= hash` onward.
    pub fn blocks_iter_from(&self, hash: Hash256) -> Result<Vec<(Hash256, Block)>, StoreError> {
        decode_rows(self.iter::<Blocks>(Some(hash))?)
    }

    // ---- accounts / frontiers -------------------------------------------

    pub fn latest_put(&self, account: Account, frontier: Frontier) -> Result<(), StoreError> {
        self.put::<Accounts>(account, frontier)
    }

    pub fn latest_get(&self, account: Account) -> Result<Option<Frontier>, StoreError> {
        self.get::<Accounts>(account)
    }

    pub fn latest_exists(&self, account: Account) -> Result<bool, StoreError> {
        Ok(self.latest_get(account)?.is_some())
    }

    pub fn latest_del(&self, account: Account) -> Result<(), StoreError> {
        self.del::<Accounts>(account)
    }

    pub fn latest_iter(&self) -> Result<Vec<(Account, Frontier)>, StoreError> {
        self.iter::<Accounts>(None)
    }

    /// Frontiers from the smallest account id `>= account` onward (the
    /// lower-bound cursor position named in I6).
    pub fn latest_iter_from(&self, account: Account) -> Result<Vec<(Account, Frontier)>, StoreError> {
        self.iter::<Accounts>(Some(account))
    }

    // ---- pending ----------------------------------------------------------

    pub fn pending_put(&self, hash: Hash256, receivable: Receivable) -> Result<(), StoreError> {
        self.put::<Pending>(hash, receivable)
    }

    pub fn pending_get(&self, hash: Hash256) -> Result<Option<Receivable>, StoreError> {
        self.get::<Pending>(hash)
    }

    pub fn pending_exists(&self, hash: Hash256) -> Result<bool, StoreError> {
        Ok(self.pending_get(hash)?.is_some())
    }

    pub fn pending_del(&self, hash: Hash256) -> Result<(), StoreError> {
        self.del::<Pending>(hash)
    }

    pub fn pending_iter(&self) -> Result<Vec<(Hash256, Receivable)>, StoreError> {
        self.iter::<Pending>(None)
    }

    // ---- representation ----------------------------------------------------

    /// The cached vote weight for `account`, or zero if never written.
    /// Unlike every other getter, absence and zero are deliberately
    /// conflated here: a weight of zero carries no ledger meaning, so this
    /// table is a cache.
    pub fn representation_get(&self, account: Account) -> Result<u128, StoreError> {
        Ok(self.get::<Representation>(account)?.map_or(0, |a| a.0))
    }

    pub fn representation_put(&self, account: Account, weight: u128) -> Result<(), StoreError> {
        self.put::<Representation>(account, Amount(weight))
    }

    // ---- unchecked ----------------------------------------------------------

    /// Parks `block` under the predecessor hash it is waiting on (not its
    /// own hash).
    pub fn unchecked_put(&self, awaited: Hash256, block: Block) -> Result<(), StoreError> {
        self.put::<Unchecked>(awaited, block.encode())
    }

    pub fn unchecked_get(&self, awaited: Hash256) -> Result<Option<Block>, StoreError> {
        decode_or_absent(self.get::<Unchecked>(awaited)?, awaited)
    }

    pub fn unchecked_del(&self, awaited: Hash256) -> Result<(), StoreError> {
        self.del::<Unchecked>(awaited)
    }

    pub fn unchecked_iter(&self) -> Result<Vec<(Hash256, Block)>, StoreError> {
        decode_rows(self.iter::<Unchecked>(None)?)
    }

    // ---- unsynced ----------------------------------------------------------

    pub fn unsynced_put(&self, hash: Hash256) -> Result<(), StoreError> {
        self.put::<Unsynced>(hash, Unit)
    }

    pub fn unsynced_exists(&self, hash: Hash256) -> Result<bool, StoreError> {
        Ok(self.get::<Unsynced>(hash)?.is_some())
    }

    pub fn unsynced_del(&self, hash: Hash256) -> Result<(), StoreError> {
        self.del::<Unsynced>(hash)
    }

    /// The set of unfetched hashes in ascending order.
    pub fn unsynced_iter(&self) -> Result<Vec<Hash256>, StoreError> {
        Ok(self.iter::<Unsynced>(None)?.into_iter().map(|(k, _)| k).collect())
    }

    // ---- stack ----------------------------------------------------------

    /// Overwrites whatever hash was previously parked at `level`.
    pub fn stack_push(&self, level: u64, hash: Hash256) -> Result<(), StoreError> {
        self.put::<Stack>(Level(level), hash)
    }

    /// Returns and removes the hash parked at `level`, if any.
    pub fn stack_pop(&self, level: u64) -> Result<Option<Hash256>, StoreError> {
        let key = Level(level);
        let value = self.get::<Stack>(key)?;
        if value.is_some() {
            self.del::<Stack>(key)?;
        }
        Ok(value)
    }

    // ---- checksum ----------------------------------------------------------

    pub fn checksum_put(&self, prefix: u32, mask: u8, hash: Hash256) -> Result<(), StoreError> {
        self.put::<Checksum>(ChecksumKey { prefix, mask }, hash)
    }

    pub fn checksum_get(&self, prefix: u32, mask: u8) -> Result<Option<Hash256>, StoreError> {
        self.get::<Checksum>(ChecksumKey { prefix, mask })
    }

    pub fn checksum_del(&self, prefix: u32, mask: u8) -> Result<(), StoreError> {
        self.del::<Checksum>(ChecksumKey { prefix, mask })
    }

    // ---- batch ----------------------------------------------------------

    /// Runs `f` against a single read-write transaction, committing its
    /// queued mutations atomically only if `f` succeeds. Not required by
    /// any single-table test here, but exposed for the ledger layer, which
    /// needs e.g. `block_put` and `latest_put` to land together.
    pub fn batch<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Batch<'_>) -> Result<R, StoreError>,
    {
        let txn = self.db.begin_readwrite()?;
        let result = f(&Batch { txn: &txn })?;
        txn.commit()?;
        Ok(result)
    }
}

fn decode_or_absent(raw: Option<Vec<u8>>, key: Hash256) -> Result<Option<Block>, StoreError> {
    match raw {
        None => Ok(None),
        Some(bytes) => match Block::decode(&bytes) {
            Ok(block) => Ok(Some(block)),
            Err(err) => {
                warn!(hash = %key, error = %err, "block record failed to decode");
                Ok(None)
            }
        },
    }
}

fn decode_rows(rows: Vec<(Hash256, Vec<u8>)>) -> Result<Vec<(Hash256, Block)>, StoreError> {
    let mut out = Vec::with_capacity(rows.len());
    for (hash, bytes) in rows {
        match Block::decode(&bytes) {
            Ok(block) => out.push((hash, block)),
            Err(err) => warn!(%hash, error = %err, "block record failed to decode, skipping"),
        }
    }
    Ok(out)
}

/// A queued set of mutations across any of the seven tables, applied
/// atomically when the enclosing [`Store::batch`] call returns `Ok`.
pub struct Batch<'a> {
    txn: &'a libmdbx::orm::Transaction<'a, RW>,
}

impl Batch<'_> {
    pub fn put_block(&self, hash: Hash256, block: Block) -> Result<(), StoreError> {
        self.txn.upsert::<Blocks>(hash, block.encode())?;
        Ok(())
    }

    pub fn delete_block(&self, hash: Hash256) -> Result<(), StoreError> {
        self.txn.delete::<Blocks>(hash, None)?;
        Ok(())
    }

    pub fn put_frontier(&self, account: Account, frontier: Frontier) -> Result<(), StoreError> {
        self.txn.upsert::<Accounts>(account, frontier)?;
        Ok(())
    }

    pub fn put_pending(&self, hash: Hash256, receivable: Receivable) -> Result<(), StoreError> {
        self.txn.upsert::<Pending>(hash, receivable)?;
        Ok(())
    }

    pub fn delete_pending(&self, hash: Hash256) -> Result<(), StoreError> {
        self.txn.delete::<Pending>(hash, None)?;
        Ok(())
    }
}
