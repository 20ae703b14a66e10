use lattice_store::{
    Account, Amount, Block, Frontier, Hash256, OpenBlock, Receivable, ReceiveBlock, Signature,
    Store,
};

fn hash(n: u64) -> Hash256 {
    Hash256::from_u64(n)
}

fn zero_signature() -> Signature {
    Signature::default()
}

fn open_block(source: u64, representative: u64, account: u64, work: u64) -> Block {
    Block::Open(OpenBlock {
        source: hash(source),
        representative: hash(representative),
        account: hash(account),
        signature: zero_signature(),
        work,
    })
}

// put then get round-trips; exists agrees with get.
#[test]
fn round_trip_empty_open_block() {
    let store = Store::open_temporary().expect("temporary store opens");
    let block = open_block(0, 0, 0, 0);
    let h = block.hash();

    store.block_put(h, block).expect("put succeeds");
    assert!(store.block_exists(h).expect("exists succeeds"));
    assert_eq!(store.block_get(h).expect("get succeeds"), Some(block));

    store.block_del(h).expect("del succeeds");
    assert_eq!(store.block_get(h).expect("get succeeds"), None);
    assert!(!store.block_exists(h).expect("exists succeeds"));
}

// Two distinct opens coexist and decode unequal.
#[test]
fn two_distinct_opens_coexist() {
    let store = Store::open_temporary().expect("temporary store opens");
    let a = open_block(1, 0, 0, 0);
    let b = Block::Open(OpenBlock {
        source: hash(3),
        representative: hash(0),
        account: hash(3),
        signature: zero_signature(),
        work: 3,
    });
    let (ha, hb) = (a.hash(), b.hash());

    store.block_put(ha, a).expect("put a");
    store.block_put(hb, b).expect("put b");

    assert_eq!(store.block_get(ha).expect("get a"), Some(a));
    assert_eq!(store.block_get(hb).expect("get b"), Some(b));
    assert_ne!(a, b);
}

// The pending iterator is empty on a fresh store, and after one put yields
// exactly that entry.
#[test]
fn pending_iterator_starts_empty_and_reflects_single_put() {
    let store = Store::open_temporary().expect("temporary store opens");
    assert!(store.pending_iter().expect("iter succeeds").is_empty());

    let receivable = Receivable {
        source: hash(2),
        amount: Amount(3),
        destination: hash(4),
    };
    store.pending_put(hash(1), receivable).expect("put succeeds");

    let rows = store.pending_iter().expect("iter succeeds");
    assert_eq!(rows, vec![(hash(1), receivable)]);
}

fn frontier_for(account: Account) -> Frontier {
    Frontier {
        hash: account,
        representative: account,
        balance: Amount(0),
        timestamp: Store::now(),
    }
}

// Lower-bound iteration over accounts.
#[test]
fn latest_lower_bound_positions_at_smallest_key_at_or_above() {
    let store = Store::open_temporary().expect("temporary store opens");
    store.latest_put(hash(1), frontier_for(hash(1))).expect("put 1");
    store.latest_put(hash(3), frontier_for(hash(3))).expect("put 3");

    let from_start = store.latest_iter().expect("iter succeeds");
    let from_one = store.latest_iter_from(hash(1)).expect("iter_from(1) succeeds");
    assert_eq!(from_start, from_one);
    assert_eq!(from_start.first().map(|(k, _)| *k), Some(hash(1)));

    let from_two = store.latest_iter_from(hash(2)).expect("iter_from(2) succeeds");
    assert_eq!(from_two.first().map(|(k, _)| *k), Some(hash(3)));

    let from_three = store.latest_iter_from(hash(3)).expect("iter_from(3) succeeds");
    assert_eq!(from_three.first().map(|(k, _)| *k), Some(hash(3)));
}

// Checksum absent vs present vs deleted.
#[test]
fn checksum_absent_then_present_then_deleted() {
    let store = Store::open_temporary().expect("temporary store opens");
    assert_eq!(store.checksum_get(0x100, 0x10).expect("get succeeds"), None);

    let h = hash(42);
    store.checksum_put(0x100, 0x10, h).expect("put succeeds");
    assert_eq!(store.checksum_get(0x100, 0x10).expect("get succeeds"), Some(h));

    store.checksum_del(0x100, 0x10).expect("del succeeds");
    assert_eq!(store.checksum_get(0x100, 0x10).expect("get succeeds"), None);
}

// Opening a second store on the same path fails while the first handle is
// still live.
#[test]
fn already_open_path_fails_second_construction() {
    let dir = tempdir::TempDir::new("lattice-store-already-open").expect("tempdir creates");
    let _first = Store::open(dir.path()).expect("first open succeeds");

    let second = Store::open(dir.path());
    assert!(second.is_err());
}

// representation_get of an un-put key is zero, never an error.
#[test]
fn representation_defaults_to_zero() {
    let store = Store::open_temporary().expect("temporary store opens");
    assert_eq!(store.representation_get(hash(7)).expect("get succeeds"), 0);

    store.representation_put(hash(7), 500).expect("put succeeds");
    assert_eq!(store.representation_get(hash(7)).expect("get succeeds"), 500);
}

// Stack push/pop across two distinct levels, LIFO per level.
#[test]
fn stack_push_pop_across_levels() {
    let store = Store::open_temporary().expect("temporary store opens");
    store.stack_push(5, hash(1)).expect("push L");
    store.stack_push(9, hash(2)).expect("push L'");

    assert_eq!(store.stack_pop(9).expect("pop L'"), Some(hash(2)));
    assert_eq!(store.stack_pop(5).expect("pop L"), Some(hash(1)));
    assert_eq!(store.stack_pop(5).expect("pop again"), None);
}

// now() is strictly greater than the ledger epoch anchor.
#[test]
fn now_exceeds_ledger_epoch_anchor() {
    assert!(Store::now() > 1_408_074_640);
}

// Deleting an absent key across tables is a no-op, not an error.
#[test]
fn deleting_an_absent_key_is_idempotent() {
    let store = Store::open_temporary().expect("temporary store opens");
    let h = hash(99);
    store.block_del(h).expect("del on absent block is ok");
    store.unchecked_del(h).expect("del on absent unchecked is ok");
    store.unsynced_del(h).expect("del on absent unsynced is ok");
    store.checksum_del(1, 2).expect("del on absent checksum is ok");
}

// unchecked mirrors blocks' interface, keyed by the awaited hash.
#[test]
fn unchecked_round_trips_under_awaited_hash() {
    let store = Store::open_temporary().expect("temporary store opens");
    let awaited = hash(123);
    let block = Block::Receive(ReceiveBlock {
        previous: hash(1),
        source: awaited,
        signature: zero_signature(),
        work: 0,
    });

    store.unchecked_put(awaited, block).expect("put succeeds");
    assert_eq!(store.unchecked_get(awaited).expect("get succeeds"), Some(block));

    store.unchecked_del(awaited).expect("del succeeds");
    assert_eq!(store.unchecked_get(awaited).expect("get succeeds"), None);
}

// unsynced is a hash-only set.
#[test]
fn unsynced_set_semantics() {
    let store = Store::open_temporary().expect("temporary store opens");
    let h = hash(55);
    assert!(!store.unsynced_exists(h).expect("exists succeeds"));

    store.unsynced_put(h).expect("put succeeds");
    assert!(store.unsynced_exists(h).expect("exists succeeds"));
    assert_eq!(store.unsynced_iter().expect("iter succeeds"), vec![h]);

    store.unsynced_del(h).expect("del succeeds");
    assert!(!store.unsynced_exists(h).expect("exists succeeds"));
}

// Batch applies multiple table writes atomically.
#[test]
fn batch_applies_block_and_frontier_together() {
    let store = Store::open_temporary().expect("temporary store opens");
    let block = open_block(0, 0, 7, 0);
    let h = block.hash();
    let frontier = frontier_for(hash(7));

    store
        .batch(|b| {
            b.put_block(h, block)?;
            b.put_frontier(hash(7), frontier)?;
            Ok(())
        })
        .expect("batch commits");

    assert_eq!(store.block_get(h).expect("get succeeds"), Some(block));
    assert_eq!(store.latest_get(hash(7)).expect("get succeeds"), Some(frontier));
}
