mod block;
mod codec;
pub mod error;
mod genesis;
mod store;
mod tables;

pub use block::{Block, BlockType, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
pub use codec::{Account, Amount, ChecksumKey, Hash256, Signature, Work};
pub use error::StoreError;
pub use genesis::Genesis;
pub use store::{Batch, Store};
pub use tables::{Frontier, Receivable};
