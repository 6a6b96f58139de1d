mod block_node;
mod block_set;
mod store;

pub use block_node::{BlockNode, GhostdagData};
pub use block_set::BlockSet;
pub use store::{
    GhostdagStore, GhostdagStoreReader, HeaderStore, HeaderStoreReader, InMemoryBlockStore,
    RelationsStore, RelationsStoreReader,
};
