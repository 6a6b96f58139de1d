mod ordering;
mod protocol;

pub use ordering::SortableBlock;
pub use protocol::GhostdagManager;
