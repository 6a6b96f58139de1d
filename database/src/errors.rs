use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key not found")]
    KeyNotFound,

    #[error("rocksdb error: {0}")]
    Backend(#[from] rocksdb::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
