use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("BIN start pattern not found in host file")]
    BinNotFound,

    #[error("No valid file table found in system region")]
    TableNotFound,

    #[error("Truncated image: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Not enough free blocks: {required} required, {free} free")]
    NotEnoughFreeBlocks { required: usize, free: usize },

    #[error("Too many files: {count} records do not fit into the file table (limit {limit})")]
    TooManyFiles { count: usize, limit: usize },

    #[error("Entry is already present: {0}")]
    AlreadyPresent(String),

    #[error("File name is too long: {name} (max {max} bytes)")]
    FileNameTooLong { name: String, max: usize },

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Entry {file_name} is too large: {size} bytes (max {max})")]
    EntryTooLarge {
        file_name: String,
        size: usize,
        max: usize,
    },

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Free block not found")]
    FreeBlockNotFound,

    #[error("Block chain of {file_name} is corrupt: {reason}")]
    ChainCorruption { file_name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FirmwareError {
    /// True for errors that reject an edit because the image is full.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            FirmwareError::NotEnoughFreeBlocks { .. }
                | FirmwareError::TooManyFiles { .. }
                | FirmwareError::FreeBlockNotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, FirmwareError>;
