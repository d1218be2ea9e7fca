use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the edges of the decoder: reading the file, running Lua, writing output.
/// Decoding itself never fails; malformed lines are skipped instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file exceeds the {limit} byte limit ({size} bytes read)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsupported file extension for {path}; expected .vcf or .vcf.gz")]
    UnsupportedExtension { path: PathBuf },

    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
