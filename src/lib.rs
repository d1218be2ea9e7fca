pub mod decoder;
pub mod document;
pub mod error;
pub mod genotypes;
pub mod header;
pub mod panel;
pub mod prelude;
pub mod reader;
pub mod variant;
pub mod vcfexpr;

pub use decoder::decode;
pub use document::{DocumentSummary, ParsedDocument};
pub use error::{DecodeError, Result};
pub use reader::{read_document, UploadPolicy};
pub use variant::VariantRecord;

/// Register the userdata types that expressions see.
pub fn register(lua: &mlua::Lua) -> mlua::Result<()> {
    variant::register_variant(lua)?;
    genotypes::register_genotypes(lua)?;
    Ok(())
}
