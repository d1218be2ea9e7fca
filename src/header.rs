use mlua::Lua;

use crate::document::ParsedDocument;

/// Number of fixed columns before the first sample: CHROM..INFO plus FORMAT.
pub const FIXED_COLUMNS: usize = 9;

/// Sample names are the header columns after FORMAT.
pub fn sample_names(header: &[String]) -> &[String] {
    if header.len() > FIXED_COLUMNS {
        &header[FIXED_COLUMNS..]
    } else {
        &[]
    }
}

/// Value of the first `##key=value` metadata line for `key`.
pub fn metadata_value<'a>(metadata: &'a [String], key: &str) -> Option<&'a str> {
    metadata.iter().find_map(|line| {
        let (k, v) = line.strip_prefix("##")?.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Publish the document header to Lua as the `header` global.
pub(crate) fn register_header(lua: &Lua, doc: &ParsedDocument) -> mlua::Result<()> {
    let t = lua.create_table()?;
    t.set("columns", doc.header.clone())?;
    t.set("samples", sample_names(&doc.header).to_vec())?;
    t.set("metadata", doc.metadata.clone())?;
    t.set("fileformat", metadata_value(&doc.metadata, "fileformat"))?;
    lua.globals().set("header", t)
}
