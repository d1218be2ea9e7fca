use mlua::prelude::LuaValue;
use mlua::{AnyUserData, Lua, MetaMethod, UserDataFields, UserDataMethods, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::genotypes::Genotype;

/// INFO annotations of one record. Flags are stored with the value `"true"`.
pub type InfoMap = FxHashMap<String, String>;

/// Value stored for an INFO key that carries no `=value` part.
pub const FLAG_VALUE: &str = "true";

/// One data line of a VCF file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantRecord {
    pub chromosome: String,
    /// 1-based coordinate. None when the POS column is not an integer;
    /// such a record must not be used for coordinate lookups.
    pub position: Option<i64>,
    pub id: String,
    pub reference_allele: String,
    pub alternate_allele: String,
    /// FILTER column. None when the line is too short to carry one.
    pub filter_status: Option<String>,
    pub info: InfoMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    /// GT of each sample column, in header order. None where a sample has no parseable call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genotypes: Vec<Option<Genotype>>,
}

impl VariantRecord {
    pub fn info(&self, key: &str) -> Option<&str> {
        self.info.get(key).map(|v| v.as_str())
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.info(key) == Some(FLAG_VALUE)
    }

    /// Star allele carried in a `STAR=value` annotation. A bare `STAR` flag is not an allele.
    pub fn star_allele(&self) -> Option<&str> {
        self.info("STAR").filter(|s| *s != FLAG_VALUE)
    }

    pub fn is_pass(&self) -> bool {
        self.filter_status.as_deref() == Some("PASS")
    }

    /// ALT split on commas; `.` means no alternate.
    pub fn alternate_alleles(&self) -> Vec<&str> {
        self.alternate_allele
            .split(',')
            .filter(|a| !a.is_empty() && *a != ".")
            .collect()
    }
}

pub fn register_variant(lua: &Lua) -> mlua::Result<()> {
    lua.register_userdata_type::<VariantRecord>(|reg| {
        reg.add_meta_function(
            MetaMethod::Index,
            |_lua, (_, name): (AnyUserData, String)| {
                let msg = format!("field '{}' variant.{} not found", name, name);
                Err::<LuaValue<'_>, mlua::Error>(mlua::Error::RuntimeError(msg))
            },
        );
        reg.add_meta_method(MetaMethod::ToString, |_, this: &VariantRecord, ()| {
            let pos = this
                .position
                .map(|p| p.to_string())
                .unwrap_or_else(|| ".".to_string());
            Ok(format!(
                "{}:{}:{}:{}",
                this.chromosome, pos, this.reference_allele, this.alternate_allele
            ))
        });
        reg.add_field_method_get("chrom", |_, this: &VariantRecord| {
            Ok(this.chromosome.clone())
        });
        reg.add_field_method_get("pos", |_, this: &VariantRecord| Ok(this.position));
        reg.add_field_method_get("id", |_, this: &VariantRecord| Ok(this.id.clone()));
        reg.add_field_method_get("REF", |_, this: &VariantRecord| {
            Ok(this.reference_allele.clone())
        });
        reg.add_field_method_get("ALT", |lua: &Lua, this: &VariantRecord| {
            let alts = this.alternate_alleles();
            let t = lua.create_table_with_capacity(alts.len().max(1), 0)?;
            for (i, allele) in alts.iter().enumerate() {
                t.raw_set(i + 1, *allele)?;
            }
            if t.is_empty() {
                t.raw_set(1, ".")?;
            }
            Ok(Value::Table(t))
        });
        reg.add_field_method_get("FILTER", |_, this: &VariantRecord| {
            Ok(this.filter_status.clone())
        });
        reg.add_field_method_get("gene", |_, this: &VariantRecord| Ok(this.gene.clone()));
        reg.add_field_method_get("star", |_, this: &VariantRecord| {
            Ok(this.star_allele().map(|s| s.to_string()))
        });
        reg.add_field_method_get("genotypes", |lua: &Lua, this: &VariantRecord| {
            let t = lua.create_table_with_capacity(this.genotypes.len(), 0)?;
            for (i, gt) in this.genotypes.iter().enumerate() {
                let v = match gt {
                    Some(gt) => Value::UserData(lua.create_any_userdata(gt.clone())?),
                    None => Value::Nil,
                };
                t.raw_set(i + 1, v)?;
            }
            Ok(Value::Table(t))
        });
        reg.add_method("info", |_, this: &VariantRecord, key: String| {
            Ok(this.info(&key).map(|v| v.to_string()))
        });
        reg.add_method("has_info", |_, this: &VariantRecord, key: String| {
            Ok(this.info.contains_key(&key))
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VariantRecord {
        let mut info = InfoMap::default();
        info.insert("GENE".to_string(), "CYP2C19".to_string());
        info.insert("STAR".to_string(), "*17".to_string());
        info.insert("DB".to_string(), FLAG_VALUE.to_string());
        VariantRecord {
            chromosome: "10".to_string(),
            position: Some(94761900),
            id: "rs12248560".to_string(),
            reference_allele: "C".to_string(),
            alternate_allele: "T".to_string(),
            filter_status: Some("PASS".to_string()),
            info,
            gene: Some("CYP2C19".to_string()),
            genotypes: vec![Genotype::from_sample("0/1"), None],
        }
    }

    #[test]
    fn test_accessors() {
        let r = record();
        assert!(r.is_pass());
        assert!(r.has_flag("DB"));
        assert!(!r.has_flag("GENE"));
        assert_eq!(r.star_allele(), Some("*17"));
        assert_eq!(r.alternate_alleles(), vec!["T"]);

        let mut r = r;
        r.alternate_allele = ".".to_string();
        assert!(r.alternate_alleles().is_empty());
    }

    #[test]
    fn test_lua_variant_fields() {
        let lua = Lua::new();
        crate::register(&lua).unwrap();
        let r = record();
        let exp = lua
            .load(
                r#"
            return variant.chrom .. ":" .. variant.pos .. " " .. variant.gene .. variant.star
                .. " " .. variant:info("DB") .. " " .. tostring(variant:has_info("nope"))
                .. " " .. variant.ALT[1] .. " " .. tostring(variant.genotypes[1])
            "#,
            )
            .set_name("test_lua_variant_fields")
            .into_function()
            .expect("error in test_lua_variant_fields");

        lua.scope(|scope| {
            lua.globals()
                .set("variant", scope.create_any_userdata_ref(&r)?)?;
            let result: String = exp.call(())?;
            assert_eq!(result, "10:94761900 CYP2C19*17 true false T 0/1");
            Ok(())
        })
        .expect("error in test_lua_variant_fields");
    }

    #[test]
    fn test_lua_unknown_field_errors() {
        let lua = Lua::new();
        crate::register(&lua).unwrap();
        let r = record();
        let result = lua.scope(|scope| {
            lua.globals()
                .set("variant", scope.create_any_userdata_ref(&r)?)?;
            lua.load("return variant.qual").eval::<Value>().map(|_| ())
        });
        let err = result.expect_err("unknown field should fail");
        assert!(err.to_string().contains("variant.qual not found"));
    }

    #[test]
    fn test_lua_missing_position_is_nil() {
        let lua = Lua::new();
        crate::register(&lua).unwrap();
        let mut r = record();
        r.position = None;
        let is_nil = lua
            .scope(|scope| {
                lua.globals()
                    .set("variant", scope.create_any_userdata_ref(&r)?)?;
                lua.load("return variant.pos == nil").eval::<bool>()
            })
            .unwrap();
        assert!(is_nil);
    }
}
