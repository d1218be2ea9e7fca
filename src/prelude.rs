use mlua::Lua;

use crate::panel::TARGET_GENES;

/// Helpers available to every expression and template.
pub const PRELUDE: &str = r#"
function is_pass(v)
    return v.FILTER == "PASS"
end

-- true when the variant is annotated with one of the PANEL genes
function in_panel(v)
    local g = v.gene
    return g ~= nil and PANEL[g] == true
end

-- uses ipairs so only the array part of the table is visited
function any(f, t)
    for _, x in ipairs(t) do
        if f(x) then
            return true
        end
    end
    return false
end

function all(f, t)
    for _, x in ipairs(t) do
        if not f(x) then
            return false
        end
    end
    return true
end
"#;

pub(crate) fn load_prelude(lua: &Lua) -> mlua::Result<()> {
    let panel = lua.create_table()?;
    for gene in TARGET_GENES {
        panel.set(gene, true)?;
    }
    lua.globals().set("PANEL", panel)?;
    lua.load(PRELUDE).set_name("prelude").exec()
}
