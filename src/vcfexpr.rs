use mlua::Lua;
use std::io::Write;

use crate::document::ParsedDocument;
use crate::error::{DecodeError, Result};
use crate::variant::VariantRecord;

/// Evaluates Lua expressions, and an optional template, against decoded variants.
pub struct VariantFilter<'lua> {
    lua: &'lua Lua,
    template: Option<mlua::Function<'lua>>,
    expressions: Vec<mlua::Function<'lua>>,
    globals: mlua::Table<'lua>,
    variants_evaluated: usize,
    variants_passing: usize,
}

/// What `evaluate` decided for one variant.
#[derive(Debug, PartialEq)]
pub enum Selected {
    /// Selected, rendered through the template.
    Text(String),
    /// Selected, no template.
    Variant,
    None,
}

/// Where selected output goes.
pub enum Output {
    File(std::io::BufWriter<std::fs::File>),
    Stdout(std::io::BufWriter<std::io::Stdout>),
}

impl Output {
    pub fn new(path: Option<&str>) -> std::io::Result<Self> {
        match path {
            None | Some("-") => Ok(Output::Stdout(std::io::BufWriter::new(std::io::stdout()))),
            Some(p) => Ok(Output::File(std::io::BufWriter::new(
                std::fs::File::create(p)?,
            ))),
        }
    }

    pub fn write_line(&mut self, s: &str) -> std::io::Result<()> {
        match self {
            Output::File(f) => writeln!(f, "{}", s),
            Output::Stdout(f) => writeln!(f, "{}", s),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Output::File(f) => f.flush(),
            Output::Stdout(f) => f.flush(),
        }
    }
}

fn with_return(code: &str) -> String {
    if code.contains("return ") {
        code.to_string()
    } else {
        format!("return {}", code)
    }
}

fn compile<'lua>(lua: &'lua Lua, code: &str, name: &str) -> Result<mlua::Function<'lua>> {
    lua.load(code)
        .set_name(name)
        .into_function()
        .map_err(|e| DecodeError::InvalidExpression {
            expression: name.to_string(),
            message: e.to_string(),
        })
}

/// Turn a template into a function returning a Luau interpolated string.
/// Bare text is wrapped in backticks and `return` is added when missing.
fn process_template<'lua>(
    template: Option<&str>,
    lua: &'lua Lua,
) -> Result<Option<mlua::Function<'lua>>> {
    let Some(template) = template else {
        return Ok(None);
    };
    let return_pre = if template.contains("return ") {
        ""
    } else {
        "return "
    };
    let expr = if template.contains('`') {
        format!("{}{}", return_pre, template)
    } else {
        format!("{} `{}`", return_pre, template)
    };
    compile(lua, &expr, template).map(Some)
}

impl<'lua> VariantFilter<'lua> {
    /// Compile `expressions` and `template` against `doc`. The document header is
    /// published as the `header` global and `lua_prelude`, if given, is a path to
    /// Lua code run before anything else is compiled.
    pub fn new(
        lua: &'lua Lua,
        doc: &ParsedDocument,
        expressions: &[String],
        template: Option<&str>,
        lua_prelude: Option<&str>,
    ) -> Result<Self> {
        crate::prelude::load_prelude(lua)?;
        crate::register(lua)?;
        crate::header::register_header(lua, doc)?;

        if let Some(path) = lua_prelude {
            let code = std::fs::read_to_string(path)?;
            if let Err(e) = lua.load(&code).set_name(path).exec() {
                log::error!("Error loading Lua code from {}: {}", path, e);
                return Err(e.into());
            }
        }

        let expressions = expressions
            .iter()
            .map(|exp| compile(lua, &with_return(exp), exp))
            .collect::<Result<Vec<_>>>()?;
        let template = process_template(template, lua)?;

        Ok(VariantFilter {
            lua,
            template,
            expressions,
            globals: lua.globals(),
            variants_evaluated: 0,
            variants_passing: 0,
        })
    }

    /// Evaluate the expressions for one variant, stopping at the first one that is true.
    /// With no expressions every variant is selected.
    pub fn evaluate(&mut self, record: &VariantRecord) -> Result<Selected> {
        let lua = self.lua;
        self.variants_evaluated += 1;
        let result = lua.scope(|scope| {
            self.globals
                .raw_set("variant", scope.create_any_userdata_ref(record)?)?;
            let mut passed = self.expressions.is_empty();
            for exp in &self.expressions {
                if exp.call::<_, bool>(())? {
                    passed = true;
                    break;
                }
            }
            if !passed {
                return Ok(Selected::None);
            }
            match &self.template {
                Some(template) => match template.call::<_, String>(()) {
                    Ok(res) => Ok(Selected::Text(res)),
                    Err(e) => {
                        log::error!("Error in template: {}", e);
                        Err(e)
                    }
                },
                None => Ok(Selected::Variant),
            }
        })?;
        if result != Selected::None {
            self.variants_passing += 1;
        }
        Ok(result)
    }

    /// Variants of `doc` that pass, paired with their rendered template if any.
    pub fn select<'d>(
        &mut self,
        doc: &'d ParsedDocument,
    ) -> Result<Vec<(&'d VariantRecord, Option<String>)>> {
        let mut out = Vec::new();
        for v in &doc.variants {
            match self.evaluate(v)? {
                Selected::Text(s) => out.push((v, Some(s))),
                Selected::Variant => out.push((v, None)),
                Selected::None => {}
            }
        }
        Ok(out)
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    pub fn evaluated(&self) -> usize {
        self.variants_evaluated
    }

    pub fn passing(&self) -> usize {
        self.variants_passing
    }
}
