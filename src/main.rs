use clap::Parser;
use mimalloc::MiMalloc;
use mlua::Lua;
use std::path::PathBuf;

use vcfdecode::panel::{panel_variants, panel_variants_for_drug};
use vcfdecode::vcfexpr::{Output, VariantFilter};
use vcfdecode::{read_document, ParsedDocument, UploadPolicy};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(version, about = "Decode a VCF file and select variants with Lua expressions", long_about = None)]
struct Cli {
    /// Path to the .vcf or .vcf.gz file.
    path: PathBuf,

    /// Boolean Lua expression; a variant is kept when any expression is true.
    /// e.g. 'in_panel(variant) and is_pass(variant)'
    #[arg(short, long)]
    expression: Vec<String>,

    /// Luau string template rendered for each kept variant, e.g. '{variant.id}\t{variant.gene}'.
    #[arg(short, long)]
    template: Option<String>,

    /// File of Lua code run before the expressions are compiled.
    #[arg(short = 'p', long)]
    lua_prelude: Option<String>,

    /// Output path; defaults to stdout.
    #[arg(short, long)]
    output: Option<String>,

    /// Largest file accepted, in bytes.
    #[arg(long, default_value_t = 5 * 1024 * 1024)]
    max_size: u64,

    /// Report only variants on the pharmacogene panel.
    #[arg(long)]
    panel: bool,

    /// Report only panel variants on the gene that governs this drug, e.g. codeine.
    #[arg(long)]
    drug: Option<String>,

    /// Print the quality summary instead of the variants.
    #[arg(long)]
    summary: bool,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Cli::parse();

    let policy = UploadPolicy {
        max_bytes: args.max_size,
        ..Default::default()
    };
    let doc = read_document(&args.path, &policy);
    if let Some(e) = &doc.error {
        log::error!("could not decode {}", args.path.display());
        // the failed document, or its summary, is still reported before exiting non-zero.
        let json = if args.summary {
            to_json(&doc.summary(), args.pretty)?
        } else {
            doc.to_json(args.pretty)?
        };
        let mut output = Output::new(args.output.as_deref())?;
        output.write_line(&json)?;
        output.flush()?;
        return Err(e.clone().into());
    }

    let lua = Lua::new();
    let mut filter = VariantFilter::new(
        &lua,
        &doc,
        &args.expression,
        args.template.as_deref(),
        args.lua_prelude.as_deref(),
    )?;
    let selected = filter.select(&doc)?;
    log::info!(
        "variants evaluated: {}, passing: {}",
        filter.evaluated(),
        filter.passing()
    );

    let mut output = Output::new(args.output.as_deref())?;
    if filter.has_template() {
        for line in selected.iter().filter_map(|(_, line)| line.as_deref()) {
            output.write_line(line)?;
        }
        output.flush()?;
        return Ok(());
    }

    let kept = ParsedDocument {
        metadata: doc.metadata.clone(),
        header: doc.header.clone(),
        variants: selected.into_iter().map(|(v, _)| v.clone()).collect(),
        error: None,
    };
    let json = if args.summary {
        to_json(&kept.summary(), args.pretty)?
    } else if let Some(drug) = &args.drug {
        let Some(panel) = panel_variants_for_drug(&kept, drug) else {
            return Err(format!("drug '{}' has no gene on the panel", drug).into());
        };
        to_json(&panel, args.pretty)?
    } else if args.panel {
        to_json(&panel_variants(&kept), args.pretty)?
    } else {
        kept.to_json(args.pretty)?
    };
    output.write_line(&json)?;
    output.flush()?;
    Ok(())
}
