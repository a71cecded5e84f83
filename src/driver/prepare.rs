//! Run the inputs through the mixin transform
use crate::common::prettify::prettify;
use crate::core::config::RewriteConfig;
use crate::core::expr::RcExpr;
use crate::core::publish::{MetadataRegistry, ModuleMetadata};
use crate::core::transform;
use crate::driver::error::MixologyError;
use crate::driver::options::{DumpPhase, MixologyOptions};
use crate::driver::source::SourceLoader;
use crate::export::create_emitter;
use std::fs::File;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{debug, info};

/// Use the loader to process the inputs according to the options
pub fn prepare(opt: &MixologyOptions, loader: &mut SourceLoader) -> Result<(), MixologyError> {
    let config = opt.rewrite_config()?;

    if opt.explain() {
        print!("{}", opt.explanation(&config));
        return Ok(());
    }

    {
        let t = Instant::now();

        for f in &opt.files {
            loader.load(f)?;
        }

        debug!(inputs = opt.files.len(), elapsed = ?t.elapsed(), "read inputs");
    }

    let mut output: Box<dyn Write> = match &opt.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    match opt.dump_phase() {
        Some(DumpPhase::Input) => {
            let trees: Vec<RcExpr> = loader.trees().iter().map(|(_, t)| t.clone()).collect();
            write_trees(opt, loader, &trees, &mut output)
        }
        Some(DumpPhase::Extracted) => dump_extracted(loader, &config, &mut output),
        Some(DumpPhase::Rewritten) | None => {
            let mut registry = MetadataRegistry::new();
            let rewritten = rewrite(loader, &config, &mut registry);
            write_trees(opt, loader, &rewritten, &mut output)?;
            if let Some(path) = &opt.metadata {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, &registry.to_json()).map_err(io::Error::from)?;
                info!(modules = registry.len(), path = %path.display(), "wrote metadata");
            }
            Ok(())
        }
    }
}

/// Transform every loaded tree, publishing metadata to `registry`
pub fn rewrite(
    loader: &SourceLoader,
    config: &RewriteConfig,
    registry: &mut MetadataRegistry,
) -> Vec<RcExpr> {
    let t = Instant::now();

    let rewritten = loader
        .trees()
        .iter()
        .map(|(_, tree)| transform::transform(tree, config, registry))
        .collect();

    debug!(modules = registry.len(), elapsed = ?t.elapsed(), "rewrote inputs");
    rewritten
}

fn write_trees(
    opt: &MixologyOptions,
    loader: &SourceLoader,
    trees: &[RcExpr],
    output: &mut dyn Write,
) -> Result<(), MixologyError> {
    let mut emitter = create_emitter(&opt.format, output)
        .ok_or_else(|| MixologyError::UnknownFormat(opt.format.clone()))?;
    for tree in trees {
        emitter.emit(tree, loader.source_map())?;
    }
    Ok(())
}

/// Cleaned statements and side table of each mixin module
fn dump_extracted(
    loader: &SourceLoader,
    config: &RewriteConfig,
    output: &mut dyn Write,
) -> Result<(), MixologyError> {
    for (_, tree) in loader.trees() {
        for (name, extraction) in transform::extractions(tree, config) {
            writeln!(output, "--- {} ---\n", name)?;
            for statement in &extraction.statements {
                write!(output, "{}", prettify(statement))?;
            }
            let table = ModuleMetadata::new(&name, &extraction).to_json();
            serde_json::to_writer_pretty(&mut *output, &table).map_err(io::Error::from)?;
            writeln!(output, "\n")?;
        }
    }
    Ok(())
}
