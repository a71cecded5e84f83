//! The mixin transform: extract declarations, rewrite every method
//! and assemble the output module.
use crate::core::config::RewriteConfig;
use crate::core::expr::*;
use crate::core::metadata::{self, Extraction, SideTable};
use crate::core::publish::{MetadataSink, ModuleMetadata};
use crate::core::unit::MixinModule;
use rewrite::Rewriter;
use tracing::{debug, warn};

pub mod rewrite;
pub mod sequence;

/// Transform every mixin module found in `expr`, publishing the
/// metadata of each to `sink`.
///
/// Modules are found at the top level, in statement sequences and
/// nested inside modules that are not themselves mixins. Everything
/// else passes through unchanged.
pub fn transform(expr: &RcExpr, config: &RewriteConfig, sink: &mut dyn MetadataSink) -> RcExpr {
    transform_in(expr, None, config, sink)
}

fn transform_in(
    expr: &RcExpr,
    namespace: Option<&str>,
    config: &RewriteConfig,
    sink: &mut dyn MetadataSink,
) -> RcExpr {
    match &*expr.inner {
        Expr::Seq(s, xs) => RcExpr::from(Expr::Seq(
            *s,
            xs.iter()
                .map(|x| transform_in(x, namespace, config, sink))
                .collect(),
        )),
        Expr::TypeDef(s, kind @ TypeKind::Module, name, sup, body) => {
            if let Some(module) = MixinModule::from_expr(expr, namespace) {
                if let Some((output, meta)) = mixin(&module, name, config) {
                    sink.publish(meta);
                    return output;
                }

                RcExpr::from(Expr::TypeDef(
                    *s,
                    *kind,
                    name.clone(),
                    sup.clone(),
                    body.iter()
                        .map(|x| transform_in(x, Some(module.name.as_str()), config, sink))
                        .collect(),
                ))
            } else {
                expr.clone()
            }
        }
        _ => expr.clone(),
    }
}

/// Extract every mixin module found in `expr` without rewriting,
/// keyed by qualified module name
pub fn extractions(expr: &RcExpr, config: &RewriteConfig) -> Vec<(String, Extraction)> {
    let mut found = vec![];
    extract_in(expr, None, config, &mut found);
    found
}

fn extract_in(
    expr: &RcExpr,
    namespace: Option<&str>,
    config: &RewriteConfig,
    found: &mut Vec<(String, Extraction)>,
) {
    match &*expr.inner {
        Expr::Seq(_, xs) => xs
            .iter()
            .for_each(|x| extract_in(x, namespace, config, found)),
        Expr::TypeDef(_, TypeKind::Module, _, _, _) => {
            if let Some(module) = MixinModule::from_expr(expr, namespace) {
                match metadata::extract(&module.body, config) {
                    Some(extraction) => found.push((module.name, extraction)),
                    None => module
                        .body
                        .iter()
                        .for_each(|x| extract_in(x, Some(module.name.as_str()), config, found)),
                }
            }
        }
        _ => {}
    }
}

/// Transform a single module. Returns `None` if it is not a mixin.
pub fn mixin(
    module: &MixinModule,
    local_name: &str,
    config: &RewriteConfig,
) -> Option<(RcExpr, ModuleMetadata)> {
    let extraction = metadata::extract(&module.body, config)?;
    let meta = ModuleMetadata::new(&module.name, &extraction);

    let statements = rewrite_statements(&extraction.statements, &extraction.table, config);
    let rewritten = rewritten_methods(&statements);

    debug!(
        module = %module.name,
        methods = rewritten,
        associations = extraction.table.associations.len(),
        enum_values = extraction.table.enum_updaters.len(),
        scopes = extraction.table.scopes.len(),
        "rewrote mixin"
    );

    if rewritten == 0 {
        warn!(module = %module.name, "mixin marker present but no methods rewritten");
    }

    Some((module.assemble(local_name, statements), meta))
}

/// Methods the rewriter had a body to work on
fn rewritten_methods(statements: &[RcExpr]) -> usize {
    statements.iter().filter(|s| s.inner.is_def_with_body()).count()
}

/// Rewrite each method definition; other statements pass through
pub fn rewrite_statements(
    statements: &[RcExpr],
    table: &SideTable,
    config: &RewriteConfig,
) -> Vec<RcExpr> {
    let rewriter = Rewriter::new(config, table);
    statements.iter().map(|s| rewriter.rewrite_def(s)).collect()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::publish::MetadataRegistry;
    use crate::core::expr::acore::*;

    fn marker() -> RcExpr {
        call("extend", vec![const_path(&["ActiveSupport", "Concern"])])
    }

    fn run(expr: &RcExpr) -> (RcExpr, MetadataRegistry) {
        let mut registry = MetadataRegistry::new();
        let out = transform(expr, &RewriteConfig::default(), &mut registry);
        (out, registry)
    }

    #[test]
    pub fn test_non_mixin_passes_through() {
        let m = module("Helpers", vec![def("f", vec![], Some(call("g", vec![])))]);
        let (out, registry) = run(&m);
        assert_eq!(out, m);
        assert!(registry.is_empty());
    }

    #[test]
    pub fn test_mixin_is_assembled() {
        let m = module(
            "Publishable",
            vec![
                marker(),
                block(
                    call("included", vec![]),
                    vec![],
                    Some(call(
                        "enum",
                        vec![sym("status"), array(vec![sym("draft"), sym("published")])],
                    )),
                ),
                def("publish", vec![], Some(call("published!", vec![]))),
            ],
        );
        let (out, registry) = run(&m);

        assert_eq!(
            out,
            module(
                "Publishable",
                vec![
                    directive(Directive::UnderscoredFields),
                    directive(Directive::AccessorGetters),
                    def(
                        "publish",
                        vec![],
                        Some(host_send(
                            "update",
                            vec![hash(vec![(sym("status"), str("published"))])],
                            CallShape::Parens
                        ))
                    ),
                ]
            )
        );
        assert!(registry.get("Publishable").is_some());
    }

    #[test]
    pub fn test_nested_mixins_are_qualified() {
        let inner = module("Trackable", vec![marker(), def("track", vec![], None)]);
        let outer = module("Admin", vec![inner]);
        let (_, registry) = run(&seq(vec![outer]));
        assert_eq!(
            registry.get("Admin::Trackable").map(|m| m.methods.clone()),
            Some(vec!["track".to_string()])
        );
    }

    #[test]
    pub fn test_bodiless_defs_are_not_counted_as_rewritten() {
        assert_eq!(
            rewritten_methods(&[def("track", vec![], None), call("private", vec![])]),
            0
        );
        assert_eq!(
            rewritten_methods(&[
                def("track", vec![], None),
                def("log", vec![], Some(call("puts", vec![])))
            ]),
            1
        );
    }

    #[test]
    pub fn test_extractions_match_transform() {
        let inner = module("Trackable", vec![marker(), def("track", vec![], None)]);
        let plain = module("Plain", vec![def("f", vec![], None)]);
        let outer = module("Admin", vec![inner, plain]);
        let found = extractions(&outer, &RewriteConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "Admin::Trackable");
        assert_eq!(found[0].1.method_names(), vec!["track".to_string()]);
    }

    #[test]
    pub fn test_second_run_is_identity() {
        let m = module(
            "Auditable",
            vec![
                marker(),
                def(
                    "audit",
                    vec![],
                    Some(block(
                        call("transaction", vec![]),
                        vec![],
                        Some(call("log_change", vec![call("changes", vec![])])),
                    )),
                ),
            ],
        );
        let (once, _) = run(&m);
        let (twice, registry) = run(&once);
        assert_eq!(once, twice);
        assert!(registry.is_empty());
    }
}
