//! Retarget implicit calls in mixin method bodies at the host
//! instance.
//!
//! Rules are tried in order at each node and the first that applies
//! wins. Anything unmatched is rebuilt with its children rewritten.
use crate::core::analyse::scope::{compute_locals, Scope};
use crate::core::config::RewriteConfig;
use crate::core::expr::*;
use crate::core::metadata::SideTable;
use crate::core::names;
use crate::core::transform::sequence;
use tracing::trace;

/// Predicates on an implicit call's value that become null checks
const PRESENCE_CHECKS: &[&str] = &["present?", "blank?", "nil?"];

/// Rewrites method bodies of a single mixin module
pub struct Rewriter<'a> {
    config: &'a RewriteConfig,
    table: &'a SideTable,
}

impl<'a> Rewriter<'a> {
    pub fn new(config: &'a RewriteConfig, table: &'a SideTable) -> Self {
        Rewriter { config, table }
    }

    /// Rewrite a method definition in the scope of its own locals.
    /// Anything other than a definition with a body is returned
    /// unchanged.
    pub fn rewrite_def(&self, def: &RcExpr) -> RcExpr {
        match &*def.inner {
            Expr::Def(s, name, params, Some(body)) => {
                let scope = compute_locals(def);
                RcExpr::from(Expr::Def(
                    *s,
                    name.clone(),
                    self.params(params, &scope, name),
                    Some(self.rewrite(body, &scope, name)),
                ))
            }
            _ => def.clone(),
        }
    }

    /// Rewrite `expr` occurring in the body of `method`
    pub fn rewrite(&self, expr: &RcExpr, scope: &Scope, method: &str) -> RcExpr {
        self.super_call(expr, method)
            .or_else(|| self.presence_check(expr, scope, method))
            .or_else(|| self.enum_call(expr, method))
            .or_else(|| self.host_call(expr, scope, method))
            .or_else(|| self.safe_mutation(expr, scope, method))
            .or_else(|| self.transaction(expr, scope, method))
            .unwrap_or_else(|| self.descend(expr, scope, method))
    }

    /// Rewrite parameter defaults
    pub(crate) fn params(&self, params: &[Param], scope: &Scope, method: &str) -> Params {
        params
            .iter()
            .map(|p| Param {
                kind: p.kind,
                name: p.name.clone(),
                default: p.default.as_ref().map(|d| self.rewrite(d, scope, method)),
            })
            .collect()
    }

    /// True if an implicit call of `name` should be sent to the host
    fn is_host_call(&self, name: &str, scope: &Scope) -> bool {
        !scope.contains(name) && !self.config.is_exempt(name)
    }

    /// `super` reads the raw stored value of the attribute the method
    /// overrides
    fn super_call(&self, expr: &RcExpr, method: &str) -> Option<RcExpr> {
        match &*expr.inner {
            Expr::Super(s, _) => {
                let key = names::strip_marker(method);
                trace!(method, key, "super replaced by raw attribute read");
                Some(core::index(
                    *s,
                    core::host_send(*s, &self.config.raw_attributes, vec![], CallShape::Bare),
                    vec![core::str(*s, key)],
                ))
            }
            _ => None,
        }
    }

    /// `x.present?`, `x.blank?` and `x.nil?` where `x` is an implicit
    /// host call
    fn presence_check(&self, expr: &RcExpr, scope: &Scope, method: &str) -> Option<RcExpr> {
        let (s, receiver, check) = match &*expr.inner {
            Expr::Send(s, Some(receiver), name, args, _)
                if args.is_empty() && PRESENCE_CHECKS.contains(&name.as_str()) =>
            {
                (*s, receiver, name.as_str())
            }
            _ => return None,
        };

        let (target, target_args) = receiver.inner.implicit_call()?;
        if !self.is_host_call(target, scope) {
            return None;
        }

        let present = check == "present?";

        if target_args.is_empty() && self.table.is_lazy_single(target) {
            trace!(method, association = target, check, "loaded-flag presence check");
            let loaded = core::field(s, format!("{}_loaded", target));
            let cached = core::field(s, target);
            Some(if present {
                core::and(s, loaded, core::not_nil(s, cached))
            } else {
                core::or(s, core::not(s, loaded), core::is_nil(s, cached))
            })
        } else {
            trace!(method, target, check, "presence check as null comparison");
            let value = self.rewrite(receiver, scope, method);
            Some(if present {
                core::not_nil(s, value)
            } else {
                core::is_nil(s, value)
            })
        }
    }

    /// Synthetic `value!` updaters and `value?` predicates of declared
    /// enums
    fn enum_call(&self, expr: &RcExpr, method: &str) -> Option<RcExpr> {
        let (s, name) = match &*expr.inner {
            Expr::Send(s, None, name, args, _) if args.is_empty() => (*s, name.as_str()),
            _ => return None,
        };

        if let Some(entry) = self.table.enum_updater(name) {
            trace!(method, name, field = %entry.field, "inlined enum updater");
            let pair = (core::sym(s, &entry.field), core::str(s, &entry.value));
            return Some(core::host_send(
                s,
                "update",
                vec![core::hash(s, vec![pair])],
                CallShape::Parens,
            ));
        }

        let entry = self.table.enum_predicate(name)?;
        trace!(method, name, field = %entry.field, "inlined enum predicate");
        Some(core::send_shaped(
            s,
            Some(core::host_send(s, &entry.field, vec![], CallShape::Bare)),
            "==",
            vec![core::str(s, &entry.value)],
            CallShape::Parens,
        ))
    }

    /// Implicit calls that are neither locals nor exempt are sent to
    /// the host. Mutators always render as calls.
    fn host_call(&self, expr: &RcExpr, scope: &Scope, method: &str) -> Option<RcExpr> {
        match &*expr.inner {
            Expr::Send(s, None, name, args, shape) if self.is_host_call(name, scope) => {
                let shape = if names::is_mutator(name) {
                    CallShape::Parens
                } else {
                    *shape
                };
                let args = args
                    .iter()
                    .map(|a| self.rewrite(a, scope, method))
                    .collect();
                Some(core::host_send(*s, name, args, shape))
            }
            _ => None,
        }
    }

    /// `x&.destroy` and other known mutations always render as calls
    fn safe_mutation(&self, expr: &RcExpr, scope: &Scope, method: &str) -> Option<RcExpr> {
        match &*expr.inner {
            Expr::SafeSend(_, _, name, _, shape) if self.config.is_mutating(name) => {
                if *shape == CallShape::Bare {
                    trace!(method, name = %name, "safe navigation mutation forced to call");
                }
                Some(self.descend(expr, scope, method).reshaped(CallShape::Parens))
            }
            _ => None,
        }
    }

    /// Blocks headed by the transaction call are linearised
    fn transaction(&self, expr: &RcExpr, scope: &Scope, method: &str) -> Option<RcExpr> {
        match &*expr.inner {
            Expr::Block(_, call, _, _) => match &*call.inner {
                Expr::Send(_, _, name, _, _) if *name == self.config.transaction => {
                    trace!(method, "linearising transaction block");
                    Some(sequence::linearize(self, expr, scope, method))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Generic recursion. Blocks and async functions see their own
    /// parameters and assignments in a copy of the scope.
    fn descend(&self, expr: &RcExpr, scope: &Scope, method: &str) -> RcExpr {
        match &*expr.inner {
            Expr::Block(s, call, params, body) => {
                let inner = scope.enter_block(params, body.as_ref());
                RcExpr::from(Expr::Block(
                    *s,
                    self.rewrite(call, scope, method),
                    self.params(params, &inner, method),
                    body.as_ref().map(|b| self.rewrite(b, &inner, method)),
                ))
            }
            Expr::AsyncFn(s, params, body) => {
                let inner = scope.enter_block(params, Some(body));
                RcExpr::from(Expr::AsyncFn(
                    *s,
                    self.params(params, &inner, method),
                    self.rewrite(body, &inner, method),
                ))
            }
            _ => expr.walk(&|e| self.rewrite(&e, scope, method)),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::expr::acore::*;
    use crate::core::metadata::{AssociationKind, EnumValue};

    fn table() -> SideTable {
        let mut table = SideTable::default();
        table
            .associations
            .insert("profile".to_string(), AssociationKind::LazySingle);
        table.lazy_singles.insert("profile".to_string());
        table
            .associations
            .insert("cover".to_string(), AssociationKind::Singular);
        let published = EnumValue {
            field: "status".to_string(),
            value: "published".to_string(),
        };
        table
            .enum_updaters
            .insert("published!".to_string(), published.clone());
        table
            .enum_predicates
            .insert("published?".to_string(), published);
        table
    }

    fn rewrite_body(method: &str, params: Params, body: RcExpr) -> RcExpr {
        let config = RewriteConfig::default();
        let table = table();
        let rewriter = Rewriter::new(&config, &table);
        rewriter.rewrite_def(&def(method, params, Some(body)))
    }

    fn body_of(def: RcExpr) -> RcExpr {
        match &*def.inner {
            Expr::Def(_, _, _, Some(body)) => body.clone(),
            _ => panic!("expected definition with body"),
        }
    }

    fn rewrites_to(body: RcExpr, expected: RcExpr) {
        assert_eq!(body_of(rewrite_body("m", vec![], body)), expected);
    }

    #[test]
    pub fn test_super_uses_stripped_method_name() {
        assert_eq!(
            body_of(rewrite_body("status", vec![], super_(None))),
            index(
                host_send("attributes", vec![], CallShape::Bare),
                vec![str("status")]
            )
        );
        assert_eq!(
            body_of(rewrite_body("status!", vec![], super_(Some(vec![num(1)])))),
            index(
                host_send("attributes", vec![], CallShape::Bare),
                vec![str("status")]
            )
        );
    }

    #[test]
    pub fn test_lazy_presence_check() {
        rewrites_to(
            send(Some(call("profile", vec![])), "present?", vec![]),
            and(field("profile_loaded"), not_nil(field("profile"))),
        );
    }

    #[test]
    pub fn test_lazy_blank_check_is_dual() {
        let expected = or(not(field("profile_loaded")), is_nil(field("profile")));
        rewrites_to(
            send(Some(call("profile", vec![])), "blank?", vec![]),
            expected.clone(),
        );
        rewrites_to(send(Some(call("profile", vec![])), "nil?", vec![]), expected);
    }

    #[test]
    pub fn test_eager_presence_check() {
        rewrites_to(
            send(Some(call("cover", vec![])), "present?", vec![]),
            not_nil(host_send("cover", vec![], CallShape::Bare)),
        );
        rewrites_to(
            send(Some(call("cover", vec![])), "blank?", vec![]),
            is_nil(host_send("cover", vec![], CallShape::Bare)),
        );
    }

    #[test]
    pub fn test_presence_check_on_compound_receiver_is_generic() {
        rewrites_to(
            send(
                Some(send(Some(call("author", vec![])), "name", vec![])),
                "present?",
                vec![],
            ),
            send(
                Some(send(
                    Some(host_send("author", vec![], CallShape::Bare)),
                    "name",
                    vec![],
                )),
                "present?",
                vec![],
            ),
        );
    }

    #[test]
    pub fn test_presence_check_on_local_is_untouched() {
        let body = send(Some(call("profile", vec![])), "present?", vec![]);
        let rewritten = rewrite_body("m", vec![arg("profile")], body.clone());
        assert_eq!(body_of(rewritten), body);
    }

    #[test]
    pub fn test_enum_updater_and_predicate() {
        rewrites_to(
            call("published!", vec![]),
            host_send(
                "update",
                vec![hash(vec![(sym("status"), str("published"))])],
                CallShape::Parens,
            ),
        );
        rewrites_to(
            call("published?", vec![]),
            send_shaped(
                Some(host_send("status", vec![], CallShape::Bare)),
                "==",
                vec![str("published")],
                CallShape::Parens,
            ),
        );
    }

    #[test]
    pub fn test_host_qualification_and_locals() {
        let body = seq(vec![
            lasgn("total", call("price", vec![])),
            call("log_total", vec![lvar("total"), call("currency", vec![])]),
            call("puts", vec![lvar("total")]),
        ]);
        rewrites_to(
            body,
            seq(vec![
                lasgn("total", host_send("price", vec![], CallShape::Bare)),
                host_send(
                    "log_total",
                    vec![lvar("total"), host_send("currency", vec![], CallShape::Bare)],
                    CallShape::Parens,
                ),
                call("puts", vec![lvar("total")]),
            ]),
        );
    }

    #[test]
    pub fn test_mutator_forced_to_call() {
        rewrites_to(
            call("recalculate!", vec![]),
            host_send("recalculate!", vec![], CallShape::Parens),
        );
    }

    #[test]
    pub fn test_block_params_shadow_only_inside_block() {
        let body = seq(vec![
            block(
                send(Some(call("items", vec![])), "each", vec![]),
                vec![arg("x")],
                Some(call("track", vec![call("x", vec![])])),
            ),
            call("x", vec![]),
        ]);
        rewrites_to(
            body,
            seq(vec![
                block(
                    send(
                        Some(host_send("items", vec![], CallShape::Bare)),
                        "each",
                        vec![]
                    ),
                    vec![arg("x")],
                    Some(host_send(
                        "track",
                        vec![call("x", vec![])],
                        CallShape::Parens
                    )),
                ),
                host_send("x", vec![], CallShape::Bare),
            ]),
        );
    }

    #[test]
    pub fn test_block_param_shadowing_method_param() {
        let body = seq(vec![
            block(
                send(Some(lvar("x")), "each", vec![]),
                vec![arg("x")],
                Some(call("track", vec![call("x", vec![]), call("other", vec![])])),
            ),
            call("x", vec![]),
            call("other", vec![]),
        ]);
        assert_eq!(
            body_of(rewrite_body("m", vec![arg("x")], body)),
            seq(vec![
                block(
                    send(Some(lvar("x")), "each", vec![]),
                    vec![arg("x")],
                    Some(host_send(
                        "track",
                        vec![
                            call("x", vec![]),
                            host_send("other", vec![], CallShape::Bare)
                        ],
                        CallShape::Parens
                    )),
                ),
                call("x", vec![]),
                host_send("other", vec![], CallShape::Bare),
            ])
        );
    }

    #[test]
    pub fn test_safe_navigation_mutation_forced_to_call() {
        let rewritten = body_of(rewrite_body(
            "m",
            vec![],
            csend(lvar("draft"), "destroy", vec![]),
        ));
        match &*rewritten.inner {
            Expr::SafeSend(_, _, name, _, shape) => {
                assert_eq!(name, "destroy");
                assert_eq!(*shape, CallShape::Parens);
            }
            _ => panic!("expected safe navigation call"),
        }
    }

    #[test]
    pub fn test_safe_navigation_non_mutation_keeps_shape() {
        rewrites_to(
            csend(lvar("draft"), "title", vec![]),
            csend(lvar("draft"), "title", vec![]),
        );
    }

    #[test]
    pub fn test_param_defaults_are_rewritten() {
        let rewritten = rewrite_body(
            "m",
            vec![Param::new(ParamKind::Optional, "limit").with_default(call("page_size", vec![]))],
            lvar("limit"),
        );
        assert_eq!(
            rewritten,
            def(
                "m",
                vec![Param::new(ParamKind::Optional, "limit")
                    .with_default(host_send("page_size", vec![], CallShape::Bare))],
                Some(lvar("limit"))
            )
        );
    }

    #[test]
    pub fn test_definition_without_body_is_unchanged() {
        let d = def("noop", vec![], None);
        let config = RewriteConfig::default();
        let table = SideTable::default();
        assert_eq!(Rewriter::new(&config, &table).rewrite_def(&d), d);
    }

    #[test]
    pub fn test_rewriting_is_stable() {
        let original = def(
            "summary",
            vec![arg("id")],
            Some(seq(vec![
                super_(None),
                send(Some(call("profile", vec![])), "present?", vec![]),
                call("published!", vec![]),
                call("notify", vec![lvar("id")]),
                csend(call("draft", vec![]), "destroy", vec![]),
            ])),
        );
        let config = RewriteConfig::default();
        let table = table();
        let rewriter = Rewriter::new(&config, &table);
        let once = rewriter.rewrite_def(&original);
        let twice = rewriter.rewrite_def(&once);
        assert_eq!(once, twice);
    }
}
