//! A mixin module and the assembly of its rewritten form
use crate::common::sourcemap::{HasSmid, Smid};
use crate::core::expr::*;

/// A module definition read from input
#[derive(Debug, Clone, PartialEq)]
pub struct MixinModule {
    pub smid: Smid,
    /// Fully qualified name (`Admin::Publishable`)
    pub name: String,
    /// Top-level statements
    pub body: Vec<RcExpr>,
}

impl MixinModule {
    /// View a module definition as a candidate mixin, qualifying its
    /// name with the enclosing namespace if any
    pub fn from_expr(expr: &RcExpr, namespace: Option<&str>) -> Option<Self> {
        match &*expr.inner {
            Expr::TypeDef(s, TypeKind::Module, name, _, body) => Some(MixinModule {
                smid: *s,
                name: match namespace {
                    Some(ns) => format!("{}::{}", ns, name),
                    None => name.clone(),
                },
                body: body.clone(),
            }),
            _ => None,
        }
    }

    /// Produce the output module from rewritten statements, led by
    /// the sentinels the code generator reads to choose field naming
    /// and accessor rendering.
    ///
    /// The output keeps the local (unqualified) name of the input.
    pub fn assemble(&self, local_name: &str, statements: Vec<RcExpr>) -> RcExpr {
        let mut body = vec![
            core::directive(self.smid, Directive::UnderscoredFields),
            core::directive(self.smid, Directive::AccessorGetters),
        ];
        body.extend(statements);
        core::module(self.smid, local_name, body)
    }
}

impl HasSmid for MixinModule {
    fn smid(&self) -> Smid {
        self.smid
    }
}
