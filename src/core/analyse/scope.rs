//! Track which bare identifiers are local to a method body
use crate::core::expr::*;
use std::collections::HashSet;

/// Names bound locally at some point in a method body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    locals: HashSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locals.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// A new scope with the additional names bound
    pub fn extend<I, S>(&self, names: I) -> Scope
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locals = self.locals.clone();
        locals.extend(names.into_iter().map(|n| n.as_ref().to_string()));
        Scope { locals }
    }

    /// The scope inside a block: the enclosing names plus the block's
    /// parameters and anything assigned in its body. Block-local names
    /// are not visible once the block is left.
    pub fn enter_block(&self, params: &[Param], body: Option<&RcExpr>) -> Scope {
        let mut inner = self.clone();
        inner.bind_params(params);
        if let Some(body) = body {
            inner.bind_assignments(body);
        }
        inner
    }

    fn bind_params(&mut self, params: &[Param]) {
        self.locals
            .extend(params.iter().filter_map(|p| p.name.clone()));
    }

    /// Add assignment targets found in `expr`, without descending into
    /// nested blocks or definitions.
    fn bind_assignments(&mut self, expr: &RcExpr) {
        match &*expr.inner {
            Expr::LocalAsgn(_, name, _)
            | Expr::OpAsgn(_, AssignTarget::Local(name), _, _)
            | Expr::Bind(_, AssignTarget::Local(name)) => {
                self.locals.insert(name.clone());
            }
            Expr::Block(_, call, _, _) => {
                self.bind_assignments(call);
                return;
            }
            Expr::Def(_, _, _, _) | Expr::TypeDef(_, _, _, _, _) | Expr::AsyncFn(_, _, _) => {
                return
            }
            _ => {}
        }

        expr.visit(&mut |e| self.bind_assignments(e));
    }
}

/// Compute the local names of a method definition: its parameters of
/// every kind plus every local assignment target in its body.
///
/// Non-definitions have no locals.
pub fn compute_locals(def: &RcExpr) -> Scope {
    let mut scope = Scope::new();
    if let Expr::Def(_, _, params, body) = &*def.inner {
        scope.bind_params(params);
        if let Some(body) = body {
            scope.bind_assignments(body);
        }
    }
    scope
}
