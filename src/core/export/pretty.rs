//! Export pretty printed pseudo-source version of core.
use crate::common::prettify::ToPretty;
use crate::core::expr::*;
use pretty::{DocAllocator, DocBuilder};

impl ToPretty for Primitive {
    fn pretty<'b, D, A>(&'b self, allocator: &'b D) -> DocBuilder<'b, D, A>
    where
        D: DocAllocator<'b, A>,
        D::Doc: Clone,
        A: Clone,
    {
        allocator.text(format!("{}", self))
    }
}

impl ToPretty for Param {
    fn pretty<'b, D, A>(&'b self, allocator: &'b D) -> DocBuilder<'b, D, A>
    where
        D: DocAllocator<'b, A>,
        D::Doc: Clone,
        A: Clone,
    {
        let name = self.name.as_deref().unwrap_or("");
        let head = match self.kind {
            ParamKind::Positional | ParamKind::Optional => allocator.text(name),
            ParamKind::Keyword | ParamKind::OptionalKeyword => {
                allocator.text(name).append(allocator.text(":"))
            }
            ParamKind::Rest => allocator.text("*").append(allocator.text(name)),
            ParamKind::KeywordRest => allocator.text("**").append(allocator.text(name)),
            ParamKind::BlockCapture => allocator.text("&").append(allocator.text(name)),
        };

        match (&self.default, self.kind) {
            (Some(d), ParamKind::OptionalKeyword) => head
                .append(allocator.space())
                .append(d.pretty(allocator)),
            (Some(d), _) => head
                .append(allocator.text(" = "))
                .append(d.pretty(allocator)),
            (None, _) => head,
        }
    }
}

fn comma_separated<'b, D, A, T>(allocator: &'b D, items: &'b [T]) -> DocBuilder<'b, D, A>
where
    D: DocAllocator<'b, A>,
    D::Doc: Clone,
    A: Clone,
    T: ToPretty,
{
    allocator
        .intersperse(
            items.iter().map(|x| x.pretty(allocator)),
            allocator.text(",").append(allocator.space()),
        )
        .group()
        .nest(2)
}

/// Statements one per line, indented under a header and closed by
/// `close`
fn body_doc<'b, D, A>(
    allocator: &'b D,
    statements: Vec<&'b RcExpr>,
    close: &'static str,
) -> DocBuilder<'b, D, A>
where
    D: DocAllocator<'b, A>,
    D::Doc: Clone,
    A: Clone,
{
    if statements.is_empty() {
        return allocator.hardline().append(allocator.text(close));
    }

    let lines = statements.into_iter().map(|s| s.pretty(allocator));
    allocator
        .hardline()
        .append(allocator.intersperse(lines, allocator.hardline()))
        .nest(2)
        .append(allocator.hardline())
        .append(allocator.text(close))
}

fn statements_of(body: Option<&RcExpr>) -> Vec<&RcExpr> {
    match body {
        Some(b) => match &*b.inner {
            Expr::Seq(_, xs) => xs.iter().collect(),
            _ => vec![b],
        },
        None => vec![],
    }
}

fn is_operator(name: &str) -> bool {
    !name.chars().any(|c| c.is_alphanumeric() || c == '_')
}

impl ToPretty for RcExpr {
    /// Arrange core expression into pretty doc
    fn pretty<'b, D, A>(&'b self, allocator: &'b D) -> DocBuilder<'b, D, A>
    where
        D: DocAllocator<'b, A>,
        D::Doc: Clone,
        A: Clone,
    {
        match &*self.inner {
            Expr::Literal(_, prim) => prim.pretty(allocator),
            Expr::Interp(_, xs) => {
                let parts = xs.iter().map(|x| match &*x.inner {
                    Expr::Literal(_, Primitive::Str(s)) => allocator.text(s.as_str()),
                    _ => allocator
                        .text("#{")
                        .append(x.pretty(allocator))
                        .append(allocator.text("}")),
                });
                allocator
                    .text("\"")
                    .append(allocator.concat(parts))
                    .append(allocator.text("\""))
            }
            Expr::Array(_, xs) => allocator
                .text("[")
                .append(comma_separated(allocator, xs))
                .append(allocator.text("]")),
            Expr::Hash(_, pairs) => {
                let pair_docs = pairs.iter().map(|(k, v)| {
                    k.pretty(allocator)
                        .append(allocator.text(" => "))
                        .append(v.pretty(allocator))
                        .group()
                });
                allocator
                    .text("{")
                    .append(
                        allocator
                            .intersperse(pair_docs, allocator.text(",").append(allocator.space()))
                            .group()
                            .nest(2),
                    )
                    .append(allocator.text("}"))
            }
            Expr::Splat(_, e) => allocator.text("*").append(e.pretty(allocator)),
            Expr::SelfRef(_) => allocator.text("self"),
            Expr::LocalVar(_, n) => allocator.text(n.as_str()),
            Expr::Field(_, n) => allocator.text("@").append(allocator.text(n.as_str())),
            Expr::Const(_, scope, n) => match scope {
                Some(scope) => scope
                    .pretty(allocator)
                    .append(allocator.text("::"))
                    .append(allocator.text(n.as_str())),
                None => allocator.text(n.as_str()),
            },
            Expr::LocalAsgn(_, n, v) => allocator
                .text(n.as_str())
                .append(allocator.text(" = "))
                .append(v.pretty(allocator)),
            Expr::FieldAsgn(_, n, v) => allocator
                .text("@")
                .append(allocator.text(n.as_str()))
                .append(allocator.text(" = "))
                .append(v.pretty(allocator)),
            Expr::OpAsgn(_, target, op, v) => target_doc(allocator, target)
                .append(allocator.space())
                .append(allocator.text(op.as_str()))
                .append(allocator.text("= "))
                .append(v.pretty(allocator)),
            Expr::Bind(_, target) => target_doc(allocator, target),
            Expr::Send(_, Some(r), n, xs, _) if is_operator(n) && xs.len() == 1 => r
                .pretty(allocator)
                .append(allocator.space())
                .append(allocator.text(n.as_str()))
                .append(allocator.space())
                .append(xs[0].pretty(allocator))
                .group(),
            Expr::Send(_, r, n, xs, shape) => {
                let target = match r {
                    Some(r) => r
                        .pretty(allocator)
                        .append(allocator.text("."))
                        .append(allocator.text(n.as_str())),
                    None => allocator.text(n.as_str()),
                };
                call_doc(allocator, target, xs, *shape)
            }
            Expr::SafeSend(_, r, n, xs, shape) => {
                let target = r
                    .pretty(allocator)
                    .append(allocator.text("&."))
                    .append(allocator.text(n.as_str()));
                call_doc(allocator, target, xs, *shape)
            }
            Expr::Index(_, r, xs) => r
                .pretty(allocator)
                .append(allocator.text("["))
                .append(comma_separated(allocator, xs))
                .append(allocator.text("]")),
            Expr::Super(_, None) => allocator.text("super"),
            Expr::Super(_, Some(xs)) => {
                call_doc(allocator, allocator.text("super"), xs, CallShape::Parens)
            }
            Expr::And(_, l, r) => l
                .pretty(allocator)
                .append(allocator.text(" && "))
                .append(r.pretty(allocator))
                .group(),
            Expr::Or(_, l, r) => l
                .pretty(allocator)
                .append(allocator.text(" || "))
                .append(r.pretty(allocator))
                .group(),
            Expr::Not(_, e) => allocator
                .text("!(")
                .append(e.pretty(allocator))
                .append(allocator.text(")")),
            Expr::If(_, c, t, e) => {
                let head = allocator.text("if ").append(c.pretty(allocator));
                match e {
                    Some(_) => head
                        .append(body_doc(allocator, statements_of(t.as_ref()), "else"))
                        .append(body_doc(allocator, statements_of(e.as_ref()), "end")),
                    None => head.append(body_doc(allocator, statements_of(t.as_ref()), "end")),
                }
            }
            Expr::Return(_, None) => allocator.text("return"),
            Expr::Return(_, Some(e)) => allocator.text("return ").append(e.pretty(allocator)),
            Expr::Seq(_, xs) => {
                allocator.intersperse(xs.iter().map(|x| x.pretty(allocator)), allocator.hardline())
            }
            Expr::Block(_, call, params, body) => {
                let params_doc = if params.is_empty() {
                    allocator.nil()
                } else {
                    allocator
                        .text(" |")
                        .append(comma_separated(allocator, params))
                        .append(allocator.text("|"))
                };
                call.pretty(allocator)
                    .append(allocator.text(" do"))
                    .append(params_doc)
                    .append(body_doc(allocator, statements_of(body.as_ref()), "end"))
            }
            Expr::Lambda(_) => allocator.text("->"),
            Expr::Def(_, n, params, body) => allocator
                .text("def ")
                .append(allocator.text(n.as_str()))
                .append(allocator.text("("))
                .append(comma_separated(allocator, params))
                .append(allocator.text(")"))
                .append(body_doc(allocator, statements_of(body.as_ref()), "end")),
            Expr::Alias(_, new, old) => allocator.text(format!("alias {} {}", new, old)),
            Expr::TypeDef(_, kind, n, sup, body) => {
                let keyword = match kind {
                    TypeKind::Module => "module ",
                    TypeKind::Class => "class ",
                };
                let head = allocator.text(keyword).append(allocator.text(n.as_str()));
                let head = match sup {
                    Some(sup) => head.append(allocator.text(" < ")).append(sup.pretty(allocator)),
                    None => head,
                };
                head.append(body_doc(allocator, body.iter().collect(), "end"))
            }
            Expr::Await(_, e) => allocator.text("await ").append(e.pretty(allocator)),
            Expr::AsyncFn(_, params, body) => allocator
                .text("async (")
                .append(comma_separated(allocator, params))
                .append(allocator.text(") =>"))
                .append(body_doc(allocator, statements_of(Some(body)), "end")),
            Expr::Directive(_, d) => allocator.text(format!("%{}", d.name())),
            Expr::Other(_, kind, xs) => allocator
                .text("(")
                .append(allocator.text(kind.as_str()))
                .append(allocator.concat(
                    xs.iter()
                        .map(|x| allocator.space().append(x.pretty(allocator))),
                ))
                .append(allocator.text(")"))
                .group(),
        }
    }
}

fn target_doc<'b, D, A>(allocator: &'b D, target: &'b AssignTarget) -> DocBuilder<'b, D, A>
where
    D: DocAllocator<'b, A>,
    D::Doc: Clone,
    A: Clone,
{
    match target {
        AssignTarget::Local(n) => allocator.text(n.as_str()),
        AssignTarget::Field(n) => allocator.text("@").append(allocator.text(n.as_str())),
    }
}

fn call_doc<'b, D, A>(
    allocator: &'b D,
    target: DocBuilder<'b, D, A>,
    args: &'b [RcExpr],
    shape: CallShape,
) -> DocBuilder<'b, D, A>
where
    D: DocAllocator<'b, A>,
    D::Doc: Clone,
    A: Clone,
{
    match shape {
        CallShape::Bare if args.is_empty() => target,
        CallShape::Bare => target
            .append(allocator.space())
            .append(comma_separated(allocator, args)),
        CallShape::Parens => target
            .append(allocator.text("("))
            .append(comma_separated(allocator, args))
            .append(allocator.text(")"))
            .group(),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::{common::prettify::prettify, core::expr::acore::*};

    #[test]
    pub fn test_primitives() {
        assert_eq!(prettify(&Primitive::Str("blah".to_string())), "\"blah\"\n");
        assert_eq!(prettify(&Primitive::Sym("foo".to_string())), ":foo\n");
        assert_eq!(prettify(&nil()), "nil\n");
    }

    #[test]
    pub fn test_calls() {
        assert_eq!(
            prettify(&host_send("title", vec![], CallShape::Bare)),
            "self.title\n"
        );
        assert_eq!(
            prettify(&host_send("save!", vec![], CallShape::Parens)),
            "self.save!()\n"
        );
        assert_eq!(prettify(&is_nil(field("profile"))), "@profile == nil\n");
        assert_eq!(
            prettify(&index(
                host_send("attributes", vec![], CallShape::Bare),
                vec![str("status")]
            )),
            "self.attributes[\"status\"]\n"
        );
    }

    #[test]
    pub fn test_definitions() {
        let d = def(
            "publish",
            vec![arg("at")],
            Some(seq(vec![
                fasgn("published_at", lvar("at")),
                await_(host_send("save", vec![], CallShape::Parens)),
            ])),
        );
        assert_eq!(
            prettify(&d),
            "def publish(at)\n  @published_at = at\n  await self.save()\nend\n"
        );
    }

    #[test]
    pub fn test_module_with_directives() {
        let m = module(
            "Publishable",
            vec![directive(Directive::UnderscoredFields)],
        );
        assert_eq!(
            prettify(&m),
            "module Publishable\n  %underscored_fields\nend\n"
        );
    }
}
