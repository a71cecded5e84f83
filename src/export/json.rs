//! JSON export in the object node encoding read by `import::json`
use crate::common::sourcemap::SourceMap;
use crate::core::expr::*;
use serde_json::{json, Map, Value};
use std::io::{self, Write};

use super::Emitter;

/// Convert a core expression to its JSON node encoding, including
/// source locations where known
pub fn to_json(expr: &RcExpr, source_map: &SourceMap) -> Value {
    NodeWriter { source_map }.node(expr)
}

struct NodeWriter<'a> {
    source_map: &'a SourceMap,
}

impl NodeWriter<'_> {
    fn located(&self, expr: &RcExpr, kind: &str, children: Vec<Value>) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(kind));
        map.insert("children".to_string(), Value::Array(children));
        if let Some(info) = self.source_map.source_info(expr) {
            map.insert(
                "loc".to_string(),
                json!([info.span.start().to_usize(), info.span.end().to_usize()]),
            );
        }
        map
    }

    fn make(&self, expr: &RcExpr, kind: &str, children: Vec<Value>) -> Value {
        Value::Object(self.located(expr, kind, children))
    }

    fn call(&self, expr: &RcExpr, kind: &str, children: Vec<Value>, shape: CallShape) -> Value {
        let mut map = self.located(expr, kind, children);
        map.insert("parens".to_string(), json!(shape == CallShape::Parens));
        Value::Object(map)
    }

    fn opt(&self, expr: &Option<RcExpr>) -> Value {
        expr.as_ref().map(|e| self.node(e)).unwrap_or(Value::Null)
    }

    fn all(&self, xs: &[RcExpr]) -> Vec<Value> {
        xs.iter().map(|x| self.node(x)).collect()
    }

    fn body(&self, statements: &[RcExpr]) -> Value {
        match statements {
            [] => Value::Null,
            [single] => self.node(single),
            xs => json!({"type": "begin", "children": self.all(xs)}),
        }
    }

    fn node(&self, expr: &RcExpr) -> Value {
        match &*expr.inner {
            Expr::Literal(_, prim) => match prim {
                Primitive::Nil => self.make(expr, "nil", vec![]),
                Primitive::Bool(true) => self.make(expr, "true", vec![]),
                Primitive::Bool(false) => self.make(expr, "false", vec![]),
                Primitive::Num(n) if n.is_f64() => self.make(expr, "float", vec![json!(n)]),
                Primitive::Num(n) => self.make(expr, "int", vec![json!(n)]),
                Primitive::Str(s) => self.make(expr, "str", vec![json!(s)]),
                Primitive::Sym(s) => self.make(expr, "sym", vec![json!(s)]),
            },
            Expr::Interp(_, xs) => self.make(expr, "dstr", self.all(xs)),
            Expr::Array(_, xs) => self.make(expr, "array", self.all(xs)),
            Expr::Hash(_, pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(k, v)| json!({"type": "pair", "children": [self.node(k), self.node(v)]}))
                    .collect();
                self.make(expr, "hash", pairs)
            }
            Expr::Splat(_, e) => self.make(expr, "splat", vec![self.node(e)]),
            Expr::SelfRef(_) => self.make(expr, "self", vec![]),
            Expr::LocalVar(_, n) => self.make(expr, "lvar", vec![json!(n)]),
            Expr::Field(_, n) => self.make(expr, "ivar", vec![json!(format!("@{}", n))]),
            Expr::Const(_, scope, n) => {
                self.make(expr, "const", vec![self.opt(scope), json!(n)])
            }
            Expr::LocalAsgn(_, n, v) => self.make(expr, "lvasgn", vec![json!(n), self.node(v)]),
            Expr::FieldAsgn(_, n, v) => {
                self.make(expr, "ivasgn", vec![json!(format!("@{}", n)), self.node(v)])
            }
            Expr::OpAsgn(_, target, op, v) => {
                let (kind, name) = target_parts(target);
                let target = json!({"type": kind, "children": [name]});
                match op.as_str() {
                    "||" => self.make(expr, "or_asgn", vec![target, self.node(v)]),
                    "&&" => self.make(expr, "and_asgn", vec![target, self.node(v)]),
                    _ => self.make(expr, "op_asgn", vec![target, json!(op), self.node(v)]),
                }
            }
            Expr::Bind(_, target) => {
                let (kind, name) = target_parts(target);
                self.make(expr, kind, vec![json!(name)])
            }
            Expr::Send(_, r, n, xs, shape) => {
                let mut children = vec![self.opt(r), json!(n)];
                children.extend(self.all(xs));
                self.call(expr, "send", children, *shape)
            }
            Expr::SafeSend(_, r, n, xs, shape) => {
                let mut children = vec![self.node(r), json!(n)];
                children.extend(self.all(xs));
                self.call(expr, "csend", children, *shape)
            }
            Expr::Index(_, r, xs) => {
                let mut children = vec![self.node(r)];
                children.extend(self.all(xs));
                self.make(expr, "index", children)
            }
            Expr::Super(_, None) => self.make(expr, "zsuper", vec![]),
            Expr::Super(_, Some(xs)) => self.make(expr, "super", self.all(xs)),
            Expr::And(_, l, r) => self.make(expr, "and", vec![self.node(l), self.node(r)]),
            Expr::Or(_, l, r) => self.make(expr, "or", vec![self.node(l), self.node(r)]),
            Expr::Not(_, e) => self.make(expr, "not", vec![self.node(e)]),
            Expr::If(_, c, t, e) => {
                self.make(expr, "if", vec![self.node(c), self.opt(t), self.opt(e)])
            }
            Expr::Return(_, e) => self.make(expr, "return", e.iter().map(|e| self.node(e)).collect()),
            Expr::Seq(_, xs) => self.make(expr, "begin", self.all(xs)),
            Expr::Block(_, call, params, body) => self.make(
                expr,
                "block",
                vec![self.node(call), self.params(params), self.opt(body)],
            ),
            Expr::Lambda(_) => self.make(expr, "lambda", vec![]),
            Expr::Def(_, n, params, body) => {
                self.make(expr, "def", vec![json!(n), self.params(params), self.opt(body)])
            }
            Expr::Alias(_, new, old) => self.make(
                expr,
                "alias",
                vec![
                    json!({"type": "sym", "children": [new]}),
                    json!({"type": "sym", "children": [old]}),
                ],
            ),
            Expr::TypeDef(_, TypeKind::Module, n, _, body) => {
                self.make(expr, "module", vec![const_path(n), self.body(body)])
            }
            Expr::TypeDef(_, TypeKind::Class, n, sup, body) => self.make(
                expr,
                "class",
                vec![const_path(n), self.opt(sup), self.body(body)],
            ),
            Expr::Await(_, e) => self.make(expr, "await", vec![self.node(e)]),
            Expr::AsyncFn(_, params, body) => {
                self.make(expr, "async", vec![self.params(params), self.node(body)])
            }
            Expr::Directive(_, d) => self.make(expr, "directive", vec![json!(d.name())]),
            Expr::Other(_, kind, xs) => self.make(expr, kind, self.all(xs)),
        }
    }

    fn params(&self, params: &[Param]) -> Value {
        let args: Vec<Value> = params
            .iter()
            .map(|p| {
                let kind = match p.kind {
                    ParamKind::Positional => "arg",
                    ParamKind::Optional => "optarg",
                    ParamKind::Keyword => "kwarg",
                    ParamKind::OptionalKeyword => "kwoptarg",
                    ParamKind::Rest => "restarg",
                    ParamKind::KeywordRest => "kwrestarg",
                    ParamKind::BlockCapture => "blockarg",
                };
                let mut children: Vec<Value> = p.name.iter().map(|n| json!(n)).collect();
                children.extend(p.default.iter().map(|d| self.node(d)));
                json!({"type": kind, "children": children})
            })
            .collect();
        json!({"type": "args", "children": args})
    }
}

/// Node type and variable name of an assignment target
fn target_parts(target: &AssignTarget) -> (&'static str, String) {
    match target {
        AssignTarget::Local(n) => ("lvasgn", n.clone()),
        AssignTarget::Field(n) => ("ivasgn", format!("@{}", n)),
    }
}

/// `A::B` as nested `const` nodes
fn const_path(name: &str) -> Value {
    name.split("::").fold(Value::Null, |scope, n| {
        json!({"type": "const", "children": [scope, n]})
    })
}

/// Writes each tree as a JSON document
pub struct JsonEmitter<'a> {
    out: &'a mut (dyn Write + 'a),
}

impl<'a> JsonEmitter<'a> {
    pub fn new(out: &'a mut (dyn Write + 'a)) -> Self {
        JsonEmitter { out }
    }
}

impl Emitter for JsonEmitter<'_> {
    fn emit(&mut self, expr: &RcExpr, source_map: &SourceMap) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &to_json(expr, source_map))?;
        writeln!(self.out)
    }
}
