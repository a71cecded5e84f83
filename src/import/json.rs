//! Read JSON-serialised node trees into core
//!
//! A node is either an array whose first element is the node type
//! (`["send", null, "save"]`) or an object with `type`, `children`
//! and optional `loc` (`[begin, end]` byte offsets) and `parens`.
//! Node types are those of the `parser` gem plus the synthetic
//! `await`, `async` and `directive`.
use crate::common::sourcemap::{SourceMap, Smid};
use crate::core::expr::*;
use crate::import::error::{json_error_span, SourceError};
use codespan::{ByteIndex, Span};
use serde_json::Value;

/// Read the JSON text into a core expression
///
/// Use `source_map` to create new SMIDs and `file_id` for error
/// reporting.
pub fn read_json(
    source_map: &mut SourceMap,
    file_id: usize,
    text: &str,
) -> Result<RcExpr, SourceError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SourceError::InvalidJson(e.to_string(), file_id, json_error_span(text, &e)))?;
    read_value(source_map, file_id, &value)
}

/// Read an already parsed JSON value into a core expression
pub fn read_value(
    source_map: &mut SourceMap,
    file_id: usize,
    value: &Value,
) -> Result<RcExpr, SourceError> {
    Reader {
        source_map,
        file_id,
        span: Span::default(),
    }
    .node(value, "$")
}

/// The parts of a node in either encoding
struct Parts<'v> {
    kind: &'v str,
    children: &'v [Value],
    loc: Option<Span>,
    parens: Option<bool>,
}

struct Reader<'smap> {
    source_map: &'smap mut SourceMap,
    file_id: usize,
    /// Span of the nearest located node for error reporting
    span: Span,
}

impl<'smap> Reader<'smap> {
    fn malformed(&self, message: &str, path: &str) -> SourceError {
        SourceError::MalformedNode(message.to_string(), path.to_string(), self.file_id, self.span)
    }

    fn arity(&self, kind: &str, path: &str) -> SourceError {
        SourceError::BadArity(kind.to_string(), path.to_string(), self.file_id, self.span)
    }

    fn atom(&self, expected: &str, path: &str) -> SourceError {
        SourceError::BadAtom(expected.to_string(), path.to_string(), self.file_id, self.span)
    }

    fn parts<'v>(&self, value: &'v Value, path: &str) -> Result<Parts<'v>, SourceError> {
        match value {
            Value::Array(items) => match items.split_first() {
                Some((Value::String(kind), children)) => Ok(Parts {
                    kind,
                    children,
                    loc: None,
                    parens: None,
                }),
                _ => Err(self.malformed("array node must start with its type", path)),
            },
            Value::Object(map) => {
                let kind = map
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.malformed("object node needs a string type", path))?;
                let children: &[Value] = match map.get("children") {
                    Some(Value::Array(xs)) => xs.as_slice(),
                    None | Some(Value::Null) => &[],
                    Some(_) => return Err(self.malformed("children must be an array", path)),
                };
                let loc = match map.get("loc") {
                    Some(Value::Array(loc)) => match loc.as_slice() {
                        [b, e] => match (b.as_u64(), e.as_u64()) {
                            (Some(b), Some(e)) => Some(span(b, e)),
                            _ => return Err(self.malformed("loc must be byte offsets", path)),
                        },
                        _ => return Err(self.malformed("loc must be [begin, end]", path)),
                    },
                    None | Some(Value::Null) => None,
                    Some(_) => return Err(self.malformed("loc must be [begin, end]", path)),
                };
                let parens = map.get("parens").and_then(Value::as_bool);
                Ok(Parts {
                    kind,
                    children,
                    loc,
                    parens,
                })
            }
            _ => Err(self.malformed("expected a node", path)),
        }
    }

    fn node(&mut self, value: &Value, path: &str) -> Result<RcExpr, SourceError> {
        let parts = self.parts(value, path)?;
        let outer = self.span;
        let smid = match parts.loc {
            Some(loc) => {
                self.span = loc;
                self.source_map.add(self.file_id, loc)
            }
            None => Smid::default(),
        };
        let result = self.build(&parts, smid, path);
        self.span = outer;
        result
    }

    fn opt_node(&mut self, value: &Value, path: &str) -> Result<Option<RcExpr>, SourceError> {
        match value {
            Value::Null => Ok(None),
            v => self.node(v, path).map(Some),
        }
    }

    /// Read nodes from `values`, the first of which is at position
    /// `first` in the parent
    fn nodes(
        &mut self,
        values: &[Value],
        path: &str,
        first: usize,
    ) -> Result<Vec<RcExpr>, SourceError> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| self.node(v, &format!("{}/{}", path, i + first)))
            .collect()
    }

    /// A string atom, or a `sym`/`str` node holding one
    fn name(&self, value: &Value, path: &str) -> Result<String, SourceError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            v => match self.parts(v, path) {
                Ok(Parts {
                    kind: "sym" | "str",
                    children: [Value::String(s)],
                    ..
                }) => Ok(s.clone()),
                _ => Err(self.atom("a name", path)),
            },
        }
    }

    /// Name of a `const` node path (`A::B`)
    fn const_name(&self, value: &Value, path: &str) -> Result<String, SourceError> {
        match self.parts(value, path)? {
            Parts {
                kind: "const",
                children: [scope, Value::String(name)],
                ..
            } => match scope {
                Value::Null => Ok(name.clone()),
                s => match self.parts(s, path) {
                    Ok(Parts { kind: "cbase", .. }) => Ok(name.clone()),
                    _ => Ok(format!("{}::{}", self.const_name(s, path)?, name)),
                },
            },
            _ => Err(self.atom("a constant name", path)),
        }
    }

    fn build(&mut self, parts: &Parts, s: Smid, path: &str) -> Result<RcExpr, SourceError> {
        let kind = parts.kind;
        let c = parts.children;
        let at = |i: usize| format!("{}/{}", path, i + 1);

        let expr = match (kind, c) {
            ("nil", []) => core::nil(s),
            ("true", []) => core::bool_(s, true),
            ("false", []) => core::bool_(s, false),
            ("int" | "float", [Value::Number(n)]) => core::num(s, n.clone()),
            ("int" | "float", _) => return Err(self.atom("a number", &at(0))),
            ("str", [Value::String(v)]) => core::str(s, v),
            ("sym", [Value::String(v)]) => core::sym(s, v),
            ("str" | "sym", _) => return Err(self.atom("a string", &at(0))),
            ("dstr" | "dsym", xs) => RcExpr::from(Expr::Interp(s, self.nodes(xs, path, 1)?)),
            ("array", xs) => core::array(s, self.nodes(xs, path, 1)?),
            ("hash", xs) => self.hash(s, xs, path)?,
            ("splat", [x]) => core::splat(s, self.node(x, &at(0))?),
            ("self", []) => core::self_(s),
            ("lvar", [n]) => core::lvar(s, self.name(n, &at(0))?),
            ("ivar", [n]) => core::field(s, strip_sigil(&self.name(n, &at(0))?)),
            ("const", [scope, n]) => {
                let scope = self.opt_node(scope, &at(0))?;
                core::const_(s, scope, self.name(n, &at(1))?)
            }
            ("lvasgn", [n, v]) => core::lasgn(s, self.name(n, &at(0))?, self.node(v, &at(1))?),
            ("ivasgn", [n, v]) => core::fasgn(
                s,
                strip_sigil(&self.name(n, &at(0))?),
                self.node(v, &at(1))?,
            ),
            ("lvasgn" | "ivasgn", [_]) => core::bind(s, self.assign_target_parts(parts, path)?),
            ("op_asgn", [t, op, v]) => core::op_asgn(
                s,
                self.assign_target(t, &at(0))?,
                self.name(op, &at(1))?,
                self.node(v, &at(2))?,
            ),
            ("or_asgn", [t, v]) => {
                core::op_asgn(s, self.assign_target(t, &at(0))?, "||", self.node(v, &at(1))?)
            }
            ("and_asgn", [t, v]) => {
                core::op_asgn(s, self.assign_target(t, &at(0))?, "&&", self.node(v, &at(1))?)
            }
            ("send", [r, n, args @ ..]) => {
                let receiver = self.opt_node(r, &at(0))?;
                let name = self.name(n, &at(1))?;
                let args = self.nodes(args, path, 3)?;
                let shape = self.shape(parts, &args);
                core::send_shaped(s, receiver, name, args, shape)
            }
            ("csend", [r, n, args @ ..]) => {
                let receiver = self.node(r, &at(0))?;
                let name = self.name(n, &at(1))?;
                let args = self.nodes(args, path, 3)?;
                let shape = self.shape(parts, &args);
                RcExpr::from(Expr::SafeSend(s, receiver, name, args, shape))
            }
            ("index", [r, args @ ..]) => {
                core::index(s, self.node(r, &at(0))?, self.nodes(args, path, 2)?)
            }
            ("super", xs) => core::super_(s, Some(self.nodes(xs, path, 1)?)),
            ("zsuper", []) => core::super_(s, None),
            ("and", [l, r]) => core::and(s, self.node(l, &at(0))?, self.node(r, &at(1))?),
            ("or", [l, r]) => core::or(s, self.node(l, &at(0))?, self.node(r, &at(1))?),
            ("not", [e]) => core::not(s, self.node(e, &at(0))?),
            ("if", [cond, t, e]) => core::if_(
                s,
                self.node(cond, &at(0))?,
                self.opt_node(t, &at(1))?,
                self.opt_node(e, &at(2))?,
            ),
            ("return", []) => core::ret(s, None),
            ("return", [e]) => core::ret(s, Some(self.node(e, &at(0))?)),
            ("return", xs) => core::ret(s, Some(core::array(s, self.nodes(xs, path, 1)?))),
            ("begin" | "kwbegin", xs) => core::seq(s, self.nodes(xs, path, 1)?),
            ("block", [call, args, body]) => core::block(
                s,
                self.node(call, &at(0))?,
                self.params(args, &at(1))?,
                self.opt_node(body, &at(2))?,
            ),
            ("lambda", []) => core::lambda(s),
            ("def", [n, args, body]) => core::def(
                s,
                self.name(n, &at(0))?,
                self.params(args, &at(1))?,
                self.opt_node(body, &at(2))?,
            ),
            ("alias", [new, old]) => {
                core::alias(s, self.name(new, &at(0))?, self.name(old, &at(1))?)
            }
            ("module", [n, body]) => {
                let name = self.const_name(n, &at(0))?;
                let body = self.opt_node(body, &at(1))?;
                core::module(s, name, body.map(|b| b.statements()).unwrap_or_default())
            }
            ("class", [n, sup, body]) => {
                let name = self.const_name(n, &at(0))?;
                let sup = self.opt_node(sup, &at(1))?;
                let body = self.opt_node(body, &at(2))?;
                RcExpr::from(Expr::TypeDef(
                    s,
                    TypeKind::Class,
                    name,
                    sup,
                    body.map(|b| b.statements()).unwrap_or_default(),
                ))
            }
            ("await", [e]) => core::await_(s, self.node(e, &at(0))?),
            ("async", [args, body]) => {
                core::async_fn(s, self.params(args, &at(0))?, self.node(body, &at(1))?)
            }
            ("directive", [n]) => {
                let name = self.name(n, &at(0))?;
                match Directive::from_name(&name) {
                    Some(d) => core::directive(s, d),
                    None => {
                        return Err(SourceError::UnknownDirective(
                            name,
                            at(0),
                            self.file_id,
                            self.span,
                        ))
                    }
                }
            }
            (
                "nil" | "true" | "false" | "splat" | "self" | "lvar" | "ivar" | "const" | "lvasgn"
                | "ivasgn" | "op_asgn" | "or_asgn" | "and_asgn" | "send" | "csend" | "index"
                | "zsuper" | "and" | "or" | "not" | "if" | "block" | "lambda" | "def" | "alias"
                | "module" | "class" | "await" | "async" | "directive",
                _,
            ) => return Err(self.arity(kind, path)),
            (_, xs) => RcExpr::from(Expr::Other(s, kind.to_string(), self.opaque(xs, path)?)),
        };

        Ok(expr)
    }

    fn shape(&self, parts: &Parts, args: &[RcExpr]) -> CallShape {
        match parts.parens {
            Some(true) => CallShape::Parens,
            Some(false) => CallShape::Bare,
            None => CallShape::for_args(args),
        }
    }

    /// Hashes of pairs; anything else (keyword splats) is carried
    /// opaquely
    fn hash(&mut self, s: Smid, xs: &[Value], path: &str) -> Result<RcExpr, SourceError> {
        let mut pairs = vec![];
        for (i, x) in xs.iter().enumerate() {
            let p = format!("{}/{}", path, i + 1);
            match self.parts(x, &p)? {
                Parts {
                    kind: "pair",
                    children: [k, v],
                    ..
                } => pairs.push((k, v, p)),
                _ => {
                    let children = self.nodes(xs, path, 1)?;
                    return Ok(RcExpr::from(Expr::Other(s, "hash".to_string(), children)));
                }
            }
        }

        let mut read = vec![];
        for (k, v, p) in pairs {
            let key = self.node(k, &format!("{}/1", p))?;
            let value = self.node(v, &format!("{}/2", p))?;
            read.push((key, value));
        }
        Ok(core::hash(s, read))
    }

    fn assign_target(&self, value: &Value, path: &str) -> Result<AssignTarget, SourceError> {
        let parts = self.parts(value, path)?;
        self.assign_target_parts(&parts, path)
    }

    /// A one-child `lvasgn` or `ivasgn`
    fn assign_target_parts(&self, parts: &Parts, path: &str) -> Result<AssignTarget, SourceError> {
        match *parts {
            Parts {
                kind: "lvasgn",
                children: [n],
                ..
            } => Ok(AssignTarget::Local(self.name(n, path)?)),
            Parts {
                kind: "ivasgn",
                children: [n],
                ..
            } => Ok(AssignTarget::Field(strip_sigil(&self.name(n, path)?).to_string())),
            _ => Err(self.atom("a local or instance variable target", path)),
        }
    }

    /// Parameters from an `args` node (or null)
    fn params(&mut self, value: &Value, path: &str) -> Result<Params, SourceError> {
        if value.is_null() {
            return Ok(vec![]);
        }

        let parts = self.parts(value, path)?;
        if parts.kind != "args" {
            return Err(self.atom("an args node", path));
        }

        let mut params = vec![];
        for (i, arg) in parts.children.iter().enumerate() {
            self.param(arg, &format!("{}/{}", path, i + 1), &mut params)?;
        }
        Ok(params)
    }

    fn param(&mut self, value: &Value, path: &str, params: &mut Params) -> Result<(), SourceError> {
        let parts = self.parts(value, path)?;
        let kind = match parts.kind {
            "arg" | "shadowarg" => ParamKind::Positional,
            "optarg" => ParamKind::Optional,
            "kwarg" => ParamKind::Keyword,
            "kwoptarg" => ParamKind::OptionalKeyword,
            "restarg" => ParamKind::Rest,
            "kwrestarg" => ParamKind::KeywordRest,
            "blockarg" => ParamKind::BlockCapture,
            "procarg0" | "mlhs" => {
                // destructured parameters bind each inner name
                return match parts.children {
                    [Value::String(n)] => {
                        params.push(Param::new(ParamKind::Positional, n));
                        Ok(())
                    }
                    xs => {
                        for (i, x) in xs.iter().enumerate() {
                            self.param(x, &format!("{}/{}", path, i + 1), params)?;
                        }
                        Ok(())
                    }
                };
            }
            other => return Err(self.atom(&format!("a parameter, not {}", other), path)),
        };

        let param = match parts.children {
            [] => Param {
                kind,
                name: None,
                default: None,
            },
            [n] => Param::new(kind, self.name(n, path)?),
            [n, d] => Param::new(kind, self.name(n, path)?).with_default(self.node(d, path)?),
            _ => return Err(self.arity(parts.kind, path)),
        };
        params.push(param);
        Ok(())
    }

    /// Children of unknown node kinds: nodes where they look like
    /// nodes, literals otherwise
    fn opaque(&mut self, xs: &[Value], path: &str) -> Result<Vec<RcExpr>, SourceError> {
        xs.iter()
            .enumerate()
            .map(|(i, x)| {
                let p = format!("{}/{}", path, i + 1);
                match x {
                    Value::Null => Ok(core::nil(Smid::default())),
                    Value::Bool(b) => Ok(core::bool_(Smid::default(), *b)),
                    Value::Number(n) => Ok(core::num(Smid::default(), n.clone())),
                    Value::String(v) => Ok(core::sym(Smid::default(), v)),
                    v => self.node(v, &p),
                }
            })
            .collect()
    }
}

fn strip_sigil(name: &str) -> &str {
    name.trim_start_matches('@')
}

fn span(begin: u64, end: u64) -> Span {
    let index = |n: u64| ByteIndex(u32::try_from(n).unwrap_or(u32::MAX));
    Span::new(index(begin), index(end.max(begin)))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::expr::acore::*;
    use serde_json::json;

    fn read(value: Value) -> RcExpr {
        let mut sm = SourceMap::new();
        read_value(&mut sm, 0, &value).unwrap()
    }

    fn read_err(value: Value) -> SourceError {
        let mut sm = SourceMap::new();
        read_value(&mut sm, 0, &value).unwrap_err()
    }

    #[test]
    pub fn test_literals() {
        assert_eq!(read(json!(["nil"])), nil());
        assert_eq!(read(json!(["int", 42])), num(42));
        assert_eq!(read(json!(["str", "hi"])), str("hi"));
        assert_eq!(read(json!(["sym", "draft"])), sym("draft"));
        assert_eq!(read(json!(["ivar", "@title"])), field("title"));
    }

    #[test]
    pub fn test_sends_and_shapes() {
        assert_eq!(read(json!(["send", null, "title"])), call("title", vec![]));
        assert_eq!(
            read(json!({"type": "send", "children": [null, "reload"], "parens": true})),
            send_shaped(None, "reload", vec![], CallShape::Parens)
        );
        assert_eq!(
            read(json!(["csend", ["lvar", "draft"], "destroy"])),
            csend(lvar("draft"), "destroy", vec![])
        );
    }

    #[test]
    pub fn test_module_and_def() {
        let value = json!(
            ["module", ["const", ["const", null, "Admin"], "Publishable"],
             ["begin",
              ["send", null, "extend", ["const", ["const", null, "ActiveSupport"], "Concern"]],
              ["def", "publish", ["args", ["arg", "at"], ["optarg", "force", ["false"]]],
               ["zsuper"]]]]
        );
        assert_eq!(
            read(value),
            module(
                "Admin::Publishable",
                vec![
                    call("extend", vec![const_path(&["ActiveSupport", "Concern"])]),
                    def(
                        "publish",
                        vec![
                            arg("at"),
                            Param::new(ParamKind::Optional, "force").with_default(bool_(false))
                        ],
                        Some(super_(None))
                    ),
                ]
            )
        );
    }

    #[test]
    pub fn test_blocks_and_assignments() {
        let value = json!(
            ["block", ["send", ["lvar", "items"], "each"], ["args", ["procarg0", ["arg", "x"]]],
             ["or_asgn", ["ivasgn", "@seen"], ["lvar", "x"]]]
        );
        assert_eq!(
            read(value),
            block(
                send(Some(lvar("items")), "each", vec![]),
                vec![arg("x")],
                Some(core::op_asgn(
                    Smid::default(),
                    AssignTarget::Field("seen".to_string()),
                    "||",
                    lvar("x")
                ))
            )
        );
    }

    #[test]
    pub fn test_bare_assignment_targets() {
        let value = json!(
            ["def", "m", ["args"],
             ["rescue", ["send", null, "risky"],
              ["resbody", null, ["lvasgn", "e"], ["send", null, "log", ["lvar", "e"]]],
              null]]
        );
        let other = |kind: &str, xs: Vec<RcExpr>| {
            RcExpr::from(Expr::Other(Smid::default(), kind.to_string(), xs))
        };
        assert_eq!(
            read(value),
            def(
                "m",
                vec![],
                Some(other(
                    "rescue",
                    vec![
                        call("risky", vec![]),
                        other(
                            "resbody",
                            vec![nil(), lbind("e"), call("log", vec![lvar("e")])]
                        ),
                        nil(),
                    ]
                ))
            )
        );

        let value = json!(
            ["masgn", ["mlhs", ["lvasgn", "a"], ["ivasgn", "@b"]], ["send", null, "pair"]]
        );
        assert_eq!(
            read(value),
            other(
                "masgn",
                vec![
                    other(
                        "mlhs",
                        vec![
                            lbind("a"),
                            core::bind(Smid::default(), AssignTarget::Field("b".to_string()))
                        ]
                    ),
                    call("pair", vec![]),
                ]
            )
        );
    }

    #[test]
    pub fn test_hash_with_keyword_splat_reads_children_once() {
        let mut sm = SourceMap::new();
        let value = json!(
            ["hash",
             {"type": "pair", "children": [["sym", "a"], ["int", 1]], "loc": [0, 4]},
             {"type": "kwsplat", "children": [["lvar", "opts"]], "loc": [6, 12]}]
        );
        let expr = read_value(&mut sm, 0, &value).unwrap();
        assert!(matches!(&*expr.inner, Expr::Other(_, k, xs) if k == "hash" && xs.len() == 2));
        assert_eq!(sm.len(), 2);
    }

    #[test]
    pub fn test_locations_register_smids() {
        let mut sm = SourceMap::new();
        let value = json!({"type": "lvar", "children": ["x"], "loc": [3, 4]});
        let expr = read_value(&mut sm, 0, &value).unwrap();
        let info = sm.source_info(&expr).unwrap();
        assert_eq!(info.span, Span::new(ByteIndex(3), ByteIndex(4)));
    }

    #[test]
    pub fn test_unknown_kinds_are_opaque() {
        assert_eq!(
            read(json!(["regexp", ["str", "a+"], ["regopt"]])),
            RcExpr::from(Expr::Other(
                Smid::default(),
                "regexp".to_string(),
                vec![
                    str("a+"),
                    RcExpr::from(Expr::Other(Smid::default(), "regopt".to_string(), vec![]))
                ]
            ))
        );
    }

    #[test]
    pub fn test_errors() {
        assert!(matches!(
            read_err(json!(["send"])),
            SourceError::BadArity(k, _, _, _) if k == "send"
        ));
        assert!(matches!(
            read_err(json!(["lvar", 3])),
            SourceError::BadAtom(_, p, _, _) if p == "$/1"
        ));
        assert!(matches!(
            read_err(json!([1, 2])),
            SourceError::MalformedNode(_, _, _, _)
        ));
        assert!(matches!(
            read_err(json!(["directive", "tabs"])),
            SourceError::UnknownDirective(_, _, _, _)
        ));
    }

    #[test]
    pub fn test_invalid_json() {
        let mut sm = SourceMap::new();
        assert!(matches!(
            read_json(&mut sm, 0, "[\"send\", "),
            Err(SourceError::InvalidJson(_, 0, _))
        ));
    }
}
