//! Core expression syntax for mixin module trees
use crate::common::sourcemap::{HasSmid, Smid};
use serde_json::Number;
use std::fmt;
use std::fmt::Display;
use std::rc::Rc;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Str(String),
    Sym(String),
    Num(Number),
    Bool(bool),
    Nil,
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Str(s) => write!(f, "{:?}", s),
            Primitive::Sym(s) => write!(f, ":{}", s),
            Primitive::Num(n) => write!(f, "{}", n),
            Primitive::Bool(b) => write!(f, "{}", b),
            Primitive::Nil => write!(f, "nil"),
        }
    }
}

/// How a call renders downstream.
///
/// A `Bare` zero-argument call may be rendered as a property read; a
/// `Parens` call always renders with an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    Parens,
    Bare,
}

impl CallShape {
    /// The shape a call takes when nothing else is known about it
    pub fn for_args(args: &[RcExpr]) -> Self {
        if args.is_empty() {
            CallShape::Bare
        } else {
            CallShape::Parens
        }
    }
}

/// Kinds of declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    Optional,
    Keyword,
    OptionalKeyword,
    Rest,
    KeywordRest,
    BlockCapture,
}

/// A declared parameter of a method, block or async function
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    /// Anonymous rest and block captures have no name
    pub name: Option<String>,
    pub default: Option<RcExpr>,
}

impl Param {
    pub fn new<T: AsRef<str>>(kind: ParamKind, name: T) -> Self {
        Param {
            kind,
            name: Some(name.as_ref().to_string()),
            default: None,
        }
    }

    pub fn with_default(self, default: RcExpr) -> Self {
        Param {
            default: Some(default),
            ..self
        }
    }
}

pub type Params = Vec<Param>;

/// Target of a compound assignment (`x ||= ...`, `@y += ...`)
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(String),
    Field(String),
}

/// Nested type definition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Module,
    Class,
}

/// Sentinel statements addressed to the code generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Private state uses underscored fields rather than native
    /// private field syntax
    UnderscoredFields,
    /// Zero-argument methods are rendered as accessors
    AccessorGetters,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::UnderscoredFields => "underscored_fields",
            Directive::AccessorGetters => "accessor_getters",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "underscored_fields" => Some(Directive::UnderscoredFields),
            "accessor_getters" => Some(Directive::AccessorGetters),
            _ => None,
        }
    }
}

/// The main expression type
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Primitive literal
    Literal(Smid, Primitive),
    /// Interpolated string
    Interp(Smid, Vec<RcExpr>),
    /// Literal array
    Array(Smid, Vec<RcExpr>),
    /// Literal hash (ordered pairs)
    Hash(Smid, Vec<(RcExpr, RcExpr)>),
    /// Splatted argument
    Splat(Smid, RcExpr),
    /// The current instance
    SelfRef(Smid),
    /// Read of a local variable
    LocalVar(Smid, String),
    /// Read of an instance field (name without sigil)
    Field(Smid, String),
    /// Constant reference with optional scope
    Const(Smid, Option<RcExpr>, String),
    /// Local variable assignment
    LocalAsgn(Smid, String, RcExpr),
    /// Instance field assignment
    FieldAsgn(Smid, String, RcExpr),
    /// Compound assignment (`||=`, `&&=`, `+=`...) with the operator
    OpAsgn(Smid, AssignTarget, String, RcExpr),
    /// Assignment target bound without a value of its own (`rescue =>
    /// e`, the targets of `a, b = pair`)
    Bind(Smid, AssignTarget),
    /// Method call (receiver, name, args, shape); no receiver means
    /// an implicit-receiver call
    Send(Smid, Option<RcExpr>, String, Vec<RcExpr>, CallShape),
    /// Safe navigation call
    SafeSend(Smid, RcExpr, String, Vec<RcExpr>, CallShape),
    /// Indexed read
    Index(Smid, RcExpr, Vec<RcExpr>),
    /// Super call, `None` for the implicit argument form
    Super(Smid, Option<Vec<RcExpr>>),
    And(Smid, RcExpr, RcExpr),
    Or(Smid, RcExpr, RcExpr),
    Not(Smid, RcExpr),
    If(Smid, RcExpr, Option<RcExpr>, Option<RcExpr>),
    Return(Smid, Option<RcExpr>),
    /// Statement sequence
    Seq(Smid, Vec<RcExpr>),
    /// Call with attached block (call, block params, body)
    Block(Smid, RcExpr, Params, Option<RcExpr>),
    /// Stabby lambda head (only meaningful as a block call)
    Lambda(Smid),
    /// Method definition
    Def(Smid, String, Params, Option<RcExpr>),
    /// Method alias (new, old)
    Alias(Smid, String, String),
    /// Nested module or class definition
    TypeDef(Smid, TypeKind, String, Option<RcExpr>, Vec<RcExpr>),
    /// Wait for completion of an asynchronous value
    Await(Smid, RcExpr),
    /// Asynchronous function
    AsyncFn(Smid, Params, RcExpr),
    /// Generator sentinel
    Directive(Smid, Directive),
    /// Node kinds outside the closed set, carried opaquely
    Other(Smid, String, Vec<RcExpr>),
}

impl HasSmid for Expr {
    fn smid(&self) -> Smid {
        match *self {
            Expr::Literal(s, _) => s,
            Expr::Interp(s, _) => s,
            Expr::Array(s, _) => s,
            Expr::Hash(s, _) => s,
            Expr::Splat(s, _) => s,
            Expr::SelfRef(s) => s,
            Expr::LocalVar(s, _) => s,
            Expr::Field(s, _) => s,
            Expr::Const(s, _, _) => s,
            Expr::LocalAsgn(s, _, _) => s,
            Expr::FieldAsgn(s, _, _) => s,
            Expr::OpAsgn(s, _, _, _) => s,
            Expr::Bind(s, _) => s,
            Expr::Send(s, _, _, _, _) => s,
            Expr::SafeSend(s, _, _, _, _) => s,
            Expr::Index(s, _, _) => s,
            Expr::Super(s, _) => s,
            Expr::And(s, _, _) => s,
            Expr::Or(s, _, _) => s,
            Expr::Not(s, _) => s,
            Expr::If(s, _, _, _) => s,
            Expr::Return(s, _) => s,
            Expr::Seq(s, _) => s,
            Expr::Block(s, _, _, _) => s,
            Expr::Lambda(s) => s,
            Expr::Def(s, _, _, _) => s,
            Expr::Alias(s, _, _) => s,
            Expr::TypeDef(s, _, _, _, _) => s,
            Expr::Await(s, _) => s,
            Expr::AsyncFn(s, _, _) => s,
            Expr::Directive(s, _) => s,
            Expr::Other(s, _, _) => s,
        }
    }
}

impl Expr {
    /// Name and arguments of an implicit-receiver call
    pub fn implicit_call(&self) -> Option<(&str, &[RcExpr])> {
        match self {
            Expr::Send(_, None, name, args, _) => Some((name.as_str(), args.as_slice())),
            _ => None,
        }
    }

    /// A method definition with a body
    pub fn is_def_with_body(&self) -> bool {
        matches!(self, Expr::Def(_, _, _, Some(_)))
    }
}

/// The main form in which expressions are passed around
#[derive(Debug, Clone, PartialEq)]
pub struct RcExpr {
    pub inner: Rc<Expr>,
}

impl From<Expr> for RcExpr {
    fn from(src: Expr) -> RcExpr {
        RcExpr {
            inner: Rc::new(src),
        }
    }
}

impl HasSmid for RcExpr {
    fn smid(&self) -> Smid {
        self.inner.smid()
    }
}

fn walk_params<F: Fn(RcExpr) -> RcExpr>(params: &[Param], f: &F) -> Params {
    params
        .iter()
        .map(|p| Param {
            kind: p.kind,
            name: p.name.clone(),
            default: p.default.clone().map(f),
        })
        .collect()
}

impl RcExpr {
    /// Helper for methods that recurse down through expressions.
    /// Rebuilds a node of the same kind with `f` applied to every
    /// child expression, preserving the SMID and call shape. Not
    /// necessarily cheap as it rebuilds regardless of whether
    /// changes are required.
    pub fn walk<F: Fn(RcExpr) -> RcExpr>(&self, f: &F) -> RcExpr {
        let each = |xs: &Vec<RcExpr>| xs.iter().map(|x| f(x.clone())).collect::<Vec<_>>();
        match &*self.inner {
            Expr::Interp(s, xs) => RcExpr::from(Expr::Interp(*s, each(xs))),
            Expr::Array(s, xs) => RcExpr::from(Expr::Array(*s, each(xs))),
            Expr::Hash(s, pairs) => RcExpr::from(Expr::Hash(
                *s,
                pairs
                    .iter()
                    .map(|(k, v)| (f(k.clone()), f(v.clone())))
                    .collect(),
            )),
            Expr::Splat(s, e) => RcExpr::from(Expr::Splat(*s, f(e.clone()))),
            Expr::Const(s, scope, n) => {
                RcExpr::from(Expr::Const(*s, scope.clone().map(f), n.clone()))
            }
            Expr::LocalAsgn(s, n, v) => RcExpr::from(Expr::LocalAsgn(*s, n.clone(), f(v.clone()))),
            Expr::FieldAsgn(s, n, v) => RcExpr::from(Expr::FieldAsgn(*s, n.clone(), f(v.clone()))),
            Expr::OpAsgn(s, t, op, v) => {
                RcExpr::from(Expr::OpAsgn(*s, t.clone(), op.clone(), f(v.clone())))
            }
            Expr::Send(s, r, n, xs, shape) => RcExpr::from(Expr::Send(
                *s,
                r.clone().map(f),
                n.clone(),
                each(xs),
                *shape,
            )),
            Expr::SafeSend(s, r, n, xs, shape) => RcExpr::from(Expr::SafeSend(
                *s,
                f(r.clone()),
                n.clone(),
                each(xs),
                *shape,
            )),
            Expr::Index(s, r, xs) => RcExpr::from(Expr::Index(*s, f(r.clone()), each(xs))),
            Expr::Super(s, xs) => {
                RcExpr::from(Expr::Super(*s, xs.as_ref().map(each)))
            }
            Expr::And(s, l, r) => RcExpr::from(Expr::And(*s, f(l.clone()), f(r.clone()))),
            Expr::Or(s, l, r) => RcExpr::from(Expr::Or(*s, f(l.clone()), f(r.clone()))),
            Expr::Not(s, e) => RcExpr::from(Expr::Not(*s, f(e.clone()))),
            Expr::If(s, c, t, e) => RcExpr::from(Expr::If(
                *s,
                f(c.clone()),
                t.clone().map(f),
                e.clone().map(f),
            )),
            Expr::Return(s, e) => RcExpr::from(Expr::Return(*s, e.clone().map(f))),
            Expr::Seq(s, xs) => RcExpr::from(Expr::Seq(*s, each(xs))),
            Expr::Block(s, call, params, body) => RcExpr::from(Expr::Block(
                *s,
                f(call.clone()),
                walk_params(params, f),
                body.clone().map(f),
            )),
            Expr::Def(s, n, params, body) => RcExpr::from(Expr::Def(
                *s,
                n.clone(),
                walk_params(params, f),
                body.clone().map(f),
            )),
            Expr::TypeDef(s, k, n, sup, body) => RcExpr::from(Expr::TypeDef(
                *s,
                *k,
                n.clone(),
                sup.clone().map(f),
                each(body),
            )),
            Expr::Await(s, e) => RcExpr::from(Expr::Await(*s, f(e.clone()))),
            Expr::AsyncFn(s, params, body) => RcExpr::from(Expr::AsyncFn(
                *s,
                walk_params(params, f),
                f(body.clone()),
            )),
            Expr::Other(s, k, xs) => RcExpr::from(Expr::Other(*s, k.clone(), each(xs))),
            Expr::Literal(_, _)
            | Expr::SelfRef(_)
            | Expr::LocalVar(_, _)
            | Expr::Field(_, _)
            | Expr::Bind(_, _)
            | Expr::Lambda(_)
            | Expr::Alias(_, _, _)
            | Expr::Directive(_, _) => self.clone(),
        }
    }

    /// Visit each immediate child expression in order without
    /// rebuilding.
    pub fn visit<F: FnMut(&RcExpr)>(&self, f: &mut F) {
        fn params<F: FnMut(&RcExpr)>(ps: &[Param], f: &mut F) {
            ps.iter().filter_map(|p| p.default.as_ref()).for_each(|d| f(d));
        }

        match &*self.inner {
            Expr::Interp(_, xs) | Expr::Array(_, xs) | Expr::Seq(_, xs) => xs.iter().for_each(f),
            Expr::Other(_, _, xs) => xs.iter().for_each(f),
            Expr::Hash(_, pairs) => {
                for (k, v) in pairs {
                    f(k);
                    f(v);
                }
            }
            Expr::Splat(_, e) | Expr::Not(_, e) | Expr::Await(_, e) => f(e),
            Expr::Const(_, scope, _) => scope.iter().for_each(f),
            Expr::LocalAsgn(_, _, v) | Expr::FieldAsgn(_, _, v) | Expr::OpAsgn(_, _, _, v) => f(v),
            Expr::Send(_, r, _, xs, _) => {
                r.iter().for_each(&mut *f);
                xs.iter().for_each(f);
            }
            Expr::SafeSend(_, r, _, xs, _) | Expr::Index(_, r, xs) => {
                f(r);
                xs.iter().for_each(f);
            }
            Expr::Super(_, xs) => xs.iter().flatten().for_each(f),
            Expr::And(_, l, r) | Expr::Or(_, l, r) => {
                f(l);
                f(r);
            }
            Expr::If(_, c, t, e) => {
                f(c);
                t.iter().for_each(&mut *f);
                e.iter().for_each(f);
            }
            Expr::Return(_, e) => e.iter().for_each(f),
            Expr::Block(_, call, ps, body) => {
                f(call);
                params(ps, f);
                body.iter().for_each(f);
            }
            Expr::Def(_, _, ps, body) => {
                params(ps, f);
                body.iter().for_each(f);
            }
            Expr::TypeDef(_, _, _, sup, body) => {
                sup.iter().for_each(&mut *f);
                body.iter().for_each(f);
            }
            Expr::AsyncFn(_, ps, body) => {
                params(ps, f);
                f(body);
            }
            Expr::Literal(_, _)
            | Expr::SelfRef(_)
            | Expr::LocalVar(_, _)
            | Expr::Field(_, _)
            | Expr::Bind(_, _)
            | Expr::Lambda(_)
            | Expr::Alias(_, _, _)
            | Expr::Directive(_, _) => {}
        }
    }

    /// Flatten statement sequences (including nested single
    /// statement wrappers) into a list of statements.
    pub fn statements(&self) -> Vec<RcExpr> {
        match &*self.inner {
            Expr::Seq(_, xs) => xs.iter().flat_map(|x| x.statements()).collect(),
            _ => vec![self.clone()],
        }
    }

    /// Reassemble a list of statements into a single body
    pub fn sequence(smid: Smid, mut statements: Vec<RcExpr>) -> Option<RcExpr> {
        match statements.len() {
            0 => None,
            1 => statements.pop(),
            _ => Some(RcExpr::from(Expr::Seq(smid, statements))),
        }
    }

    /// Rebuild a call with a different call shape
    pub fn reshaped(&self, shape: CallShape) -> RcExpr {
        match &*self.inner {
            Expr::Send(s, r, n, xs, _) => {
                RcExpr::from(Expr::Send(*s, r.clone(), n.clone(), xs.clone(), shape))
            }
            Expr::SafeSend(s, r, n, xs, _) => {
                RcExpr::from(Expr::SafeSend(*s, r.clone(), n.clone(), xs.clone(), shape))
            }
            _ => self.clone(),
        }
    }
}

/// Extract data from simple literal expressions
pub trait Extract<T> {
    fn extract(&self) -> Option<T>;
}

/// Symbols and strings both serve as names in declarations
impl Extract<String> for RcExpr {
    fn extract(&self) -> Option<String> {
        match &*self.inner {
            Expr::Literal(_, Primitive::Str(s)) => Some(s.to_string()),
            Expr::Literal(_, Primitive::Sym(s)) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl<P> Extract<Vec<P>> for RcExpr
where
    RcExpr: Extract<P>,
{
    fn extract(&self) -> Option<Vec<P>> {
        // single first:
        if let Some(v) = self.extract() {
            Some(vec![v])
        } else {
            match &*self.inner {
                Expr::Array(_, xs) => xs.iter().map(|x| x.extract()).collect(),
                _ => None,
            }
        }
    }
}

/// A collection of functions for concisely creating expressions
pub mod core {
    use super::*;

    pub fn nil(smid: Smid) -> RcExpr {
        RcExpr::from(Expr::Literal(smid, Primitive::Nil))
    }

    pub fn str<T: AsRef<str>>(smid: Smid, s: T) -> RcExpr {
        RcExpr::from(Expr::Literal(smid, Primitive::Str(s.as_ref().to_string())))
    }

    pub fn sym<T: AsRef<str>>(smid: Smid, s: T) -> RcExpr {
        RcExpr::from(Expr::Literal(smid, Primitive::Sym(s.as_ref().to_string())))
    }

    pub fn num<N: Into<Number>>(smid: Smid, n: N) -> RcExpr {
        RcExpr::from(Expr::Literal(smid, Primitive::Num(n.into())))
    }

    pub fn bool_(smid: Smid, b: bool) -> RcExpr {
        RcExpr::from(Expr::Literal(smid, Primitive::Bool(b)))
    }

    pub fn array(smid: Smid, elements: Vec<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Array(smid, elements))
    }

    pub fn hash(smid: Smid, pairs: Vec<(RcExpr, RcExpr)>) -> RcExpr {
        RcExpr::from(Expr::Hash(smid, pairs))
    }

    pub fn splat(smid: Smid, expr: RcExpr) -> RcExpr {
        RcExpr::from(Expr::Splat(smid, expr))
    }

    /// The current (host) instance
    pub fn self_(smid: Smid) -> RcExpr {
        RcExpr::from(Expr::SelfRef(smid))
    }

    pub fn lvar<T: AsRef<str>>(smid: Smid, name: T) -> RcExpr {
        RcExpr::from(Expr::LocalVar(smid, name.as_ref().to_string()))
    }

    pub fn field<T: AsRef<str>>(smid: Smid, name: T) -> RcExpr {
        RcExpr::from(Expr::Field(smid, name.as_ref().to_string()))
    }

    pub fn const_<T: AsRef<str>>(smid: Smid, scope: Option<RcExpr>, name: T) -> RcExpr {
        RcExpr::from(Expr::Const(smid, scope, name.as_ref().to_string()))
    }

    pub fn lasgn<T: AsRef<str>>(smid: Smid, name: T, value: RcExpr) -> RcExpr {
        RcExpr::from(Expr::LocalAsgn(smid, name.as_ref().to_string(), value))
    }

    pub fn fasgn<T: AsRef<str>>(smid: Smid, name: T, value: RcExpr) -> RcExpr {
        RcExpr::from(Expr::FieldAsgn(smid, name.as_ref().to_string(), value))
    }

    pub fn op_asgn<T: AsRef<str>>(smid: Smid, target: AssignTarget, op: T, value: RcExpr) -> RcExpr {
        RcExpr::from(Expr::OpAsgn(smid, target, op.as_ref().to_string(), value))
    }

    pub fn bind(smid: Smid, target: AssignTarget) -> RcExpr {
        RcExpr::from(Expr::Bind(smid, target))
    }

    /// A call shaped according to its arguments
    pub fn send<T: AsRef<str>>(
        smid: Smid,
        receiver: Option<RcExpr>,
        name: T,
        args: Vec<RcExpr>,
    ) -> RcExpr {
        let shape = CallShape::for_args(&args);
        send_shaped(smid, receiver, name, args, shape)
    }

    pub fn send_shaped<T: AsRef<str>>(
        smid: Smid,
        receiver: Option<RcExpr>,
        name: T,
        args: Vec<RcExpr>,
        shape: CallShape,
    ) -> RcExpr {
        RcExpr::from(Expr::Send(
            smid,
            receiver,
            name.as_ref().to_string(),
            args,
            shape,
        ))
    }

    /// A call explicitly targeted at the host instance
    pub fn host_send<T: AsRef<str>>(
        smid: Smid,
        name: T,
        args: Vec<RcExpr>,
        shape: CallShape,
    ) -> RcExpr {
        send_shaped(smid, Some(self_(smid)), name, args, shape)
    }

    pub fn csend<T: AsRef<str>>(smid: Smid, receiver: RcExpr, name: T, args: Vec<RcExpr>) -> RcExpr {
        let shape = CallShape::for_args(&args);
        RcExpr::from(Expr::SafeSend(
            smid,
            receiver,
            name.as_ref().to_string(),
            args,
            shape,
        ))
    }

    pub fn index(smid: Smid, receiver: RcExpr, args: Vec<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Index(smid, receiver, args))
    }

    pub fn super_(smid: Smid, args: Option<Vec<RcExpr>>) -> RcExpr {
        RcExpr::from(Expr::Super(smid, args))
    }

    pub fn and(smid: Smid, l: RcExpr, r: RcExpr) -> RcExpr {
        RcExpr::from(Expr::And(smid, l, r))
    }

    pub fn or(smid: Smid, l: RcExpr, r: RcExpr) -> RcExpr {
        RcExpr::from(Expr::Or(smid, l, r))
    }

    pub fn not(smid: Smid, e: RcExpr) -> RcExpr {
        RcExpr::from(Expr::Not(smid, e))
    }

    /// `expr == nil`
    pub fn is_nil(smid: Smid, expr: RcExpr) -> RcExpr {
        send_shaped(smid, Some(expr), "==", vec![nil(smid)], CallShape::Parens)
    }

    /// `expr != nil`
    pub fn not_nil(smid: Smid, expr: RcExpr) -> RcExpr {
        send_shaped(smid, Some(expr), "!=", vec![nil(smid)], CallShape::Parens)
    }

    pub fn if_(smid: Smid, c: RcExpr, t: Option<RcExpr>, e: Option<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::If(smid, c, t, e))
    }

    pub fn ret(smid: Smid, e: Option<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Return(smid, e))
    }

    pub fn seq(smid: Smid, statements: Vec<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Seq(smid, statements))
    }

    pub fn block(smid: Smid, call: RcExpr, params: Params, body: Option<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Block(smid, call, params, body))
    }

    pub fn lambda(smid: Smid) -> RcExpr {
        RcExpr::from(Expr::Lambda(smid))
    }

    pub fn def<T: AsRef<str>>(smid: Smid, name: T, params: Params, body: Option<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::Def(smid, name.as_ref().to_string(), params, body))
    }

    pub fn alias<T: AsRef<str>, U: AsRef<str>>(smid: Smid, new: T, old: U) -> RcExpr {
        RcExpr::from(Expr::Alias(
            smid,
            new.as_ref().to_string(),
            old.as_ref().to_string(),
        ))
    }

    pub fn module<T: AsRef<str>>(smid: Smid, name: T, body: Vec<RcExpr>) -> RcExpr {
        RcExpr::from(Expr::TypeDef(
            smid,
            TypeKind::Module,
            name.as_ref().to_string(),
            None,
            body,
        ))
    }

    pub fn await_(smid: Smid, e: RcExpr) -> RcExpr {
        RcExpr::from(Expr::Await(smid, e))
    }

    pub fn async_fn(smid: Smid, params: Params, body: RcExpr) -> RcExpr {
        RcExpr::from(Expr::AsyncFn(smid, params, body))
    }

    pub fn directive(smid: Smid, directive: Directive) -> RcExpr {
        RcExpr::from(Expr::Directive(smid, directive))
    }
}

/// Variants of the constructor functions with no source map ids
pub mod acore {
    use super::*;

    pub fn nil() -> RcExpr {
        core::nil(Smid::default())
    }

    pub fn str<T: AsRef<str>>(s: T) -> RcExpr {
        core::str(Smid::default(), s)
    }

    pub fn sym<T: AsRef<str>>(s: T) -> RcExpr {
        core::sym(Smid::default(), s)
    }

    pub fn num<N: Into<Number>>(n: N) -> RcExpr {
        core::num(Smid::default(), n)
    }

    pub fn bool_(b: bool) -> RcExpr {
        core::bool_(Smid::default(), b)
    }

    pub fn array(elements: Vec<RcExpr>) -> RcExpr {
        core::array(Smid::default(), elements)
    }

    pub fn hash(pairs: Vec<(RcExpr, RcExpr)>) -> RcExpr {
        core::hash(Smid::default(), pairs)
    }

    pub fn self_() -> RcExpr {
        core::self_(Smid::default())
    }

    pub fn lvar<T: AsRef<str>>(name: T) -> RcExpr {
        core::lvar(Smid::default(), name)
    }

    pub fn field<T: AsRef<str>>(name: T) -> RcExpr {
        core::field(Smid::default(), name)
    }

    /// Constant path, e.g. `&["ActiveSupport", "Concern"]`
    pub fn const_path(path: &[&str]) -> RcExpr {
        path.iter().fold(None, |scope, n| {
            Some(core::const_(Smid::default(), scope, n))
        })
        .unwrap_or_else(nil)
    }

    pub fn lasgn<T: AsRef<str>>(name: T, value: RcExpr) -> RcExpr {
        core::lasgn(Smid::default(), name, value)
    }

    pub fn fasgn<T: AsRef<str>>(name: T, value: RcExpr) -> RcExpr {
        core::fasgn(Smid::default(), name, value)
    }

    /// Bare local binding target
    pub fn lbind<T: AsRef<str>>(name: T) -> RcExpr {
        core::bind(Smid::default(), AssignTarget::Local(name.as_ref().to_string()))
    }

    pub fn send<T: AsRef<str>>(receiver: Option<RcExpr>, name: T, args: Vec<RcExpr>) -> RcExpr {
        core::send(Smid::default(), receiver, name, args)
    }

    pub fn send_shaped<T: AsRef<str>>(
        receiver: Option<RcExpr>,
        name: T,
        args: Vec<RcExpr>,
        shape: CallShape,
    ) -> RcExpr {
        core::send_shaped(Smid::default(), receiver, name, args, shape)
    }

    /// Implicit-receiver call
    pub fn call<T: AsRef<str>>(name: T, args: Vec<RcExpr>) -> RcExpr {
        send(None, name, args)
    }

    pub fn host_send<T: AsRef<str>>(name: T, args: Vec<RcExpr>, shape: CallShape) -> RcExpr {
        core::host_send(Smid::default(), name, args, shape)
    }

    pub fn csend<T: AsRef<str>>(receiver: RcExpr, name: T, args: Vec<RcExpr>) -> RcExpr {
        core::csend(Smid::default(), receiver, name, args)
    }

    pub fn index(receiver: RcExpr, args: Vec<RcExpr>) -> RcExpr {
        core::index(Smid::default(), receiver, args)
    }

    pub fn super_(args: Option<Vec<RcExpr>>) -> RcExpr {
        core::super_(Smid::default(), args)
    }

    pub fn and(l: RcExpr, r: RcExpr) -> RcExpr {
        core::and(Smid::default(), l, r)
    }

    pub fn or(l: RcExpr, r: RcExpr) -> RcExpr {
        core::or(Smid::default(), l, r)
    }

    pub fn not(e: RcExpr) -> RcExpr {
        core::not(Smid::default(), e)
    }

    pub fn is_nil(e: RcExpr) -> RcExpr {
        core::is_nil(Smid::default(), e)
    }

    pub fn not_nil(e: RcExpr) -> RcExpr {
        core::not_nil(Smid::default(), e)
    }

    pub fn if_(c: RcExpr, t: Option<RcExpr>, e: Option<RcExpr>) -> RcExpr {
        core::if_(Smid::default(), c, t, e)
    }

    pub fn seq(statements: Vec<RcExpr>) -> RcExpr {
        core::seq(Smid::default(), statements)
    }

    pub fn block(call: RcExpr, params: Params, body: Option<RcExpr>) -> RcExpr {
        core::block(Smid::default(), call, params, body)
    }

    pub fn lambda() -> RcExpr {
        core::lambda(Smid::default())
    }

    pub fn def<T: AsRef<str>>(name: T, params: Params, body: Option<RcExpr>) -> RcExpr {
        core::def(Smid::default(), name, params, body)
    }

    pub fn alias<T: AsRef<str>, U: AsRef<str>>(new: T, old: U) -> RcExpr {
        core::alias(Smid::default(), new, old)
    }

    pub fn module<T: AsRef<str>>(name: T, body: Vec<RcExpr>) -> RcExpr {
        core::module(Smid::default(), name, body)
    }

    pub fn await_(e: RcExpr) -> RcExpr {
        core::await_(Smid::default(), e)
    }

    pub fn async_fn(params: Params, body: RcExpr) -> RcExpr {
        core::async_fn(Smid::default(), params, body)
    }

    pub fn directive(directive: Directive) -> RcExpr {
        core::directive(Smid::default(), directive)
    }

    /// Positional parameter
    pub fn arg<T: AsRef<str>>(name: T) -> Param {
        Param::new(ParamKind::Positional, name)
    }
}

#[cfg(test)]
pub mod tests {
    use super::acore::*;
    use super::*;

    #[test]
    pub fn test_walk_preserves_shape_and_smid() {
        let smid = Smid::fake(3);
        let original = core::send_shaped(
            smid,
            None,
            "touch",
            vec![acore::lvar("x")],
            CallShape::Bare,
        );
        let walked = original.walk(&|e| e);
        assert_eq!(walked, original);
        assert_eq!(walked.smid(), smid);
    }

    #[test]
    pub fn test_walk_maps_children() {
        let original = seq(vec![lvar("a"), call("b", vec![lvar("c")])]);
        let renamed = original.walk(&|e| match &*e.inner {
            Expr::LocalVar(s, _) => core::lvar(*s, "z"),
            _ => e.clone(),
        });
        assert_eq!(renamed, seq(vec![lvar("z"), call("b", vec![lvar("c")])]));
    }

    #[test]
    pub fn test_statements_flatten_nested_sequences() {
        let body = seq(vec![seq(vec![lvar("a")]), lvar("b"), seq(vec![lvar("c")])]);
        assert_eq!(body.statements(), vec![lvar("a"), lvar("b"), lvar("c")]);
        assert_eq!(lvar("a").statements(), vec![lvar("a")]);
    }

    #[test]
    pub fn test_sequence_reassembly() {
        assert_eq!(RcExpr::sequence(Smid::default(), vec![]), None);
        assert_eq!(
            RcExpr::sequence(Smid::default(), vec![lvar("a")]),
            Some(lvar("a"))
        );
        assert_eq!(
            RcExpr::sequence(Smid::default(), vec![lvar("a"), lvar("b")]),
            Some(seq(vec![lvar("a"), lvar("b")]))
        );
    }

    #[test]
    pub fn test_visit_reaches_params_and_body() {
        let d = def(
            "f",
            vec![arg("a").with_default(call("fallback", vec![]))],
            Some(lvar("a")),
        );
        let mut seen = vec![];
        d.visit(&mut |e| seen.push(e.clone()));
        assert_eq!(seen, vec![call("fallback", vec![]), lvar("a")]);
    }

    #[test]
    pub fn test_extract_names() {
        let single: Option<Vec<String>> = sym("draft").extract();
        assert_eq!(single, Some(vec!["draft".to_string()]));

        let many: Option<Vec<String>> = array(vec![sym("a"), str("b")]).extract();
        assert_eq!(many, Some(vec!["a".to_string(), "b".to_string()]));

        let bad: Option<Vec<String>> = array(vec![sym("a"), lvar("b")]).extract();
        assert_eq!(bad, None);
    }

    #[test]
    pub fn test_const_path() {
        assert_eq!(
            const_path(&["ActiveSupport", "Concern"]),
            core::const_(
                Smid::default(),
                Some(core::const_(Smid::default(), None, "ActiveSupport")),
                "Concern"
            )
        );
    }
}
