//! Scrape declarations out of a mixin module's top-level statements
//! prior to rewriting.
//!
//! Declarative statements (accessor generators, aliases, association
//! and enum declarations, lifecycle hooks) are resolved into plain
//! method definitions or removed, and the facts they declare are
//! gathered into a `SideTable` for the rewriting pass to consult.
use crate::common::sourcemap::Smid;
use crate::core::config::RewriteConfig;
use crate::core::expr::*;
use crate::core::names;
use indexmap::{IndexMap, IndexSet};

/// The cardinality and loading behaviour of an association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// To-many
    Plural,
    /// To-one, loaded with the owner
    Singular,
    /// To-one whose accessor returns a placeholder until loaded
    LazySingle,
}

impl AssociationKind {
    pub fn name(&self) -> &'static str {
        match self {
            AssociationKind::Plural => "plural",
            AssociationKind::Singular => "singular",
            AssociationKind::LazySingle => "lazy_single",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plural" => Some(AssociationKind::Plural),
            "singular" => Some(AssociationKind::Singular),
            "lazy_single" => Some(AssociationKind::LazySingle),
            _ => None,
        }
    }
}

/// A declared enum value of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub field: String,
    pub value: String,
}

/// Facts discovered about a single mixin module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideTable {
    /// Associations by name
    pub associations: IndexMap<String, AssociationKind>,
    /// Associations requiring loaded-flag aware presence checks
    pub lazy_singles: IndexSet<String>,
    /// Synthetic `value!` calls and the update they stand for
    pub enum_updaters: IndexMap<String, EnumValue>,
    /// Synthetic `value?` calls and the comparison they stand for
    pub enum_predicates: IndexMap<String, EnumValue>,
    /// Named scopes declared in hooks
    pub scopes: Vec<String>,
    /// Methods under a private or protected visibility marker
    pub private_methods: IndexSet<String>,
}

impl SideTable {
    pub fn is_lazy_single(&self, name: &str) -> bool {
        self.lazy_singles.contains(name)
    }

    pub fn enum_updater(&self, name: &str) -> Option<&EnumValue> {
        self.enum_updaters.get(name)
    }

    pub fn enum_predicate(&self, name: &str) -> Option<&EnumValue> {
        self.enum_predicates.get(name)
    }

    fn record_association(&mut self, name: String, kind: AssociationKind) {
        if kind == AssociationKind::LazySingle {
            self.lazy_singles.insert(name.clone());
        }
        self.associations.insert(name, kind);
    }

    fn record_enum(&mut self, field: &str, values: Vec<String>) {
        for value in values {
            let entry = EnumValue {
                field: field.to_string(),
                value: value.clone(),
            };
            self.enum_predicates
                .insert(format!("{}?", value), entry.clone());
            self.enum_updaters.insert(format!("{}!", value), entry);
        }
    }
}

/// The cleaned statement list and the facts gathered from it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub statements: Vec<RcExpr>,
    pub table: SideTable,
}

impl Extraction {
    /// Names of the methods the module defines, in order
    pub fn method_names(&self) -> Vec<String> {
        self.statements
            .iter()
            .filter_map(|s| match &*s.inner {
                Expr::Def(_, name, _, _) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// True if the statement marks the module as a mixin
/// (`extend ActiveSupport::Concern`)
pub fn is_marker(stmt: &RcExpr, config: &RewriteConfig) -> bool {
    match stmt.inner.implicit_call() {
        Some((name, [arg])) if name == config.marker_call => match &*arg.inner {
            Expr::Const(_, Some(scope), inner) => match &*scope.inner {
                Expr::Const(_, None, outer) => {
                    (outer, inner) == (&config.marker_constant.0, &config.marker_constant.1)
                }
                _ => false,
            },
            _ => false,
        },
        _ => false,
    }
}

/// Scan the module's top-level statements. Returns `None` if the
/// module carries no composition marker and so is not a mixin.
pub fn extract(statements: &[RcExpr], config: &RewriteConfig) -> Option<Extraction> {
    let flattened: Vec<RcExpr> = statements.iter().flat_map(|s| s.statements()).collect();

    if !flattened.iter().any(|s| is_marker(s, config)) {
        return None;
    }

    let mut extractor = Extractor::new(config);
    for stmt in &flattened {
        extractor.statement(stmt);
    }
    Some(extractor.finish())
}

/// Extraction state for one module
struct Extractor<'a> {
    config: &'a RewriteConfig,
    /// Cleaned statements
    statements: Vec<RcExpr>,
    /// Facts gathered so far
    table: SideTable,
    /// True after a bare `private` or `protected`
    private_section: bool,
}

impl<'a> Extractor<'a> {
    fn new(config: &'a RewriteConfig) -> Self {
        Extractor {
            config,
            statements: vec![],
            table: SideTable::default(),
            private_section: false,
        }
    }

    fn finish(self) -> Extraction {
        Extraction {
            statements: self.statements,
            table: self.table,
        }
    }

    fn keep(&mut self, stmt: RcExpr) {
        if let Expr::Def(_, name, _, _) = &*stmt.inner {
            if self.private_section {
                self.table.private_methods.insert(name.clone());
            }
        }
        self.statements.push(stmt);
    }

    fn statement(&mut self, stmt: &RcExpr) {
        match &*stmt.inner {
            Expr::Send(s, None, name, args, _) => self.declaration(stmt, *s, name, args),
            Expr::Block(_, call, _, body) if self.is_hook_call(call) => {
                if let Some(body) = body {
                    self.hook(body);
                }
            }
            Expr::Alias(s, new, old) => self.alias(*s, new, old),
            _ => self.keep(stmt.clone()),
        }
    }

    fn is_hook_call(&self, call: &RcExpr) -> bool {
        matches!(call.inner.implicit_call(), Some((name, [])) if self.config.is_hook(name))
    }

    /// Classify an implicit-receiver call at the top level of the
    /// module.
    fn declaration(&mut self, stmt: &RcExpr, smid: Smid, name: &str, args: &[RcExpr]) {
        if is_marker(stmt, self.config) {
            return;
        }

        match name {
            "attr_accessor" => self.accessors(smid, args, true, true),
            "attr_reader" => self.accessors(smid, args, true, false),
            "attr_writer" => self.accessors(smid, args, false, true),
            "alias_method" => match args {
                [new, old] => {
                    let new: Option<String> = new.extract();
                    let old: Option<String> = old.extract();
                    match (new, old) {
                        (Some(new), Some(old)) => self.alias(smid, &new, &old),
                        _ => self.keep(stmt.clone()),
                    }
                }
                _ => self.keep(stmt.clone()),
            },
            "private" | "protected" | "public" => self.visibility(stmt, name, args),
            _ => {
                if !self.scan_declaration(name, args) && !self.config.is_dropped(name) {
                    self.keep(stmt.clone());
                }
            }
        }
    }

    /// Record association, scope and enum declarations. Returns true
    /// if the call was one of these.
    fn scan_declaration(&mut self, name: &str, args: &[RcExpr]) -> bool {
        if let Some(kind) = self.config.association_kind(name) {
            if let Some(assoc) = args.first().and_then(|a| a.extract()) {
                self.table.record_association(assoc, kind);
            }
            return true;
        }

        match name {
            "scope" => {
                if let Some(scope) = args.first().and_then(|a| a.extract()) {
                    self.table.scopes.push(scope);
                }
                true
            }
            "enum" => {
                self.enum_declaration(args);
                true
            }
            _ => false,
        }
    }

    /// Scan a lifecycle hook body one level deep; anything other than
    /// a recognised declaration is discarded with the hook.
    fn hook(&mut self, body: &RcExpr) {
        for stmt in body.statements() {
            if let Some((name, args)) = stmt.inner.implicit_call() {
                self.scan_declaration(name, args);
            }
        }
    }

    /// Accept `enum :status, [:draft, :published]`,
    /// `enum :status, { draft: 0, ... }` and `enum status: { ... }`
    fn enum_declaration(&mut self, args: &[RcExpr]) {
        let field: Option<String> = args.first().and_then(|a| a.extract());

        match (field, args.get(1)) {
            (Some(field), Some(values)) => {
                if let Some(values) = enum_values(values) {
                    self.table.record_enum(&field, values);
                }
            }
            _ => {
                if let Some(Expr::Hash(_, pairs)) = args.first().map(|a| &*a.inner) {
                    for (k, v) in pairs {
                        let field: Option<String> = k.extract();
                        if let (Some(field), Some(values)) = (field, enum_values(v)) {
                            self.table.record_enum(&field, values);
                        }
                    }
                }
            }
        }
    }

    fn accessors(&mut self, smid: Smid, args: &[RcExpr], reader: bool, writer: bool) {
        for attr in args.iter().filter_map(|a| -> Option<String> { a.extract() }) {
            if reader {
                self.keep(core::def(
                    smid,
                    &attr,
                    vec![],
                    Some(core::field(smid, &attr)),
                ));
            }
            if writer {
                self.keep(core::def(
                    smid,
                    format!("{}=", attr),
                    vec![Param::new(ParamKind::Positional, "value")],
                    Some(core::fasgn(smid, &attr, core::lvar(smid, "value"))),
                ));
            }
        }
    }

    /// Expand an alias to a forwarding method unless the names differ
    /// only by a trailing marker
    fn alias(&mut self, smid: Smid, new: &str, old: &str) {
        if names::differ_only_by_marker(new, old) {
            return;
        }

        let forward = core::send_shaped(
            smid,
            None,
            old,
            vec![core::splat(smid, core::lvar(smid, "args"))],
            CallShape::Parens,
        );
        self.keep(core::def(
            smid,
            new,
            vec![Param::new(ParamKind::Rest, "args")],
            Some(forward),
        ));
    }

    /// Bare markers are kept and open a section; markers naming
    /// methods are dropped after recording the names. Inline
    /// definitions (`private def x`) are kept.
    fn visibility(&mut self, stmt: &RcExpr, name: &str, args: &[RcExpr]) {
        let private = name != "public";

        if args.is_empty() {
            self.private_section = private;
            self.statements.push(stmt.clone());
            return;
        }

        for arg in args {
            match &*arg.inner {
                Expr::Def(_, method, _, _) => {
                    if private {
                        self.table.private_methods.insert(method.clone());
                    }
                    self.statements.push(arg.clone());
                }
                _ => {
                    let names: Option<Vec<String>> = arg.extract();
                    for method in names.unwrap_or_default() {
                        if private {
                            self.table.private_methods.insert(method);
                        } else {
                            self.table.private_methods.shift_remove(&method);
                        }
                    }
                }
            }
        }
    }
}

/// Value names from an array of names or the keys of a hash
fn enum_values(expr: &RcExpr) -> Option<Vec<String>> {
    match &*expr.inner {
        Expr::Array(_, _) => expr.extract(),
        Expr::Hash(_, pairs) => pairs.iter().map(|(k, _)| k.extract()).collect(),
        _ => None,
    }
}
