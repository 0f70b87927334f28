//! Arena node model for the Jsonnet AST.
//!
//! Every node lives in a per-document `Vec` and is addressed by [`NodeId`];
//! `parent`, variable-reference links, and scope ownership are ids, never
//! owning pointers, so the cyclic shape of the semantic graph (parent links,
//! `VarRef → Var → references`) stays representable without `Rc` cycles.

use lsp_types::Range;

use crate::scope::ScopeId;

/// Stable index of a node inside its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Binary operators, in Jsonnet surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Multiply,
    Divide,
    Modulo,
    Plus,
    Minus,
    ShiftLeft,
    ShiftRight,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl Operator {
    /// Map an operator token to its variant. `None` for tokens outside the
    /// Jsonnet operator set (the grammar admits some extensions).
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "%" => Self::Modulo,
            "+" => Self::Plus,
            "-" => Self::Minus,
            "<<" => Self::ShiftLeft,
            ">>" => Self::ShiftRight,
            "<" => Self::Less,
            "<=" => Self::LessEq,
            ">" => Self::Greater,
            ">=" => Self::GreaterEq,
            "in" => Self::In,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "&" => Self::BitAnd,
            "^" => Self::BitXor,
            "|" => Self::BitOr,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::In => "in",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::BitAnd => "&",
            Self::BitXor => "^",
            Self::BitOr => "|",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "-" => Self::Minus,
            "+" => Self::Plus,
            "!" => Self::Not,
            "~" => Self::BitNot,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minus => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "~",
        }
    }
}

/// Field visibility markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Default,
    Hidden,
    Forced,
}

impl Visibility {
    pub fn from_token(token: &str) -> Self {
        match token {
            "::" => Self::Hidden,
            ":::" => Self::Forced,
            _ => Self::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => ":",
            Self::Hidden => "::",
            Self::Forced => ":::",
        }
    }
}

/// The three import forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import`: the importee is a Jsonnet document.
    Default,
    /// `importstr`: the importee is opaque text.
    Str,
    /// `importbin`: the importee is opaque bytes.
    Bin,
}

/// The closed set of AST shapes.
///
/// Expression variants mirror the Jsonnet surface language; the remaining
/// variants (`Bind`, `Param`, `Arg`, `Field`, keys, specs, `Assert`) are
/// structural helpers that still occupy arena slots so that `node_at` can
/// land on binders and keys.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Root of a parsed file; wraps the body expression.
    Document { body: NodeId },

    Num { value: f64 },
    /// Raw string content between the delimiters; escapes are not processed
    /// and text blocks are not dedented. Providers compare on `raw`.
    Str { raw: String },
    Bool { value: bool },
    Null,

    /// Binding site of a local, parameter, or for-spec variable.
    Var { name: String, references: Vec<NodeId> },
    /// Usage of a variable. `scope` is the variable scope active at the
    /// reference; `target` is the linked [`NodeKind::Var`] when resolution
    /// succeeded.
    VarRef {
        name: String,
        scope: Option<ScopeId>,
        target: Option<NodeId>,
    },
    /// A field key identifier (the `f` in `{ f: 1 }`).
    FieldId { name: String },
    /// A field usage (the `f` in `o.f`).
    FieldRef { name: String },
    /// The name of a named call argument (the `p` in `f(p = 1)`).
    ParamRef { name: String },

    Array { values: Vec<NodeId> },
    Object {
        binds: Vec<NodeId>,
        asserts: Vec<NodeId>,
        fields: Vec<NodeId>,
    },
    /// Object comprehension: exactly one computed-key field plus specs.
    ObjComp {
        field: NodeId,
        binds: Vec<NodeId>,
        asserts: Vec<NodeId>,
        for_spec: NodeId,
        comp_spec: Vec<NodeId>,
    },

    Local { binds: Vec<NodeId>, body: NodeId },
    If {
        condition: NodeId,
        consequence: NodeId,
        alternative: Option<NodeId>,
    },
    AssertExpr { assertion: NodeId, body: NodeId },
    Fn { params: Vec<NodeId>, body: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    ListComp {
        expr: NodeId,
        for_spec: NodeId,
        comp_spec: Vec<NodeId>,
    },
    Slice {
        target: NodeId,
        begin: Option<NodeId>,
        end: Option<NodeId>,
        step: Option<NodeId>,
    },
    FieldAccess { target: NodeId, field: NodeId },
    Binary {
        op: Operator,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary { op: UnaryOp, operand: NodeId },

    SelfRef,
    Super,
    Dollar,

    Import { kind: ImportKind, path: NodeId },

    // ---- structural helpers
    Bind { id: NodeId, value: NodeId },
    Param { id: NodeId, default: Option<NodeId> },
    Arg { value: NodeId, name: Option<NodeId> },
    Field {
        key: NodeId,
        value: NodeId,
        visibility: Visibility,
        inherited: bool,
    },
    FixedKey { id: NodeId },
    ComputedKey { expr: NodeId },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    ForSpec { id: NodeId, source: NodeId },
    IfSpec { condition: NodeId },

    /// Catch-all for CST shapes we cannot lower; traversal never aborts on
    /// it and providers skip it silently.
    Error { cst_kind: String },
}

impl NodeKind {
    /// Child ids in document order (used for parent wiring, `node_at`
    /// descent, and generic traversal).
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_children(&mut out);
        out
    }

    fn collect_children(&self, out: &mut Vec<NodeId>) {
        use NodeKind::*;
        match self {
            Document { body } => out.push(*body),
            Array { values } => out.extend(values),
            Object {
                binds,
                asserts,
                fields,
            } => {
                out.extend(binds);
                out.extend(asserts);
                out.extend(fields);
            }
            ObjComp {
                field,
                binds,
                asserts,
                for_spec,
                comp_spec,
            } => {
                out.push(*field);
                out.extend(binds);
                out.extend(asserts);
                out.push(*for_spec);
                out.extend(comp_spec);
            }
            Local { binds, body } => {
                out.extend(binds);
                out.push(*body);
            }
            If {
                condition,
                consequence,
                alternative,
            } => {
                out.push(*condition);
                out.push(*consequence);
                out.extend(alternative);
            }
            AssertExpr { assertion, body } => {
                out.push(*assertion);
                out.push(*body);
            }
            Fn { params, body } => {
                out.extend(params);
                out.push(*body);
            }
            Call { callee, args } => {
                out.push(*callee);
                out.extend(args);
            }
            ListComp {
                expr,
                for_spec,
                comp_spec,
            } => {
                out.push(*expr);
                out.push(*for_spec);
                out.extend(comp_spec);
            }
            Slice {
                target,
                begin,
                end,
                step,
            } => {
                out.push(*target);
                out.extend(begin);
                out.extend(end);
                out.extend(step);
            }
            FieldAccess { target, field } => {
                out.push(*target);
                out.push(*field);
            }
            Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Unary { operand, .. } => out.push(*operand),
            Import { path, .. } => out.push(*path),
            Bind { id, value } => {
                out.push(*id);
                out.push(*value);
            }
            Param { id, default } => {
                out.push(*id);
                out.extend(default);
            }
            Arg { value, name } => {
                out.push(*value);
                out.extend(name);
            }
            Field { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            FixedKey { id } => out.push(*id),
            ComputedKey { expr } => out.push(*expr),
            Assert { condition, message } => {
                out.push(*condition);
                out.extend(message);
            }
            ForSpec { id, source } => {
                out.push(*id);
                out.push(*source);
            }
            IfSpec { condition } => out.push(*condition),
            Num { .. } | Str { .. } | Bool { .. } | Null | Var { .. } | VarRef { .. }
            | FieldId { .. } | FieldRef { .. } | ParamRef { .. } | SelfRef | Super | Dollar
            | Error { .. } => {}
        }
    }

    /// Short variant name for the tree printers.
    pub fn name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Document { .. } => "Document",
            Num { .. } => "Num",
            Str { .. } => "Str",
            Bool { .. } => "Bool",
            Null => "Null",
            Var { .. } => "Var",
            VarRef { .. } => "VarRef",
            FieldId { .. } => "FieldId",
            FieldRef { .. } => "FieldRef",
            ParamRef { .. } => "ParamRef",
            Array { .. } => "Array",
            Object { .. } => "Object",
            ObjComp { .. } => "ObjComp",
            Local { .. } => "Local",
            If { .. } => "If",
            AssertExpr { .. } => "AssertExpr",
            Fn { .. } => "Fn",
            Call { .. } => "Call",
            ListComp { .. } => "ListComp",
            Slice { .. } => "Slice",
            FieldAccess { .. } => "FieldAccess",
            Binary { .. } => "Binary",
            Unary { .. } => "Unary",
            SelfRef => "Self",
            Super => "Super",
            Dollar => "Dollar",
            Import { .. } => "Import",
            Bind { .. } => "Bind",
            Param { .. } => "Param",
            Arg { .. } => "Arg",
            Field { .. } => "Field",
            FixedKey { .. } => "FixedKey",
            ComputedKey { .. } => "ComputedKey",
            Assert { .. } => "Assert",
            ForSpec { .. } => "ForSpec",
            IfSpec { .. } => "IfSpec",
            Error { .. } => "Error",
        }
    }
}

/// One arena slot: a node's range, its parent (wired right after
/// construction), and the variant payload.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub range: Range,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}
