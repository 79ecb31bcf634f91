//! Abstract syntax tree: a tagged-variant tree with position metadata.
//!
//! The tree is pure (no back-pointers, no cycles); children are exclusively
//! owned by their parents. Emission over the tree lives in the codegen
//! crate as an exhaustive match, so unsupported constructs surface as
//! explicit diagnostics rather than silent nulls.

use std::fmt::Write;

use crate::token::{Pos, TokenKind};

/// One AST node: a kind plus the source position it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Pos,
}

impl Node {
    pub fn new(kind: NodeKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    /// Human-readable indented dump, for `--dump-ast`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match &self.kind {
            NodeKind::Identifier { name, index } => {
                let _ = writeln!(out, "{pad}identifier {name}");
                if let Some(index) = index {
                    index.write_into(out, depth + 1);
                }
            }
            NodeKind::Integer { value, bits } => {
                let _ = writeln!(out, "{pad}integer {value} (i{bits})");
            }
            NodeKind::Float { value } => {
                let _ = writeln!(out, "{pad}float {value}");
            }
            NodeKind::Str { text } => {
                let _ = writeln!(out, "{pad}string {text:?}");
            }
            NodeKind::BinOp { op, lhs, rhs } => {
                let _ = writeln!(out, "{pad}binop {}", op.name());
                lhs.write_into(out, depth + 1);
                rhs.write_into(out, depth + 1);
            }
            NodeKind::UnOp { op, expr } => {
                let _ = writeln!(out, "{pad}unop {}", op.name());
                expr.write_into(out, depth + 1);
            }
            NodeKind::Ref {
                expr,
                is_deref,
                depth: ref_depth,
            } => {
                if *is_deref {
                    let _ = writeln!(out, "{pad}deref x{ref_depth}");
                } else {
                    let _ = writeln!(out, "{pad}addr-of");
                }
                expr.write_into(out, depth + 1);
            }
            NodeKind::Alloc(decl) => {
                decl.write_into(out, depth);
            }
            NodeKind::Assign { target, value } => {
                let _ = writeln!(out, "{pad}assign");
                match target {
                    AssignTarget::Ident { name, index, .. } => {
                        let _ = writeln!(out, "{pad}  target {name}");
                        if let Some(index) = index {
                            index.write_into(out, depth + 2);
                        }
                    }
                    AssignTarget::Alloc(decl) => decl.write_into(out, depth + 1),
                }
                value.write_into(out, depth + 1);
            }
            NodeKind::Block { stmts } => {
                let _ = writeln!(out, "{pad}block");
                for stmt in stmts {
                    stmt.write_into(out, depth + 1);
                }
            }
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let _ = writeln!(out, "{pad}if");
                cond.write_into(out, depth + 1);
                then_body.write_into(out, depth + 1);
                if let Some(else_body) = else_body {
                    let _ = writeln!(out, "{pad}else");
                    else_body.write_into(out, depth + 1);
                }
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                let _ = writeln!(out, "{pad}for");
                for clause in [init, cond, update].into_iter().flatten() {
                    clause.write_into(out, depth + 1);
                }
                body.write_into(out, depth + 1);
            }
            NodeKind::Call { callee, args } => {
                let _ = writeln!(out, "{pad}call {callee}");
                for arg in args {
                    arg.write_into(out, depth + 1);
                }
            }
            NodeKind::Prototype(proto) => {
                let vararg = if proto.is_varargs { " ..." } else { "" };
                let _ = writeln!(
                    out,
                    "{pad}prototype {} {}{vararg}",
                    proto.ret.type_name, proto.name
                );
                for param in &proto.params {
                    param.write_into(out, depth + 1);
                }
                if let Some(body) = &proto.body {
                    body.write_into(out, depth + 1);
                }
            }
            NodeKind::Return { expr } => {
                let _ = writeln!(out, "{pad}return");
                if let Some(expr) = expr {
                    expr.write_into(out, depth + 1);
                }
            }
            NodeKind::Struct { name, fields } => {
                let _ = writeln!(out, "{pad}struct {name}");
                for field in fields {
                    field.write_into(out, depth + 1);
                }
            }
            NodeKind::Typedef { alloc } => {
                let _ = writeln!(out, "{pad}typedef {} = {}", alloc.name, alloc.type_name);
            }
        }
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Variable use, optionally indexed.
    Identifier {
        name: String,
        index: Option<Box<Node>>,
    },
    /// Integer literal; `bits` is 8 (char literal) or 32.
    Integer { value: i64, bits: u32 },
    Float { value: f64 },
    /// String literal; materializes as a null-terminated global byte array.
    Str { text: String },
    BinOp {
        op: TokenKind,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    UnOp { op: TokenKind, expr: Box<Node> },
    /// `&expr` when `is_deref` is false; `*…*expr` with the run length in
    /// `depth` when true.
    Ref {
        expr: Box<Node>,
        is_deref: bool,
        depth: usize,
    },
    /// Variable declaration.
    Alloc(AllocDecl),
    Assign {
        target: AssignTarget,
        value: Box<Node>,
    },
    /// Ordered statements; introduces a scope.
    Block { stmts: Vec<Node> },
    If {
        cond: Box<Node>,
        then_body: Box<Node>,
        else_body: Option<Box<Node>>,
    },
    /// Classic three-part loop; every clause may be absent.
    For {
        init: Option<Box<Node>>,
        cond: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    Call { callee: String, args: Vec<Node> },
    /// Function declaration or definition; `body` absent means a forward
    /// declaration. A present body is always a `Block`.
    Prototype(Prototype),
    Return { expr: Option<Box<Node>> },
    /// Struct type definition with an ordered field list.
    Struct {
        name: String,
        fields: Vec<AllocDecl>,
    },
    /// Introduces `alloc.name` as an alias of `alloc.type_name`.
    Typedef { alloc: AllocDecl },
}

/// A declaration: type name, zero or more `*`, declared name, and an
/// optional array extent.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocDecl {
    pub type_name: String,
    pub name: String,
    pub ptr_depth: usize,
    pub array_len: Option<Box<Node>>,
    pub pos: Pos,
}

impl AllocDecl {
    fn write_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let stars = "*".repeat(self.ptr_depth);
        let _ = writeln!(out, "{pad}alloc {}{stars} {}", self.type_name, self.name);
        if let Some(len) = &self.array_len {
            len.write_into(out, depth + 1);
        }
    }
}

/// Assignment target: exactly an identifier (possibly indexed) or a fresh
/// declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Ident {
        name: String,
        index: Option<Box<Node>>,
        pos: Pos,
    },
    Alloc(AllocDecl),
}

/// Function signature plus optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    /// Return type, expressed as the declaration that introduced the name.
    pub ret: AllocDecl,
    pub name: String,
    pub params: Vec<AllocDecl>,
    pub is_varargs: bool,
    pub body: Option<Box<Node>>,
}
