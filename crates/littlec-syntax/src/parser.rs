//! Recursive-descent parser: token sequence in, AST out.
//!
//! Declarations and expressions are disambiguated through a mutable set of
//! declared type names, seeded with the primitives and extended at parse
//! time by `typedef` and struct definitions. An identifier followed by
//! another identifier, or by `*` when the first names a declared type,
//! starts a declaration.

use std::collections::HashSet;

use crate::ast::{AllocDecl, AssignTarget, Node, NodeKind, Prototype};
use crate::error::SyntaxError;
use crate::token::{Payload, Pos, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    declared_types: HashSet<String>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let pos = tokens.last().map(|t| t.pos).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, pos));
        }
        let declared_types = ["void", "char", "short", "int", "long", "float", "double"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            tokens,
            current: 0,
            declared_types,
        }
    }

    /// Parse the whole token stream into a root block.
    pub fn parse(mut self) -> Result<Node, SyntaxError> {
        let root = self.parse_block()?;
        if !self.at_end() {
            return Err(SyntaxError::UnexpectedToken {
                expected: TokenKind::Eof.name(),
                found: self.peek().kind.name(),
                context: "expected a statement",
                pos: self.peek().pos,
            });
        }
        Ok(root)
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.at_end() {
            self.current += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind, context: &'static str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::UnexpectedToken {
                expected: kind.name(),
                found: self.peek().kind.name(),
                context,
                pos: self.peek().pos,
            })
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.peek().pos;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }
        Ok(Node::new(NodeKind::Block { stmts }, pos))
    }

    fn parse_statement(&mut self) -> Result<Node, SyntaxError> {
        if self.check(TokenKind::If) {
            self.advance();
            return self.parse_if();
        }
        if self.check(TokenKind::For) {
            self.advance();
            return self.parse_for();
        }
        if self.check(TokenKind::Return) {
            self.advance();
            return self.parse_return();
        }

        let expr = self.parse_expression()?;
        if semicolon_required(&expr) {
            self.consume(
                TokenKind::Semicolon,
                "expected semicolon after expression statement",
            )?;
        }
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Node, SyntaxError> {
        let if_pos = self.previous().pos;
        self.consume(
            TokenKind::LParen,
            "expected left parenthesis before condition",
        )?;
        let cond = self.parse_or()?;
        self.consume(
            TokenKind::RParen,
            "expected right parenthesis after condition",
        )?;

        let then_body = self.parse_body()?;

        let else_body = if self.check(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_body()?))
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::If {
                cond: Box::new(cond),
                then_body: Box::new(then_body),
                else_body,
            },
            if_pos,
        ))
    }

    fn parse_for(&mut self) -> Result<Node, SyntaxError> {
        let for_pos = self.previous().pos;
        self.consume(TokenKind::LParen, "expected left parenthesis after for")?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume(TokenKind::Semicolon, "expected semicolon after initializer")?;

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume(TokenKind::Semicolon, "expected semicolon after condition")?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume(TokenKind::RParen, "expected right parenthesis after update")?;

        let body = self.parse_body()?;

        Ok(Node::new(
            NodeKind::For {
                init,
                cond,
                update,
                body: Box::new(body),
            },
            for_pos,
        ))
    }

    /// A statement body: any expression; a non-block body requires `;`.
    fn parse_body(&mut self) -> Result<Node, SyntaxError> {
        let body = self.parse_expression()?;
        if !matches!(body.kind, NodeKind::Block { .. }) {
            self.consume(
                TokenKind::Semicolon,
                "expected semicolon after expression statement",
            )?;
        }
        Ok(body)
    }

    fn parse_return(&mut self) -> Result<Node, SyntaxError> {
        let return_pos = self.previous().pos;
        let expr = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            let expr = self.parse_or()?;
            self.consume(
                TokenKind::Semicolon,
                "expected semicolon after return statement",
            )?;
            Some(Box::new(expr))
        };
        Ok(Node::new(NodeKind::Return { expr }, return_pos))
    }

    // ------------------------------------------------------------------
    // Expressions (precedence ladder, lowest first)
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Node, SyntaxError> {
        let node = self.parse_or()?;

        if self.check(TokenKind::Eq) {
            let eq = self.advance();
            // Right-associative: `a = b = c` assigns `b = c` first.
            let value = self.parse_assignment()?;
            let target = match node.kind {
                NodeKind::Identifier { name, index } => AssignTarget::Ident {
                    name,
                    index,
                    pos: node.pos,
                },
                NodeKind::Alloc(decl) => AssignTarget::Alloc(decl),
                _ => return Err(SyntaxError::InvalidAssignTarget { pos: eq.pos }),
            };
            return Ok(Node::new(
                NodeKind::Assign {
                    target,
                    value: Box::new(value),
                },
                eq.pos,
            ));
        }

        Ok(node)
    }

    fn parse_binary(
        &mut self,
        ops: &[TokenKind],
        next: fn(&mut Self) -> Result<Node, SyntaxError>,
    ) -> Result<Node, SyntaxError> {
        let mut node = next(self)?;
        while ops.contains(&self.peek().kind) {
            let op = self.advance();
            let rhs = next(self)?;
            node = Node::new(
                NodeKind::BinOp {
                    op: op.kind,
                    lhs: Box::new(node),
                    rhs: Box::new(rhs),
                },
                op.pos,
            );
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(&[TokenKind::OrOr], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(&[TokenKind::AndAnd], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(&[TokenKind::BangEq, TokenKind::EqEq], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEq,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::Less,
                TokenKind::LessEq,
            ],
            Self::parse_term,
        )
    }

    fn parse_term(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(&[TokenKind::Plus, TokenKind::Minus], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> Result<Node, SyntaxError> {
        self.parse_binary(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Node, SyntaxError> {
        if self.check(TokenKind::Bang) || self.check(TokenKind::Minus) {
            let op = self.advance();
            let expr = self.parse_unary()?;
            return Ok(Node::new(
                NodeKind::UnOp {
                    op: op.kind,
                    expr: Box::new(expr),
                },
                op.pos,
            ));
        }

        if self.check(TokenKind::Star) {
            let star = self.advance();
            let mut depth = 1;
            while self.check(TokenKind::Star) {
                self.advance();
                depth += 1;
            }
            let expr = self.parse_unary()?;
            return Ok(Node::new(
                NodeKind::Ref {
                    expr: Box::new(expr),
                    is_deref: true,
                    depth,
                },
                star.pos,
            ));
        }

        if self.check(TokenKind::Amp) {
            let amp = self.advance();
            let expr = self.parse_unary()?;
            return Ok(Node::new(
                NodeKind::Ref {
                    expr: Box::new(expr),
                    is_deref: false,
                    depth: 0,
                },
                amp.pos,
            ));
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Node, SyntaxError> {
        let mut node = self.parse_primary()?;

        while self.check(TokenKind::LParen) {
            let lparen = self.advance();
            let callee = match node.kind {
                NodeKind::Identifier { name, .. } => name,
                _ => return Err(SyntaxError::InvalidCallTarget { pos: node.pos }),
            };

            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.parse_or()?);
                    if self.check(TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.consume(
                TokenKind::RParen,
                "expected right parenthesis after call arguments",
            )?;

            node = Node::new(NodeKind::Call { callee, args }, lparen.pos);
        }

        Ok(node)
    }

    // ------------------------------------------------------------------
    // Primary productions
    // ------------------------------------------------------------------

    fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        match self.peek().kind {
            TokenKind::Identifier => {
                let token = self.advance();
                let name = token.text().unwrap_or_default().to_string();

                if self.check(TokenKind::Identifier)
                    || (self.declared_types.contains(&name) && self.check(TokenKind::Star))
                {
                    return self.parse_alloc(name);
                }

                let index = if self.check(TokenKind::LBracket) {
                    self.advance();
                    let index = self.parse_or()?;
                    self.consume(
                        TokenKind::RBracket,
                        "expected right square bracket after index expression",
                    )?;
                    Some(Box::new(index))
                } else {
                    None
                };

                Ok(Node::new(NodeKind::Identifier { name, index }, token.pos))
            }
            TokenKind::Struct => {
                self.advance();
                self.parse_struct()
            }
            TokenKind::Typedef => {
                self.advance();
                self.parse_typedef()
            }
            TokenKind::Integer => {
                let token = self.advance();
                let value = match token.payload {
                    Payload::I32(v) => v as i64,
                    _ => 0,
                };
                Ok(Node::new(NodeKind::Integer { value, bits: 32 }, token.pos))
            }
            TokenKind::Char => {
                let token = self.advance();
                let value = match token.payload {
                    Payload::I8(v) => v as i64,
                    _ => 0,
                };
                Ok(Node::new(NodeKind::Integer { value, bits: 8 }, token.pos))
            }
            TokenKind::Float => {
                let token = self.advance();
                let value = match token.payload {
                    Payload::F64(v) => v,
                    _ => 0.0,
                };
                Ok(Node::new(NodeKind::Float { value }, token.pos))
            }
            TokenKind::Str => {
                let token = self.advance();
                let text = token.text().unwrap_or_default().to_string();
                Ok(Node::new(NodeKind::Str { text }, token.pos))
            }
            TokenKind::LBrace => {
                self.advance();
                let block = self.parse_block()?;
                self.consume(TokenKind::RBrace, "expected closing right brace")?;
                Ok(block)
            }
            _ => Err(SyntaxError::ExpectedExpression {
                pos: self.peek().pos,
            }),
        }
    }

    fn parse_struct(&mut self) -> Result<Node, SyntaxError> {
        let struct_pos = self.previous().pos;
        let name_token = self.consume(TokenKind::Identifier, "expected struct identifier")?;
        let name = name_token.text().unwrap_or_default().to_string();

        // `struct Tag name` declares a variable of the named struct type.
        if self.check(TokenKind::Identifier) {
            return self.parse_alloc(name);
        }

        self.consume(TokenKind::LBrace, "expected left brace")?;

        let mut fields = Vec::new();
        loop {
            let type_token = self.consume(TokenKind::Identifier, "expected field type")?;
            let type_name = type_token.text().unwrap_or_default().to_string();
            fields.push(self.parse_alloc_decl(type_name)?);
            self.consume(TokenKind::Semicolon, "expected semicolon after field")?;
            if self.check(TokenKind::RBrace) {
                break;
            }
        }
        self.consume(TokenKind::RBrace, "expected right brace")?;

        // The tag becomes usable as a declared type name from here on.
        self.declared_types.insert(name.clone());

        Ok(Node::new(NodeKind::Struct { name, fields }, struct_pos))
    }

    fn parse_typedef(&mut self) -> Result<Node, SyntaxError> {
        let typedef_pos = self.previous().pos;

        if self.check(TokenKind::Struct) {
            self.advance();
        }

        let type_token = self.consume(TokenKind::Identifier, "expected type name after typedef")?;
        let type_name = type_token.text().unwrap_or_default().to_string();
        let alloc = self.parse_alloc_decl(type_name)?;

        self.declared_types.insert(alloc.name.clone());

        Ok(Node::new(NodeKind::Typedef { alloc }, typedef_pos))
    }

    /// Declaration continuation after the type name; may grow into a
    /// prototype when a parameter list follows.
    fn parse_alloc(&mut self, type_name: String) -> Result<Node, SyntaxError> {
        let decl = self.parse_alloc_decl(type_name)?;

        if self.check(TokenKind::LParen) {
            self.advance();
            let name = decl.name.clone();
            let pos = decl.pos;
            return self.parse_prototype(decl, name, pos);
        }

        let pos = decl.pos;
        Ok(Node::new(NodeKind::Alloc(decl), pos))
    }

    /// The declaration itself: `'*'* name ('[' size ']')?`.
    fn parse_alloc_decl(&mut self, type_name: String) -> Result<AllocDecl, SyntaxError> {
        let mut name = String::new();
        let mut name_pos = self.peek().pos;
        let mut ptr_depth = 0;

        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            name = token.text().unwrap_or_default().to_string();
            name_pos = token.pos;
        }

        if self.check(TokenKind::Star) {
            while self.check(TokenKind::Star) {
                self.advance();
                ptr_depth += 1;
            }
            let token = self.consume(
                TokenKind::Identifier,
                "expected declaration name after pointer stars",
            )?;
            name = token.text().unwrap_or_default().to_string();
            name_pos = token.pos;
        }

        if name.is_empty() {
            return Err(SyntaxError::ExpectedName {
                pos: self.peek().pos,
            });
        }

        let array_len = if self.check(TokenKind::LBracket) {
            self.advance();
            let len = self.parse_or()?;
            self.consume(
                TokenKind::RBracket,
                "expected right square bracket after array size expression",
            )?;
            Some(Box::new(len))
        } else {
            None
        };

        Ok(AllocDecl {
            type_name,
            name,
            ptr_depth,
            array_len,
            pos: name_pos,
        })
    }

    fn parse_prototype(
        &mut self,
        ret: AllocDecl,
        name: String,
        pos: Pos,
    ) -> Result<Node, SyntaxError> {
        let mut params = Vec::new();
        let mut is_varargs = false;

        loop {
            if self.check(TokenKind::Identifier) {
                let type_token = self.advance();
                let type_name = type_token.text().unwrap_or_default().to_string();
                params.push(self.parse_alloc_decl(type_name)?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
            } else if self.check(TokenKind::Ellipsis) {
                is_varargs = true;
                self.advance();
            }
            break;
        }

        self.consume(
            TokenKind::RParen,
            "expected right parenthesis after parameter list",
        )?;

        let body = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            self.consume(TokenKind::LBrace, "expected left brace")?;
            let block = self.parse_block()?;
            self.consume(TokenKind::RBrace, "expected right brace")?;
            Some(Box::new(block))
        };

        Ok(Node::new(
            NodeKind::Prototype(Prototype {
                ret,
                name,
                params,
                is_varargs,
                body,
            }),
            pos,
        ))
    }
}

/// Prototypes and blocks are the only statements without a trailing `;`.
fn semicolon_required(node: &Node) -> bool {
    !matches!(
        node.kind,
        NodeKind::Prototype(_) | NodeKind::Block { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_src(source: &str) -> Node {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn parse_err(source: &str) -> SyntaxError {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    fn stmts(node: Node) -> Vec<Node> {
        match node.kind {
            NodeKind::Block { stmts } => stmts,
            other => panic!("expected root block, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_empty_block() {
        let root = parse_src("");
        assert_eq!(root.kind, NodeKind::Block { stmts: vec![] });
    }

    #[test]
    fn declaration_vs_expression() {
        let nodes = stmts(parse_src("int x; x;"));
        assert!(matches!(&nodes[0].kind, NodeKind::Alloc(d) if d.name == "x"));
        assert!(matches!(&nodes[1].kind, NodeKind::Identifier { name, .. } if name == "x"));
    }

    #[test]
    fn pointer_declaration_requires_declared_type() {
        let nodes = stmts(parse_src("int *p;"));
        assert!(matches!(&nodes[0].kind, NodeKind::Alloc(d) if d.ptr_depth == 1));

        // `foo` is not a declared type, so `foo * p` is a multiplication.
        let nodes = stmts(parse_src("foo * p;"));
        assert!(matches!(
            &nodes[0].kind,
            NodeKind::BinOp {
                op: TokenKind::Star,
                ..
            }
        ));
    }

    #[test]
    fn typedef_extends_declared_types() {
        let nodes = stmts(parse_src("typedef int Int32; Int32 *p;"));
        assert!(matches!(&nodes[0].kind, NodeKind::Typedef { alloc } if alloc.name == "Int32"));
        assert!(matches!(&nodes[1].kind, NodeKind::Alloc(d) if d.type_name == "Int32" && d.ptr_depth == 1));
    }

    #[test]
    fn typedef_struct_form() {
        let nodes = stmts(parse_src("typedef struct P Point;"));
        assert!(
            matches!(&nodes[0].kind, NodeKind::Typedef { alloc } if alloc.type_name == "P" && alloc.name == "Point")
        );
    }

    #[test]
    fn struct_definition_registers_tag_as_type() {
        let nodes = stmts(parse_src("struct P { int x; int y; }; P *q;"));
        match &nodes[0].kind {
            NodeKind::Struct { name, fields } => {
                assert_eq!(name, "P");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "x");
            }
            other => panic!("expected struct, got {other:?}"),
        }
        assert!(matches!(&nodes[1].kind, NodeKind::Alloc(d) if d.type_name == "P"));
    }

    #[test]
    fn struct_variable_declaration() {
        let nodes = stmts(parse_src("struct P q;"));
        assert!(matches!(&nodes[0].kind, NodeKind::Alloc(d) if d.type_name == "P" && d.name == "q"));
    }

    #[test]
    fn assignment_is_right_associative() {
        let nodes = stmts(parse_src("a = b = c;"));
        match &nodes[0].kind {
            NodeKind::Assign { target, value } => {
                assert!(matches!(target, AssignTarget::Ident { name, .. } if name == "a"));
                assert!(matches!(&value.kind, NodeKind::Assign { .. }));
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn declaration_with_initializer() {
        let nodes = stmts(parse_src("int x = 3;"));
        match &nodes[0].kind {
            NodeKind::Assign { target, value } => {
                assert!(matches!(target, AssignTarget::Alloc(d) if d.name == "x"));
                assert!(matches!(value.kind, NodeKind::Integer { value: 3, bits: 32 }));
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let nodes = stmts(parse_src("1 + 2 * 3;"));
        match &nodes[0].kind {
            NodeKind::BinOp { op, rhs, .. } => {
                assert_eq!(*op, TokenKind::Plus);
                assert!(matches!(
                    &rhs.kind,
                    NodeKind::BinOp {
                        op: TokenKind::Star,
                        ..
                    }
                ));
            }
            other => panic!("expected binop, got {other:?}"),
        }
    }

    #[test]
    fn comparison_over_additive() {
        let nodes = stmts(parse_src("a < b + 1;"));
        match &nodes[0].kind {
            NodeKind::BinOp { op, rhs, .. } => {
                assert_eq!(*op, TokenKind::Less);
                assert!(matches!(
                    &rhs.kind,
                    NodeKind::BinOp {
                        op: TokenKind::Plus,
                        ..
                    }
                ));
            }
            other => panic!("expected binop, got {other:?}"),
        }
    }

    #[test]
    fn deref_run_length_becomes_depth() {
        let nodes = stmts(parse_src("**p;"));
        assert!(matches!(
            &nodes[0].kind,
            NodeKind::Ref {
                is_deref: true,
                depth: 2,
                ..
            }
        ));
    }

    #[test]
    fn address_of_identifier() {
        let nodes = stmts(parse_src("&x;"));
        assert!(matches!(
            &nodes[0].kind,
            NodeKind::Ref {
                is_deref: false,
                depth: 0,
                ..
            }
        ));
    }

    #[test]
    fn unary_operators_parse() {
        let nodes = stmts(parse_src("!x; -1;"));
        assert!(matches!(
            &nodes[0].kind,
            NodeKind::UnOp {
                op: TokenKind::Bang,
                ..
            }
        ));
        assert!(matches!(
            &nodes[1].kind,
            NodeKind::UnOp {
                op: TokenKind::Minus,
                ..
            }
        ));
    }

    #[test]
    fn call_with_arguments() {
        let nodes = stmts(parse_src("f(1, x);"));
        match &nodes[0].kind {
            NodeKind::Call { callee, args } => {
                assert_eq!(callee, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn forward_declaration_and_varargs() {
        let nodes = stmts(parse_src("int printf(char *fmt, ...);"));
        match &nodes[0].kind {
            NodeKind::Prototype(proto) => {
                assert_eq!(proto.name, "printf");
                assert!(proto.is_varargs);
                assert!(proto.body.is_none());
                assert_eq!(proto.params.len(), 1);
                assert_eq!(proto.params[0].ptr_depth, 1);
            }
            other => panic!("expected prototype, got {other:?}"),
        }
    }

    #[test]
    fn function_definition_body_is_block() {
        let nodes = stmts(parse_src("int main() { return 0; }"));
        match &nodes[0].kind {
            NodeKind::Prototype(proto) => {
                assert_eq!(proto.name, "main");
                assert!(!proto.is_varargs);
                let body = proto.body.as_ref().unwrap();
                assert!(matches!(&body.kind, NodeKind::Block { stmts } if stmts.len() == 1));
            }
            other => panic!("expected prototype, got {other:?}"),
        }
    }

    #[test]
    fn pointer_return_type() {
        let nodes = stmts(parse_src("int *get() { return 0; }"));
        match &nodes[0].kind {
            NodeKind::Prototype(proto) => {
                assert_eq!(proto.ret.ptr_depth, 1);
                assert_eq!(proto.name, "get");
            }
            other => panic!("expected prototype, got {other:?}"),
        }
    }

    #[test]
    fn if_with_else() {
        let nodes = stmts(parse_src("if (x < 1) { } else { }"));
        match &nodes[0].kind {
            NodeKind::If { else_body, .. } => assert!(else_body.is_some()),
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn if_non_block_body_requires_semicolon() {
        assert!(matches!(
            parse_err("if (x) y = 1"),
            SyntaxError::UnexpectedToken { expected: ";", .. }
        ));
        let nodes = stmts(parse_src("if (x) y = 1;"));
        assert!(matches!(&nodes[0].kind, NodeKind::If { .. }));
    }

    #[test]
    fn for_with_all_clauses() {
        let nodes = stmts(parse_src("for (i = 0; i < 3; i = i + 1) { }"));
        match &nodes[0].kind {
            NodeKind::For {
                init,
                cond,
                update,
                ..
            } => {
                assert!(init.is_some());
                assert!(cond.is_some());
                assert!(update.is_some());
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn for_with_empty_clauses() {
        let nodes = stmts(parse_src("for (;;) { }"));
        match &nodes[0].kind {
            NodeKind::For {
                init,
                cond,
                update,
                ..
            } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(update.is_none());
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn array_declaration_and_indexing() {
        let nodes = stmts(parse_src("int a[4]; a[1] = 2; return a[0];"));
        assert!(matches!(&nodes[0].kind, NodeKind::Alloc(d) if d.array_len.is_some()));
        match &nodes[1].kind {
            NodeKind::Assign { target, .. } => {
                assert!(matches!(target, AssignTarget::Ident { index: Some(_), .. }));
            }
            other => panic!("expected assign, got {other:?}"),
        }
        match &nodes[2].kind {
            NodeKind::Return { expr: Some(expr) } => {
                assert!(matches!(&expr.kind, NodeKind::Identifier { index: Some(_), .. }));
            }
            other => panic!("expected return, got {other:?}"),
        }
    }

    #[test]
    fn return_without_value() {
        let nodes = stmts(parse_src("return;"));
        assert!(matches!(&nodes[0].kind, NodeKind::Return { expr: None }));
    }

    #[test]
    fn inline_block_is_a_statement() {
        let nodes = stmts(parse_src("{ int x; }"));
        assert!(matches!(&nodes[0].kind, NodeKind::Block { stmts } if stmts.len() == 1));
    }

    #[test]
    fn literals_parse() {
        let nodes = stmts(parse_src("'a'; 2.5; \"hi\";"));
        assert!(matches!(&nodes[0].kind, NodeKind::Integer { value: 97, bits: 8 }));
        assert!(matches!(&nodes[1].kind, NodeKind::Float { .. }));
        assert!(matches!(&nodes[2].kind, NodeKind::Str { text } if text == "hi"));
    }

    #[test]
    fn missing_semicolon_is_positioned() {
        let err = parse_err("int x");
        match err {
            SyntaxError::UnexpectedToken { expected, pos, .. } => {
                assert_eq!(expected, ";");
                assert_eq!((pos.row, pos.col), (0, 5));
            }
            other => panic!("expected token mismatch, got {other:?}"),
        }
    }

    #[test]
    fn stray_keyword_is_not_an_expression() {
        assert!(matches!(
            parse_err("while;"),
            SyntaxError::ExpectedExpression { .. }
        ));
    }

    #[test]
    fn call_target_must_be_identifier() {
        assert!(matches!(
            parse_err("1(2);"),
            SyntaxError::InvalidCallTarget { .. }
        ));
    }

    #[test]
    fn unnamed_parameter_is_rejected() {
        assert!(matches!(
            parse_err("int f(int) { return 0; }"),
            SyntaxError::ExpectedName { .. }
        ));
    }

    #[test]
    fn assignment_target_must_be_identifier_or_declaration() {
        assert!(matches!(
            parse_err("1 = 2;"),
            SyntaxError::InvalidAssignTarget { .. }
        ));
    }

    #[test]
    fn node_positions_track_tokens() {
        let nodes = stmts(parse_src("int x;\nint y;"));
        assert_eq!((nodes[0].pos.row, nodes[0].pos.col), (0, 4));
        assert_eq!((nodes[1].pos.row, nodes[1].pos.col), (1, 4));
    }
}
