//! IR generation: walks the AST and drives an inkwell builder.
//!
//! The [`Generator`] owns the module, the builder with its current
//! insertion block, the scope stack, and the flat type table. Emission is
//! one exhaustive match over node kinds, so constructs the emitter does not
//! support (`UnOp`, float literals, the `% // || &&` operators) surface as
//! positioned diagnostics instead of invalid IR.
//!
//! Conventions:
//! - Slots declared with `*` store the opaque pointer type; the declared
//!   pointee and depth live in scope-frame pointer metadata and drive load
//!   counts and GEP element types.
//! - Comparisons produce 1-bit values, consumed by condition contexts
//!   (which cast to i1); no implicit widening is performed.
//! - A body that already ended in a terminator never receives a trailing
//!   branch or implicit `ret void`.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, IntType, PointerType};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue};
use inkwell::{AddressSpace, IntPredicate};
use tracing::debug;

use littlec_syntax::{AllocDecl, AssignTarget, Node, NodeKind, Pos, Prototype, TokenKind};

use crate::error::CodegenError;
use crate::scope::{PointerInfo, ScopeStack, Slot, StructInfo};
use crate::types::{CType, TypeTable};

fn llvm(e: impl std::fmt::Display) -> CodegenError {
    CodegenError::Llvm(e.to_string())
}

pub struct Generator<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    scopes: ScopeStack<'ctx>,
    types: TypeTable<'ctx>,
}

impl<'ctx> Generator<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            scopes: ScopeStack::new(),
            types: TypeTable::new(context),
        }
    }

    /// Emit the whole program under a fresh global scope.
    pub fn generate(&mut self, root: &Node) -> Result<(), CodegenError> {
        self.scopes.push();
        self.emit(root)?;
        self.scopes.pop();
        Ok(())
    }

    /// Serialize the module to textual IR.
    pub fn ir_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Live scope frames; zero after a completed [`generate`](Self::generate).
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn emit(&mut self, node: &Node) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        match &node.kind {
            NodeKind::Identifier { name, index } => Ok(Some(self.emit_identifier(
                name,
                index.as_deref(),
                node.pos,
            )?)),
            NodeKind::Integer { value, bits } => Ok(Some(
                self.int_type(*bits).const_int(*value as u64, true).into(),
            )),
            NodeKind::Float { .. } => Err(CodegenError::Unsupported {
                what: "float literal".into(),
                pos: node.pos,
            }),
            NodeKind::Str { text } => Ok(Some(self.emit_string(text))),
            NodeKind::BinOp { op, lhs, rhs } => {
                Ok(Some(self.emit_binop(*op, lhs, rhs, node.pos)?))
            }
            NodeKind::UnOp { op, .. } => Err(CodegenError::Unsupported {
                what: format!("unary operator `{}`", op.name()),
                pos: node.pos,
            }),
            NodeKind::Ref { expr, is_deref, .. } => {
                Ok(Some(self.emit_ref(expr, *is_deref, node.pos)?))
            }
            NodeKind::Alloc(decl) => Ok(Some(self.emit_alloc(decl)?.ptr.into())),
            NodeKind::Assign { target, value } => {
                Ok(Some(self.emit_assign(target, value, node.pos)?))
            }
            NodeKind::Block { stmts } => {
                self.scopes.push();
                for stmt in stmts {
                    self.emit(stmt)?;
                }
                self.scopes.pop();
                Ok(None)
            }
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.emit_if(cond, then_body, else_body.as_deref(), node.pos)?;
                Ok(None)
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.emit_for(
                    init.as_deref(),
                    cond.as_deref(),
                    update.as_deref(),
                    body,
                    node.pos,
                )?;
                Ok(None)
            }
            NodeKind::Call { callee, args } => self.emit_call(callee, args, node.pos),
            NodeKind::Prototype(proto) => {
                self.emit_prototype(proto, node.pos)?;
                Ok(None)
            }
            NodeKind::Return { expr } => {
                match expr {
                    Some(expr) => {
                        let value = self.emit_value(expr)?;
                        self.builder.build_return(Some(&value)).map_err(llvm)?;
                    }
                    None => {
                        self.builder.build_return(None).map_err(llvm)?;
                    }
                }
                Ok(None)
            }
            NodeKind::Struct { name, fields } => {
                self.emit_struct(name, fields, node.pos)?;
                Ok(None)
            }
            NodeKind::Typedef { alloc } => {
                self.emit_typedef(alloc, node.pos)?;
                Ok(None)
            }
        }
    }

    /// Emit a node that must produce a value.
    fn emit_value(&mut self, node: &Node) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        self.emit(node)?
            .ok_or(CodegenError::NoValue { pos: node.pos })
    }

    /// Emit a node that must produce an integer value.
    fn emit_int(&mut self, node: &Node) -> Result<IntValue<'ctx>, CodegenError> {
        let value = self.emit_value(node)?;
        if value.is_int_value() {
            Ok(value.into_int_value())
        } else {
            Err(CodegenError::NonIntegerOperand { pos: node.pos })
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn emit_identifier(
        &mut self,
        name: &str,
        index: Option<&Node>,
        pos: Pos,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let slot = self
            .scopes
            .get_value(name)
            .ok_or_else(|| CodegenError::UnknownVariable {
                name: name.to_string(),
                pos,
            })?;

        if slot.is_array {
            if let Some(index) = index {
                let idx = self.emit_int(index)?;
                let el = unsafe {
                    self.builder
                        .build_in_bounds_gep(slot.ptr, &[idx], name)
                }
                .map_err(llvm)?;
                self.builder.build_load(el, name).map_err(llvm)
            } else {
                // An unindexed array decays to the address of element zero.
                let zero = self.context.i32_type().const_int(0, false);
                let el = unsafe {
                    self.builder
                        .build_in_bounds_gep(slot.ptr, &[zero], name)
                }
                .map_err(llvm)?;
                Ok(el.into())
            }
        } else {
            self.builder
                .build_load(slot.ptr, name)
                .map_err(llvm)
        }
    }

    fn emit_string(&mut self, text: &str) -> BasicValueEnum<'ctx> {
        let value = self.context.const_string(text.as_bytes(), true);
        let global = self.module.add_global(value.get_type(), None, "str");
        global.set_initializer(&value);
        global.set_constant(true);
        global.set_linkage(Linkage::Private);
        global.as_pointer_value().into()
    }

    fn emit_binop(
        &mut self,
        op: TokenKind,
        lhs: &Node,
        rhs: &Node,
        pos: Pos,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let lhs = self.emit_int(lhs)?;
        let rhs = self.emit_int(rhs)?;

        let value = match op {
            TokenKind::Plus => self.builder.build_int_add(lhs, rhs, "add"),
            TokenKind::Minus => self.builder.build_int_sub(lhs, rhs, "sub"),
            TokenKind::Star => self.builder.build_int_mul(lhs, rhs, "mul"),
            TokenKind::Slash => self.builder.build_int_signed_div(lhs, rhs, "sdiv"),
            TokenKind::Pipe => self.builder.build_or(lhs, rhs, "or"),
            TokenKind::Amp => self.builder.build_and(lhs, rhs, "and"),
            TokenKind::GreaterEq => {
                self.builder
                    .build_int_compare(IntPredicate::SGE, lhs, rhs, "cmp")
            }
            TokenKind::Greater => {
                self.builder
                    .build_int_compare(IntPredicate::SGT, lhs, rhs, "cmp")
            }
            TokenKind::EqEq => self
                .builder
                .build_int_compare(IntPredicate::EQ, lhs, rhs, "cmp"),
            TokenKind::BangEq => self
                .builder
                .build_int_compare(IntPredicate::NE, lhs, rhs, "cmp"),
            TokenKind::Less => self
                .builder
                .build_int_compare(IntPredicate::SLT, lhs, rhs, "cmp"),
            TokenKind::LessEq => {
                self.builder
                    .build_int_compare(IntPredicate::SLE, lhs, rhs, "cmp")
            }
            other => {
                return Err(CodegenError::Unsupported {
                    what: format!("operator `{}`", other.name()),
                    pos,
                })
            }
        }
        .map_err(llvm)?;

        Ok(value.into())
    }

    fn emit_ref(
        &mut self,
        expr: &Node,
        is_deref: bool,
        pos: Pos,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        if is_deref {
            let slot = match &expr.kind {
                NodeKind::Identifier { name, .. } => self.scopes.get_value(name).ok_or_else(|| {
                    CodegenError::UnknownVariable {
                        name: name.clone(),
                        pos: expr.pos,
                    }
                })?,
                _ => return Err(CodegenError::NoPointerMetadata { pos: expr.pos }),
            };

            let info = self
                .scopes
                .get_pointer(slot.ptr)
                .ok_or(CodegenError::NoPointerMetadata { pos: expr.pos })?;

            // The declared depth drives the load chain, and past one level
            // of indirection the intermediate values are still pointers, so
            // every load reads the pointer type.
            let mut value = self.emit_value(expr)?;
            for _ in 0..info.depth {
                if !value.is_pointer_value() {
                    return Err(CodegenError::NotAPointer { pos });
                }
                value = self
                    .builder
                    .build_load(value.into_pointer_value(), "deref")
                    .map_err(llvm)?;
            }
            Ok(value)
        } else {
            match &expr.kind {
                NodeKind::Identifier { name, .. } => {
                    let slot = self.scopes.get_value(name).ok_or_else(|| {
                        CodegenError::UnknownVariable {
                            name: name.clone(),
                            pos,
                        }
                    })?;
                    Ok(slot.ptr.into())
                }
                _ => Err(CodegenError::InvalidRefTarget { pos }),
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations and assignment
    // ------------------------------------------------------------------

    fn emit_alloc(&mut self, decl: &AllocDecl) -> Result<Slot<'ctx>, CodegenError> {
        let resolved = self.resolve_type(&decl.type_name, decl.pos)?;

        // Pointer-typed slots store the opaque pointer; the declared
        // pointee survives only as pointer metadata.
        let elem_ty: BasicTypeEnum<'ctx> = if decl.ptr_depth > 0 {
            self.ptr_type().into()
        } else {
            resolved
                .basic()
                .ok_or(CodegenError::VoidValue { pos: decl.pos })?
        };

        let ptr = match &decl.array_len {
            Some(len) => {
                let size = self.emit_int(len)?;
                self.builder.build_array_alloca(elem_ty, size, &decl.name)
            }
            None => self.builder.build_alloca(elem_ty, &decl.name),
        }
        .map_err(llvm)?;

        if decl.ptr_depth > 0 {
            let info = PointerInfo {
                pointee: resolved,
                depth: decl.ptr_depth,
            };
            if !self.scopes.insert_pointer(ptr, info) {
                return Err(CodegenError::DuplicatePointer {
                    name: decl.name.clone(),
                    pos: decl.pos,
                });
            }
        }

        let slot = Slot {
            ptr,
            elem_ty,
            is_array: decl.array_len.is_some(),
        };
        if !self.scopes.insert_value(&decl.name, slot) {
            return Err(CodegenError::DuplicateSymbol {
                name: decl.name.clone(),
                pos: decl.pos,
            });
        }
        Ok(slot)
    }

    fn emit_assign(
        &mut self,
        target: &AssignTarget,
        value: &Node,
        pos: Pos,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let (name, index) = match target {
            AssignTarget::Alloc(decl) => {
                self.emit_alloc(decl)?;
                (decl.name.as_str(), None)
            }
            AssignTarget::Ident { name, index, .. } => (name.as_str(), index.as_deref()),
        };

        let slot = self
            .scopes
            .get_value(name)
            .ok_or_else(|| CodegenError::UnknownVariable {
                name: name.to_string(),
                pos,
            })?;

        let value = self.emit_value(value)?;

        if let Some(index) = index {
            let el = if slot.elem_ty.is_pointer_type() {
                self.scopes
                    .get_pointer(slot.ptr)
                    .ok_or(CodegenError::NoPointerMetadata { pos })?;
                let idx = self.emit_int(index)?;
                unsafe {
                    self.builder
                        .build_in_bounds_gep(slot.ptr, &[idx], "el")
                }
                .map_err(llvm)?
            } else if slot.is_array {
                let idx = self.emit_int(index)?;
                unsafe {
                    self.builder
                        .build_in_bounds_gep(slot.ptr, &[idx], "el")
                }
                .map_err(llvm)?
            } else {
                return Err(CodegenError::InvalidIndexTarget {
                    name: name.to_string(),
                    pos,
                });
            };
            self.builder.build_store(el, value).map_err(llvm)?;
        } else {
            self.builder.build_store(slot.ptr, value).map_err(llvm)?;
        }

        Ok(value)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn emit_struct(
        &mut self,
        name: &str,
        fields: &[AllocDecl],
        pos: Pos,
    ) -> Result<(), CodegenError> {
        let struct_ty = self.context.opaque_struct_type(name);

        let mut field_names = Vec::with_capacity(fields.len());
        let mut field_types = Vec::with_capacity(fields.len());
        for field in fields {
            let resolved = self.resolve_type(&field.type_name, pos)?;
            let ty: BasicTypeEnum<'ctx> = if field.ptr_depth > 0 {
                self.ptr_type().into()
            } else {
                resolved
                    .basic()
                    .ok_or(CodegenError::VoidValue { pos: field.pos })?
            };
            field_names.push(field.name.clone());
            field_types.push(ty);
        }

        struct_ty.set_body(&field_types, false);

        let info = StructInfo {
            field_names,
            field_types,
            ty: struct_ty,
        };
        if !self.scopes.insert_struct(name, info) {
            return Err(CodegenError::DuplicateStruct {
                name: name.to_string(),
                pos,
            });
        }
        Ok(())
    }

    fn emit_typedef(&mut self, alloc: &AllocDecl, pos: Pos) -> Result<(), CodegenError> {
        let resolved = self.resolve_type(&alloc.type_name, pos)?;
        if !self.types.insert(&alloc.name, resolved) {
            return Err(CodegenError::DuplicateType {
                name: alloc.name.clone(),
                pos,
            });
        }
        Ok(())
    }

    /// Type-name resolution: the flat table first, then struct tags from
    /// the innermost visible scope outward.
    fn resolve_type(&self, name: &str, pos: Pos) -> Result<CType<'ctx>, CodegenError> {
        if let Some(ty) = self.types.get(name) {
            return Ok(ty);
        }
        if let Some(info) = self.scopes.get_struct(name) {
            return Ok(CType::Basic(info.ty.into()));
        }
        Err(CodegenError::UnknownType {
            name: name.to_string(),
            pos,
        })
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    fn emit_if(
        &mut self,
        cond: &Node,
        then_body: &Node,
        else_body: Option<&Node>,
        pos: Pos,
    ) -> Result<(), CodegenError> {
        let function = self.current_function(pos)?;

        let cond_val = self.emit_int(cond)?;
        let cond_bit = self
            .builder
            .build_int_cast(cond_val, self.context.bool_type(), "cond")
            .map_err(llvm)?;

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "finally");

        self.builder
            .build_conditional_branch(cond_bit, then_bb, else_bb)
            .map_err(llvm)?;

        self.builder.position_at_end(then_bb);
        self.emit(then_body)?;
        self.branch_if_unterminated(merge_bb)?;

        self.builder.position_at_end(else_bb);
        if let Some(else_body) = else_body {
            self.emit(else_body)?;
        }
        self.branch_if_unterminated(merge_bb)?;

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: Option<&Node>,
        cond: Option<&Node>,
        update: Option<&Node>,
        body: &Node,
        pos: Pos,
    ) -> Result<(), CodegenError> {
        self.scopes.push();

        let function = self.current_function(pos)?;

        if let Some(init) = init {
            self.emit(init)?;
        }

        let cond_bb = self.context.append_basic_block(function, "condition");
        let body_bb = self.context.append_basic_block(function, "entry");
        let end_bb = self.context.append_basic_block(function, "finally");

        self.builder.build_unconditional_branch(cond_bb).map_err(llvm)?;
        self.builder.position_at_end(cond_bb);

        // An absent condition loops unconditionally.
        let cond_val = match cond {
            Some(cond) => self.emit_int(cond)?,
            None => self.context.bool_type().const_int(1, false),
        };
        let cond_bit = self
            .builder
            .build_int_cast(cond_val, self.context.bool_type(), "cond")
            .map_err(llvm)?;
        self.builder
            .build_conditional_branch(cond_bit, body_bb, end_bb)
            .map_err(llvm)?;

        self.builder.position_at_end(body_bb);
        self.emit(body)?;
        if let Some(update) = update {
            self.emit(update)?;
        }
        self.branch_if_unterminated(cond_bb)?;

        self.builder.position_at_end(end_bb);
        self.scopes.pop();
        Ok(())
    }

    /// Append a branch to `target` unless the current block already ends in
    /// a terminator (a body that ended in `return`).
    fn branch_if_unterminated(&self, target: BasicBlock<'ctx>) -> Result<(), CodegenError> {
        if let Some(block) = self.builder.get_insert_block() {
            if block.get_terminator().is_none() {
                self.builder
                    .build_unconditional_branch(target)
                    .map_err(llvm)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn emit_call(
        &mut self,
        callee: &str,
        args: &[Node],
        pos: Pos,
    ) -> Result<Option<BasicValueEnum<'ctx>>, CodegenError> {
        let function =
            self.module
                .get_function(callee)
                .ok_or_else(|| CodegenError::UnknownFunction {
                    name: callee.to_string(),
                    pos,
                })?;

        if !function.get_type().is_var_arg() && function.count_params() as usize != args.len() {
            return Err(CodegenError::ArityMismatch {
                name: callee.to_string(),
                expected: function.count_params() as usize,
                found: args.len(),
                pos,
            });
        }

        let mut arg_values: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.emit_value(arg)?.into());
        }

        let call = self
            .builder
            .build_call(function, &arg_values, "")
            .map_err(llvm)?;
        Ok(call.try_as_basic_value().basic())
    }

    fn emit_prototype(&mut self, proto: &Prototype, pos: Pos) -> Result<(), CodegenError> {
        self.scopes.push();

        let mut param_types: Vec<BasicMetadataTypeEnum<'ctx>> =
            Vec::with_capacity(proto.params.len());
        for param in &proto.params {
            let resolved = self.resolve_type(&param.type_name, pos)?;
            let ty: BasicTypeEnum<'ctx> = if param.ptr_depth > 0 {
                self.ptr_type().into()
            } else {
                resolved
                    .basic()
                    .ok_or(CodegenError::VoidValue { pos: param.pos })?
            };
            param_types.push(ty.into());
        }

        let ret = if proto.ret.ptr_depth > 0 {
            CType::Basic(self.ptr_type().into())
        } else {
            self.resolve_type(&proto.ret.type_name, pos)?
        };

        let fn_type = match ret {
            CType::Void => self
                .context
                .void_type()
                .fn_type(&param_types, proto.is_varargs),
            CType::Basic(ty) => ty.fn_type(&param_types, proto.is_varargs),
        };

        // Reuse an earlier forward declaration if one exists.
        let function = match self.module.get_function(&proto.name) {
            Some(existing) => existing,
            None => self.module.add_function(&proto.name, fn_type, None),
        };

        if let Some(body) = &proto.body {
            debug!(function = %proto.name, "emitting function body");

            for (param, decl) in function.get_param_iter().zip(&proto.params) {
                param.set_name(&decl.name);
            }

            let entry = self.context.append_basic_block(function, "entry");
            self.builder.position_at_end(entry);

            // Each parameter gets a stack slot holding the incoming value.
            for (index, decl) in proto.params.iter().enumerate() {
                let slot = self.emit_alloc(decl)?;
                let arg = function.get_nth_param(index as u32).ok_or_else(|| {
                    CodegenError::Llvm(format!(
                        "parameter {index} missing on function `{}`",
                        proto.name
                    ))
                })?;
                self.builder.build_store(slot.ptr, arg).map_err(llvm)?;
            }

            self.emit(body)?;

            if ret.is_void() {
                if let Some(block) = self.builder.get_insert_block() {
                    if block.get_terminator().is_none() {
                        self.builder.build_return(None).map_err(llvm)?;
                    }
                }
            }
        }

        self.scopes.pop();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn current_function(&self, pos: Pos) -> Result<FunctionValue<'ctx>, CodegenError> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or(CodegenError::OutsideFunction { pos })
    }

    fn ptr_type(&self) -> PointerType<'ctx> {
        self.context.i8_type().ptr_type(AddressSpace::default())
    }

    fn int_type(&self, bits: u32) -> IntType<'ctx> {
        match bits {
            8 => self.context.i8_type(),
            16 => self.context.i16_type(),
            64 => self.context.i64_type(),
            _ => self.context.i32_type(),
        }
    }
}
