//! Lexical scope stack for the IR generator.
//!
//! A frame owns three maps: named stack slots, struct tags, and pointer
//! metadata keyed by the slot's `PointerValue` handle (handle equality, so
//! the key stays valid however the frame storage moves). Lookup walks from
//! the top frame outward; insertion targets the top frame only and fails on
//! duplicates. Frames bracket every block, loop, and function definition.

use std::collections::HashMap;

use inkwell::types::{BasicTypeEnum, StructType};
use inkwell::values::PointerValue;

use crate::types::CType;

/// A named stack slot: its address, the allocated element type, and whether
/// it was allocated with an array extent.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub elem_ty: BasicTypeEnum<'ctx>,
    pub is_array: bool,
}

/// A struct tag binding: ordered field names and types plus the named
/// aggregate itself.
#[derive(Debug, Clone)]
pub struct StructInfo<'ctx> {
    pub field_names: Vec<String>,
    pub field_types: Vec<BasicTypeEnum<'ctx>>,
    pub ty: StructType<'ctx>,
}

/// The declared pointee and indirection depth of a pointer-typed slot.
/// Tracked outside LLVM because the opaque pointer forgets its pointee.
#[derive(Debug, Clone, Copy)]
pub struct PointerInfo<'ctx> {
    pub pointee: CType<'ctx>,
    pub depth: usize,
}

#[derive(Default)]
struct Frame<'ctx> {
    values: HashMap<String, Slot<'ctx>>,
    structs: HashMap<String, StructInfo<'ctx>>,
    pointers: HashMap<PointerValue<'ctx>, PointerInfo<'ctx>>,
}

/// Strictly LIFO stack of scope frames.
#[derive(Default)]
pub struct ScopeStack<'ctx> {
    frames: Vec<Frame<'ctx>>,
}

impl<'ctx> ScopeStack<'ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind a slot in the top frame. False if the name is taken there.
    pub fn insert_value(&mut self, name: &str, slot: Slot<'ctx>) -> bool {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => return false,
        };
        if frame.values.contains_key(name) {
            return false;
        }
        frame.values.insert(name.to_string(), slot);
        true
    }

    pub fn get_value(&self, name: &str) -> Option<Slot<'ctx>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.values.get(name).copied())
    }

    /// Bind a struct tag in the top frame. False if the tag is taken there.
    pub fn insert_struct(&mut self, name: &str, info: StructInfo<'ctx>) -> bool {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => return false,
        };
        if frame.structs.contains_key(name) {
            return false;
        }
        frame.structs.insert(name.to_string(), info);
        true
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructInfo<'ctx>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.structs.get(name))
    }

    /// Record pointer metadata for a slot. False if already recorded in the
    /// top frame.
    pub fn insert_pointer(&mut self, ptr: PointerValue<'ctx>, info: PointerInfo<'ctx>) -> bool {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => return false,
        };
        if frame.pointers.contains_key(&ptr) {
            return false;
        }
        frame.pointers.insert(ptr, info);
        true
    }

    pub fn get_pointer(&self, ptr: PointerValue<'ctx>) -> Option<PointerInfo<'ctx>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.pointers.get(&ptr).copied())
    }
}
