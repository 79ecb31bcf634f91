//! Mapping from source type names to LLVM types via inkwell.
//!
//! The [`TypeTable`] is the flat name table: primitives seeded at
//! construction plus typedefs installed during emission. It is owned by the
//! generator instance, so multiple compilations per process never share
//! state. Struct tags are not stored here; they live in scope frames and
//! are consulted by the generator after this table misses.

use std::collections::HashMap;

use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;

/// A resolved source type: either `void` or a first-class LLVM type.
///
/// Pointer-typed declarations do not appear here. Their storage type is
/// always the opaque pointer; the declared pointee is kept as pointer
/// metadata in the scope table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType<'ctx> {
    Void,
    Basic(BasicTypeEnum<'ctx>),
}

impl<'ctx> CType<'ctx> {
    pub fn is_void(self) -> bool {
        matches!(self, CType::Void)
    }

    /// The underlying LLVM type, if this is not `void`.
    pub fn basic(self) -> Option<BasicTypeEnum<'ctx>> {
        match self {
            CType::Void => None,
            CType::Basic(ty) => Some(ty),
        }
    }
}

/// Flat map from type name to resolved type.
pub struct TypeTable<'ctx> {
    map: HashMap<String, CType<'ctx>>,
}

impl<'ctx> TypeTable<'ctx> {
    /// Build the table with the seven primitive type names.
    pub fn new(context: &'ctx Context) -> Self {
        let mut map = HashMap::new();
        map.insert("void".to_string(), CType::Void);
        map.insert("char".to_string(), CType::Basic(context.i8_type().into()));
        map.insert("short".to_string(), CType::Basic(context.i16_type().into()));
        map.insert("int".to_string(), CType::Basic(context.i32_type().into()));
        map.insert("long".to_string(), CType::Basic(context.i64_type().into()));
        map.insert("float".to_string(), CType::Basic(context.f32_type().into()));
        map.insert(
            "double".to_string(),
            CType::Basic(context.f64_type().into()),
        );
        Self { map }
    }

    /// Install a typedef. Returns false if the name is already present.
    pub fn insert(&mut self, name: &str, ty: CType<'ctx>) -> bool {
        if self.map.contains_key(name) {
            return false;
        }
        self.map.insert(name.to_string(), ty);
        true
    }

    pub fn get(&self, name: &str) -> Option<CType<'ctx>> {
        self.map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_is_void() {
        let context = Context::create();
        let table = TypeTable::new(&context);
        assert!(table.get("void").unwrap().is_void());
        assert!(table.get("void").unwrap().basic().is_none());
    }

    #[test]
    fn integer_primitives_have_expected_widths() {
        let context = Context::create();
        let table = TypeTable::new(&context);
        for (name, bits) in [("char", 8), ("short", 16), ("int", 32), ("long", 64)] {
            let ty = table.get(name).unwrap().basic().unwrap();
            assert!(ty.is_int_type(), "{name} should be an int type");
            assert_eq!(ty.into_int_type().get_bit_width(), bits, "{name}");
        }
    }

    #[test]
    fn float_primitives_map_to_llvm_floats() {
        let context = Context::create();
        let table = TypeTable::new(&context);
        assert_eq!(
            table.get("float").unwrap().basic().unwrap(),
            context.f32_type().into()
        );
        assert_eq!(
            table.get("double").unwrap().basic().unwrap(),
            context.f64_type().into()
        );
    }

    #[test]
    fn typedef_insertion_and_lookup() {
        let context = Context::create();
        let mut table = TypeTable::new(&context);
        let int_ty = table.get("int").unwrap();
        assert!(table.insert("Int32", int_ty));
        assert_eq!(table.get("Int32"), Some(int_ty));
    }

    #[test]
    fn duplicate_typedef_is_rejected() {
        let context = Context::create();
        let mut table = TypeTable::new(&context);
        let int_ty = table.get("int").unwrap();
        assert!(table.insert("Int32", int_ty));
        assert!(!table.insert("Int32", int_ty));
        assert!(!table.insert("int", int_ty));
    }

    #[test]
    fn unknown_name_misses() {
        let context = Context::create();
        let table = TypeTable::new(&context);
        assert!(table.get("Point").is_none());
    }
}
