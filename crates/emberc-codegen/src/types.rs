//! Ember type to C type-name lowering.
//!
//! Every array element suffix and runtime struct name here must match
//! `emberc-runtime`'s layout and naming exactly — this is the seam where a
//! drift between the Rust model and the emitted C would silently produce
//! two different ABIs.

use emberc_syntax::ast::ty::Primitive;
use emberc_syntax::ast::Type;

/// Renders `ty` as the C type it lowers to.
///
/// Heap types (`string`, `T[]`, function values, `any`) lower to pointer or
/// struct-pointer types; the arena that owns them is threaded separately,
/// never folded into the type name itself.
#[must_use]
pub fn c_type_name(ty: &Type) -> String {
    match ty {
        Type::Primitive { kind, .. } => primitive_c_name(*kind).to_string(),
        Type::String { .. } => "char*".to_string(),
        Type::Array { element, .. } => format!("{}*", c_type_name(element)),
        Type::Function { .. } => "RtClosure*".to_string(),
        Type::Any { .. } => "RtDynValue".to_string(),
        Type::Named { .. } => "void*".to_string(),
    }
}

/// The C primitive name for one [`Primitive`] kind.
#[must_use]
pub const fn primitive_c_name(kind: Primitive) -> &'static str {
    match kind {
        Primitive::Int => "int32_t",
        Primitive::Long => "int64_t",
        Primitive::Double => "double",
        Primitive::Bool => "bool",
        Primitive::Byte => "uint8_t",
        Primitive::Char => "char",
    }
}

/// The array-method suffix used by `rt_array_<op>_<suffix>` calls for an
/// array whose element type is `element`, e.g. `int` for `int[]`, `ptr` for
/// `string[]`/`T[][]` (anything not a primitive is a pointer payload).
#[must_use]
pub fn array_elem_suffix(element: &Type) -> &'static str {
    match element {
        Type::Primitive { kind, .. } => match kind {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
        },
        _ => "ptr",
    }
}

/// `true` for the types that require arena involvement: arrays, strings,
/// closures, and `any` (which may box one of those).
#[must_use]
pub fn is_heap_type(ty: &Type) -> bool {
    ty.is_heap_type()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberc_syntax::span::Span;

    fn sp() -> Span {
        Span::point(0, 1, 1)
    }

    #[test]
    fn primitive_names_match_runtime_layout() {
        assert_eq!(
            c_type_name(&Type::Primitive { kind: Primitive::Int, span: sp() }),
            "int32_t"
        );
        assert_eq!(
            c_type_name(&Type::Primitive { kind: Primitive::Long, span: sp() }),
            "int64_t"
        );
    }

    #[test]
    fn array_of_int_is_pointer_to_int32() {
        let arr = Type::Array {
            element: Box::new(Type::Primitive { kind: Primitive::Int, span: sp() }),
            span: sp(),
        };
        assert_eq!(c_type_name(&arr), "int32_t*");
        assert_eq!(
            array_elem_suffix(&Type::Primitive { kind: Primitive::Int, span: sp() }),
            "int"
        );
    }

    #[test]
    fn string_array_elem_suffix_is_ptr() {
        assert_eq!(array_elem_suffix(&Type::String { span: sp() }), "ptr");
    }
}
