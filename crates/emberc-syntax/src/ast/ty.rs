//! Type annotation nodes in the Ember AST.
//!
//! Ember's type system has no inference engine and no generics: every
//! declaration site names its type explicitly, and a fixed set of
//! primitives plus arrays, closures, and `any` cover the whole language.

use crate::span::{Span, Spanned};
use emberc_mem::Symbol;
use std::fmt;

/// A primitive scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Double-precision float
    Double,
    /// Boolean
    Bool,
    /// Single byte
    Byte,
    /// Single character
    Char,
}

impl Primitive {
    /// Parses a type-position identifier as a primitive spelling, if it is one.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "double" => Some(Self::Double),
            "bool" => Some(Self::Bool),
            "byte" => Some(Self::Byte),
            "char" => Some(Self::Char),
            _ => None,
        }
    }

    /// The canonical spelling of this primitive.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Char => "char",
        }
    }
}

/// A type annotation in Ember.
///
/// Types appear at variable declarations, function parameters, function
/// return positions, and lambda parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A primitive scalar type: `int`, `long`, `double`, `bool`, `byte`, `char`.
    Primitive {
        /// Which primitive
        kind: Primitive,
        /// Source location
        span: Span,
    },

    /// The `string` type.
    String {
        /// Source location
        span: Span,
    },

    /// An array type: `T[]`.
    Array {
        /// Element type
        element: Box<Type>,
        /// Source location
        span: Span,
    },

    /// A function/closure type: `(T1, T2) -> T3`.
    Function {
        /// Parameter types
        params: Vec<Type>,
        /// Return type
        return_type: Box<Type>,
        /// Source location
        span: Span,
    },

    /// The dynamically-typed `any` type, boxed at assignment.
    Any {
        /// Source location
        span: Span,
    },

    /// A named type this parser did not resolve to a known primitive or
    /// built-in (reported by the checker, not the parser).
    Named {
        /// Type name
        name: Symbol,
        /// Source location
        span: Span,
    },
}

impl Type {
    /// Whether this type names a heap value owned by an arena at run time
    /// (string, array, or closure) — the set of return types that trigger
    /// the `DEFAULT` → `SHARED` function-modifier promotion in `spec.md` §3.
    #[must_use]
    pub fn is_heap_type(&self) -> bool {
        matches!(self, Self::String { .. } | Self::Array { .. } | Self::Function { .. })
    }

    /// Structural equality ignoring spans (two annotations of the same
    /// shape at different source locations are the same type).
    #[must_use]
    pub fn shape_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive { kind: a, .. }, Self::Primitive { kind: b, .. }) => a == b,
            (Self::String { .. }, Self::String { .. }) => true,
            (Self::Any { .. }, Self::Any { .. }) => true,
            (Self::Array { element: a, .. }, Self::Array { element: b, .. }) => a.shape_eq(b),
            (
                Self::Function {
                    params: pa,
                    return_type: ra,
                    ..
                },
                Self::Function {
                    params: pb,
                    return_type: rb,
                    ..
                },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| x.shape_eq(y))
                    && ra.shape_eq(rb)
            }
            (Self::Named { name: a, .. }, Self::Named { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { kind, .. } => write!(f, "{}", kind.name()),
            Self::String { .. } => write!(f, "string"),
            Self::Array { element, .. } => write!(f, "{element}[]"),
            Self::Function {
                params,
                return_type,
                ..
            } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {return_type}")
            }
            Self::Any { .. } => write!(f, "any"),
            Self::Named { name, .. } => write!(f, "{}", name.as_u32()),
        }
    }
}

impl Spanned for Type {
    fn span(&self) -> Span {
        match self {
            Self::Primitive { span, .. }
            | Self::String { span }
            | Self::Array { span, .. }
            | Self::Function { span, .. }
            | Self::Any { span }
            | Self::Named { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trips_through_name() {
        for p in [
            Primitive::Int,
            Primitive::Long,
            Primitive::Double,
            Primitive::Bool,
            Primitive::Byte,
            Primitive::Char,
        ] {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
    }

    #[test]
    fn unknown_name_is_not_a_primitive() {
        assert_eq!(Primitive::from_name("string"), None);
        assert_eq!(Primitive::from_name("Widget"), None);
    }

    #[test]
    fn span_dispatch_covers_every_variant() {
        let s = Span::point(0, 1, 1);
        assert_eq!(
            Type::Primitive {
                kind: Primitive::Long,
                span: s
            }
            .span(),
            s
        );
        assert_eq!(Type::String { span: s }.span(), s);
        assert_eq!(Type::Any { span: s }.span(), s);
    }
}
