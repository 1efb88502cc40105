//! Type system for the Swiftlite subset.

use std::fmt;

/// A Swiftlite type, compared structurally.
///
/// `Unknown` is the error-suppressing bottom type: it is compatible with
/// everything so that one bad expression does not cascade into diagnostics
/// on every enclosing node.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Double,
    String,
    Bool,
    Character,
    Void,
    Unknown,
    /// A user-declared class, by name.
    Class(String),
    /// Function type: parameter types and return type.
    Function(Vec<Type>, Box<Type>),
    /// Homogeneous array `[T]`.
    Array(Box<Type>),
    /// Dictionary `[K: V]`.
    Dictionary(Box<Type>, Box<Type>),
    /// Tuple of two or more (or zero) element types.
    Tuple(Vec<Type>),
}

impl Type {
    /// Map a type annotation name to a built-in type, or a class type for
    /// anything not in the built-in table.
    pub fn from_name(name: &str) -> Type {
        match name {
            "Int" => Type::Int,
            "Double" => Type::Double,
            "String" => Type::String,
            "Bool" => Type::Bool,
            "Character" => Type::Character,
            "Void" => Type::Void,
            _ => Type::Class(name.to_string()),
        }
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn dictionary(key: Type, value: Type) -> Type {
        Type::Dictionary(Box::new(key), Box::new(value))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// Whether a value of type `other` may be used where `self` is expected.
    ///
    /// `Unknown` is compatible with everything; `Int` and `Double` are
    /// mutually compatible (numeric widening); containers compare
    /// element-wise.
    pub fn is_compatible_with(&self, other: &Type) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return true;
        }
        if self.is_numeric() && other.is_numeric() {
            return true;
        }
        match (self, other) {
            (Type::Array(a), Type::Array(b)) => a.is_compatible_with(b),
            (Type::Dictionary(ka, va), Type::Dictionary(kb, vb)) => {
                ka.is_compatible_with(kb) && va.is_compatible_with(vb)
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_compatible_with(y))
            }
            (Type::Function(pa, ra), Type::Function(pb, rb)) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| x.is_compatible_with(y))
                    && ra.is_compatible_with(rb)
            }
            (Type::Class(a), Type::Class(b)) => a == b,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Double => write!(f, "Double"),
            Type::String => write!(f, "String"),
            Type::Bool => write!(f, "Bool"),
            Type::Character => write!(f, "Character"),
            Type::Void => write!(f, "Void"),
            Type::Unknown => write!(f, "Unknown"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Function(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Array(elem) => write!(f, "[{}]", elem),
            Type::Dictionary(key, value) => write!(f, "[{}: {}]", key, value),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert!(Type::Int.is_compatible_with(&Type::Double));
        assert!(Type::Double.is_compatible_with(&Type::Int));
        assert!(!Type::Int.is_compatible_with(&Type::String));
    }

    #[test]
    fn test_unknown_is_bottom() {
        assert!(Type::Unknown.is_compatible_with(&Type::String));
        assert!(Type::Bool.is_compatible_with(&Type::Unknown));
        assert!(Type::array(Type::Unknown).is_compatible_with(&Type::array(Type::Int)));
    }

    #[test]
    fn test_structural_containers() {
        assert!(Type::array(Type::Int).is_compatible_with(&Type::array(Type::Double)));
        assert!(!Type::array(Type::Int).is_compatible_with(&Type::array(Type::String)));
        assert!(!Type::dictionary(Type::String, Type::Int)
            .is_compatible_with(&Type::dictionary(Type::Int, Type::Int)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::array(Type::Int).to_string(), "[Int]");
        assert_eq!(
            Type::dictionary(Type::String, Type::Double).to_string(),
            "[String: Double]"
        );
        assert_eq!(
            Type::Function(vec![Type::Int], Box::new(Type::Bool)).to_string(),
            "(Int) -> Bool"
        );
    }
}
