//! CP variable handles and declarations.

use super::domain::Domain;

/// Handle to an integer variable declared in a [`CpModel`](super::CpModel).
///
/// Handles are cheap to copy and only meaningful for the model that
/// returned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    /// Position of the variable in its model.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a 0/1 variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) IntVar);

impl BoolVar {
    /// The same variable seen as an integer.
    pub fn int(self) -> IntVar {
        self.0
    }
}

impl From<BoolVar> for IntVar {
    fn from(b: BoolVar) -> Self {
        b.0
    }
}

/// Integer or boolean flavour of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKind {
    Int,
    Bool,
}

/// A declared variable: name, initial domain, kind.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Unique name within the model.
    pub name: String,
    /// Initial domain.
    pub domain: Domain,
    pub kind: VarKind,
    /// Introduced by the model itself rather than declared by a caller.
    pub auxiliary: bool,
}

impl VarDecl {
    /// Whether the domain holds a single value.
    pub fn is_fixed(&self) -> bool {
        self.domain.size() == 1
    }
}

/// Shape of a declared variable array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    D1(usize),
    D2(usize, usize),
    D3(usize, usize, usize),
}

impl Shape {
    /// Total number of cells.
    pub fn len(&self) -> usize {
        match *self {
            Shape::D1(a) => a,
            Shape::D2(a, b) => a * b,
            Shape::D3(a, b, c) => a * b * c,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named array of variables, recorded in row-major order.
#[derive(Debug, Clone)]
pub struct VarGroup {
    pub name: String,
    pub kind: VarKind,
    pub shape: Shape,
    pub vars: Vec<IntVar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_len() {
        assert_eq!(Shape::D1(4).len(), 4);
        assert_eq!(Shape::D2(2, 3).len(), 6);
        assert_eq!(Shape::D3(2, 0, 3).len(), 0);
        assert!(Shape::D3(2, 0, 3).is_empty());
    }

    #[test]
    fn test_bool_handle_converts() {
        let b = BoolVar(IntVar(7));
        let i: IntVar = b.into();
        assert_eq!(i.index(), 7);
        assert_eq!(b.int(), i);
    }

    #[test]
    fn test_fixed_decl() {
        let d = VarDecl {
            name: "x".into(),
            domain: Domain::singleton(3),
            kind: VarKind::Int,
            auxiliary: false,
        };
        assert!(d.is_fixed());
    }
}
