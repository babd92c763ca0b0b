//! Clause encoder.
//!
//! Turns relational conditions `var rel value` into admissible value sets
//! and posts them as clauses. An implication `a ∧ b → c` becomes the clause
//! `¬a ∨ ¬b ∨ c`; an equivalence posts both directions. No reified 0/1
//! auxiliary is created for any connective.

use super::domain::Domain;
use super::model::{Constraint, CpModel, Literal};
use super::variables::IntVar;
use crate::error::{ModelError, Result};
use std::fmt;

/// Largest number of literals in one clause.
pub const MAX_CLAUSE_ARITY: usize = 5;

/// Relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rel {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Rel {
    /// The operator holding exactly when `self` does not.
    pub fn negation(self) -> Rel {
        match self {
            Rel::Eq => Rel::Ne,
            Rel::Ne => Rel::Eq,
            Rel::Lt => Rel::Ge,
            Rel::Ge => Rel::Lt,
            Rel::Le => Rel::Gt,
            Rel::Gt => Rel::Le,
        }
    }

    /// Evaluates `lhs rel rhs`.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Rel::Eq => lhs == rhs,
            Rel::Ne => lhs != rhs,
            Rel::Lt => lhs < rhs,
            Rel::Le => lhs <= rhs,
            Rel::Gt => lhs > rhs,
            Rel::Ge => lhs >= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Rel::Eq => "=",
            Rel::Ne => "!=",
            Rel::Lt => "<",
            Rel::Le => "<=",
            Rel::Gt => ">",
            Rel::Ge => ">=",
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A condition `var rel value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cond {
    pub var: IntVar,
    pub rel: Rel,
    pub value: i64,
}

impl Cond {
    pub fn new(var: impl Into<IntVar>, rel: Rel, value: i64) -> Self {
        Self {
            var: var.into(),
            rel,
            value,
        }
    }

    pub fn eq(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Eq, value)
    }

    pub fn ne(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Ne, value)
    }

    pub fn lt(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Lt, value)
    }

    pub fn le(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Le, value)
    }

    pub fn gt(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Gt, value)
    }

    pub fn ge(var: impl Into<IntVar>, value: i64) -> Self {
        Self::new(var, Rel::Ge, value)
    }

    /// The opposite condition on the same variable.
    pub fn negate(self) -> Self {
        Self {
            rel: self.rel.negation(),
            ..self
        }
    }

    /// The condition as a posted-form constraint.
    pub fn to_constraint(self) -> Constraint {
        Constraint::compare(self.var, self.rel, self.value)
    }
}

/// Values of `domain` satisfying `x rel value`.
///
/// Computed by cutting the interval where the negated condition holds out
/// of the domain; a cut whose lower end exceeds its upper end is skipped.
///
/// # Examples
///
/// ```
/// use u_liner::cp::{admissible_range, Domain, Rel};
///
/// let d = Domain::range(-1, 5);
/// assert_eq!(admissible_range(&d, Rel::Le, 2), Domain::range(-1, 2));
/// assert_eq!(admissible_range(&d, Rel::Gt, 9), Domain::empty());
/// ```
pub fn admissible_range(domain: &Domain, rel: Rel, value: i64) -> Domain {
    let (lo, hi) = match (domain.min(), domain.max()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Domain::empty(),
    };
    let mut range = domain.clone();
    match rel {
        Rel::Eq => return domain.intersect(&Domain::singleton(value)),
        Rel::Ne => range.remove(value),
        Rel::Lt => range.remove_between(value, hi),
        Rel::Le => range.remove_between(value.saturating_add(1), hi),
        Rel::Gt => range.remove_between(lo, value),
        Rel::Ge => range.remove_between(lo, value.saturating_sub(1)),
    }
    range
}

impl CpModel {
    /// The admissible set of `cond` as a clause literal.
    pub fn literal(&self, cond: Cond) -> Result<Literal> {
        let domain = self.domain(cond.var)?;
        Ok(Literal {
            var: cond.var,
            values: admissible_range(domain, cond.rel, cond.value),
        })
    }

    /// Posts `c1 ∨ c2 ∨ …` over one to five conditions.
    ///
    /// Literals whose admissible set is empty can never hold and are left
    /// out; a clause left with no literal is posted as-is and fails.
    pub fn add_clause(&mut self, conds: &[Cond]) -> Result<()> {
        if conds.is_empty() || conds.len() > MAX_CLAUSE_ARITY {
            return Err(ModelError::ClauseArity(conds.len()));
        }
        let literals = conds
            .iter()
            .map(|&c| self.literal(c))
            .filter(|l| l.as_ref().map_or(true, |l| !l.values.is_empty()))
            .collect::<Result<Vec<_>>>()?;
        self.post(Constraint::Clause { literals });
        Ok(())
    }

    /// Posts `premises[0] ∧ … → conclusion`.
    pub fn add_implication(&mut self, premises: &[Cond], conclusion: Cond) -> Result<()> {
        let mut conds: Vec<Cond> = premises.iter().map(|c| c.negate()).collect();
        conds.push(conclusion);
        self.add_clause(&conds)
    }

    /// Posts `a ↔ b`.
    pub fn add_equivalence(&mut self, a: Cond, b: Cond) -> Result<()> {
        self.add_implication(&[a], b)?;
        self.add_implication(&[b], a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RELS: [Rel; 6] = [Rel::Eq, Rel::Ne, Rel::Lt, Rel::Le, Rel::Gt, Rel::Ge];

    #[test]
    fn test_negation_pairs() {
        assert_eq!(Rel::Eq.negation(), Rel::Ne);
        assert_eq!(Rel::Lt.negation(), Rel::Ge);
        assert_eq!(Rel::Le.negation(), Rel::Gt);
        for r in RELS {
            assert_eq!(r.negation().negation(), r);
        }
    }

    #[test]
    fn test_ranges_on_bounds() {
        let d = Domain::range(0, 10);
        assert_eq!(admissible_range(&d, Rel::Eq, 4), Domain::singleton(4));
        assert_eq!(admissible_range(&d, Rel::Ne, 4).size(), 10);
        assert_eq!(admissible_range(&d, Rel::Lt, 4), Domain::range(0, 3));
        assert_eq!(admissible_range(&d, Rel::Le, 4), Domain::range(0, 4));
        assert_eq!(admissible_range(&d, Rel::Gt, 4), Domain::range(5, 10));
        assert_eq!(admissible_range(&d, Rel::Ge, 4), Domain::range(4, 10));
    }

    #[test]
    fn test_out_of_bounds_cut_is_skipped() {
        let d = Domain::range(3, 6);
        assert_eq!(admissible_range(&d, Rel::Lt, 10), d);
        assert_eq!(admissible_range(&d, Rel::Ge, 0), d);
        assert!(admissible_range(&d, Rel::Eq, 0).is_empty());
    }

    #[test]
    fn test_implication_negates_premises() {
        let mut m = CpModel::new("t");
        let v = m.int_var("v", Domain::range(0, 3)).unwrap();
        let l = m.int_var("l", Domain::range(0, 8)).unwrap();
        m.add_implication(&[Cond::eq(v, 0)], Cond::eq(l, 0)).unwrap();
        match &m.constraints()[0].constraint {
            Constraint::Clause { literals } => {
                assert_eq!(literals.len(), 2);
                assert_eq!(literals[0].values, Domain::range(1, 3));
                assert_eq!(literals[1].values, Domain::singleton(0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_equivalence_posts_two_clauses() {
        let mut m = CpModel::new("t");
        let v = m.int_var("v", Domain::range(0, 3)).unwrap();
        let l = m.int_var("l", Domain::range(0, 8)).unwrap();
        m.add_equivalence(Cond::ne(v, 0), Cond::ge(l, 3)).unwrap();
        assert_eq!(m.constraint_count(), 2);
    }

    #[test]
    fn test_clause_arity() {
        let mut m = CpModel::new("t");
        let v = m.int_var("v", Domain::range(0, 3)).unwrap();
        assert_eq!(m.add_clause(&[]), Err(ModelError::ClauseArity(0)));
        let six = [Cond::eq(v, 0); 6];
        assert_eq!(m.add_clause(&six), Err(ModelError::ClauseArity(6)));
        assert!(m.add_clause(&six[..5]).is_ok());
    }

    #[test]
    fn test_empty_literal_dropped() {
        let mut m = CpModel::new("t");
        let v = m.int_var("v", Domain::range(0, 3)).unwrap();
        let w = m.int_var("w", Domain::range(0, 3)).unwrap();
        m.add_clause(&[Cond::gt(v, 7), Cond::eq(w, 1)]).unwrap();
        match &m.constraints()[0].constraint {
            Constraint::Clause { literals } => assert_eq!(literals.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_range_is_complement_of_negation(
            vals in prop::collection::vec(-10i64..10, 1..12),
            value in -12i64..12,
            op in 0usize..6,
        ) {
            let rel = RELS[op];
            let d = Domain::from_values(vals.iter().copied());
            let range = admissible_range(&d, rel, value);
            for x in d.values() {
                prop_assert_eq!(range.contains(x), !rel.negation().holds(x, value));
            }
            prop_assert!(range.values().all(|x| d.contains(x)));
        }
    }
}
