//! Evaluation of constraints on complete assignments.
//!
//! This is not a propagator: it only decides whether fixed values satisfy
//! the posted constraints, which is what certifying an engine's answer and
//! testing a model formulation need.

use super::model::{Constraint, CpModel, Expr};
use super::variables::{BoolVar, IntVar};
use crate::error::{ModelError, Result};
use std::collections::HashSet;

/// Values for the variables of one model, indexed by handle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    values: Vec<Option<i64>>,
}

impl Assignment {
    /// An assignment with every variable of `model` unset.
    pub fn for_model(model: &CpModel) -> Self {
        Self {
            values: vec![None; model.var_count()],
        }
    }

    /// Builds a complete assignment from values in handle order.
    pub fn from_values(values: Vec<i64>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    pub fn set(&mut self, var: IntVar, value: i64) {
        if var.0 >= self.values.len() {
            self.values.resize(var.0 + 1, None);
        }
        self.values[var.0] = Some(value);
    }

    pub fn set_bool(&mut self, var: BoolVar, value: bool) {
        self.set(var.int(), i64::from(value));
    }

    /// Sets every variable of a slice to the same value.
    pub fn set_all(&mut self, vars: &[IntVar], value: i64) {
        for &v in vars {
            self.set(v, value);
        }
    }

    pub fn get(&self, var: IntVar) -> Option<i64> {
        self.values.get(var.0).copied().flatten()
    }

    pub fn is_set(&self, var: IntVar) -> bool {
        self.get(var).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One reason an assignment is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A value lies outside the declared domain.
    OutOfDomain { var: String, value: i64 },
    /// A posted constraint does not hold.
    Constraint {
        index: usize,
        scope: &'static str,
        kind: &'static str,
    },
}

impl Violation {
    /// Scope of a violated constraint, if any.
    pub fn scope(&self) -> Option<&'static str> {
        match self {
            Violation::Constraint { scope, .. } => Some(*scope),
            Violation::OutOfDomain { .. } => None,
        }
    }
}

struct Eval<'a> {
    model: &'a CpModel,
    values: &'a Assignment,
}

impl Eval<'_> {
    fn value(&self, var: IntVar) -> Result<i64> {
        self.values
            .get(var)
            .ok_or_else(|| ModelError::Unassigned(self.model.var_name(var).to_string()))
    }

    fn values(&self, vars: &[IntVar]) -> Result<Vec<i64>> {
        vars.iter().map(|&v| self.value(v)).collect()
    }

    fn holds(&self, c: &Constraint) -> Result<bool> {
        Ok(match c {
            Constraint::Clause { literals } => {
                for lit in literals {
                    if lit.values.contains(self.value(lit.var)?) {
                        return Ok(true);
                    }
                }
                false
            }
            Constraint::Compare { var, rel, value } => rel.holds(self.value(*var)?, *value),
            Constraint::Linear { terms, rel, rhs } => {
                let mut total = 0i64;
                for &(coef, v) in terms {
                    total += coef * self.value(v)?;
                }
                rel.holds(total, *rhs)
            }
            Constraint::Times { x, y, z } => self.value(*x)? * self.value(*y)? == self.value(*z)?,
            Constraint::Div { x, y, z } => {
                let d = self.value(*y)?;
                d != 0 && self.value(*x)? / d == self.value(*z)?
            }
            Constraint::Element {
                index,
                array,
                value,
                offset,
            } => {
                let i = self.value(*index)? - offset;
                match usize::try_from(i).ok().and_then(|i| array.get(i)) {
                    Some(&a) => a == self.value(*value)?,
                    None => false,
                }
            }
            Constraint::ElementVar {
                index,
                array,
                value,
                offset,
            } => {
                let i = self.value(*index)? - offset;
                match usize::try_from(i).ok().and_then(|i| array.get(i)) {
                    Some(&a) => self.value(a)? == self.value(*value)?,
                    None => false,
                }
            }
            Constraint::Table { vars, table } => {
                let vals = self.values(vars)?;
                self.model.tuples(*table)?.matches(&vals)
            }
            Constraint::AllDifferentExcept { vars, except } => {
                let mut seen = HashSet::new();
                for v in self.values(vars)? {
                    if v != *except && !seen.insert(v) {
                        return Ok(false);
                    }
                }
                true
            }
            Constraint::SubCircuit { successors, length } => {
                let succ = self.values(successors)?;
                sub_circuit_length(&succ) == Some(self.value(*length)?)
            }
            Constraint::Occurs {
                vars,
                values,
                min,
                max,
            } => {
                let count = self
                    .values(vars)?
                    .iter()
                    .filter(|v| values.contains(v))
                    .count() as i64;
                *min <= count && count <= *max
            }
            Constraint::Maximum { max, vars } => {
                let vals = self.values(vars)?;
                vals.iter().copied().max() == Some(self.value(*max)?)
            }
            Constraint::Decreasing { vars } => {
                let vals = self.values(vars)?;
                vals.windows(2).all(|w| w[0] >= w[1])
            }
            Constraint::AllOf(cs) => {
                for c in cs {
                    if !self.holds(c)? {
                        return Ok(false);
                    }
                }
                true
            }
            Constraint::AnyOf(cs) => {
                for c in cs {
                    if self.holds(c)? {
                        return Ok(true);
                    }
                }
                false
            }
            Constraint::IfThen { condition, then } => !self.holds(condition)? || self.holds(then)?,
            Constraint::Reified { inner, flag } => {
                i64::from(self.holds(inner)?) == self.value(flag.int())?
            }
        })
    }

    fn evaluate(&self, expr: &Expr) -> Result<Option<i64>> {
        Ok(match expr {
            Expr::Reified(c) => Some(i64::from(self.holds(c)?)),
            Expr::Linear { terms, constant } => {
                let mut total = *constant;
                for &(coef, v) in terms {
                    total += coef * self.value(v)?;
                }
                Some(total)
            }
            Expr::Product(x, y) => Some(self.value(*x)? * self.value(*y)?),
            Expr::Quotient(x, y) => {
                let d = self.value(*y)?;
                if d == 0 {
                    None
                } else {
                    Some(self.value(*x)? / d)
                }
            }
            Expr::Element {
                index,
                array,
                offset,
            } => usize::try_from(self.value(*index)? - offset)
                .ok()
                .and_then(|i| array.get(i).copied()),
            Expr::ElementVar {
                index,
                array,
                offset,
            } => match usize::try_from(self.value(*index)? - offset)
                .ok()
                .and_then(|i| array.get(i))
            {
                Some(&v) => Some(self.value(v)?),
                None => None,
            },
            Expr::Lookup { table, inputs } => {
                let vals = self.values(inputs)?;
                self.model.tuples(*table)?.lookup(&vals)
            }
            Expr::Max(vars) => self.values(vars)?.into_iter().max(),
        })
    }
}

/// Length of the single circuit described by `succ`, or `None` when the
/// non-self-loop nodes do not form exactly one cycle.
pub fn sub_circuit_length(succ: &[i64]) -> Option<i64> {
    let n = succ.len();
    let moving: Vec<usize> = (0..n).filter(|&i| succ[i] != i as i64).collect();
    let Some(&start) = moving.first() else {
        return Some(0);
    };
    let mut cur = start;
    let mut steps = 0usize;
    loop {
        let next = usize::try_from(succ[cur]).ok().filter(|&s| s < n)?;
        steps += 1;
        if next == start {
            break;
        }
        if steps > n || succ[next] == next as i64 {
            return None;
        }
        cur = next;
    }
    (steps == moving.len()).then_some(steps as i64)
}

impl CpModel {
    /// Whether one constraint holds under `values`.
    pub fn holds(&self, constraint: &Constraint, values: &Assignment) -> Result<bool> {
        Eval {
            model: self,
            values,
        }
        .holds(constraint)
    }

    /// Every violation of `values`: out-of-domain values first, then
    /// constraints in posting order.
    ///
    /// Fails only when a variable has no value.
    pub fn check(&self, values: &Assignment) -> Result<Vec<Violation>> {
        let eval = Eval {
            model: self,
            values,
        };
        let mut violations = Vec::new();
        for (i, decl) in self.vars().iter().enumerate() {
            let v = eval.value(IntVar(i))?;
            if !decl.domain.contains(v) {
                violations.push(Violation::OutOfDomain {
                    var: decl.name.clone(),
                    value: v,
                });
            }
        }
        for (index, posted) in self.constraints().iter().enumerate() {
            if !eval.holds(&posted.constraint)? {
                violations.push(Violation::Constraint {
                    index,
                    scope: posted.scope,
                    kind: posted.constraint.kind(),
                });
            }
        }
        Ok(violations)
    }

    /// Fills every defined variable of `values` from its definition, in
    /// declaration order. Fixed variables are set to their only value.
    pub fn complete(&self, values: &mut Assignment) -> Result<()> {
        for (i, decl) in self.vars().iter().enumerate() {
            if decl.is_fixed() && !values.is_set(IntVar(i)) {
                if let Some(v) = decl.domain.min() {
                    values.set(IntVar(i), v);
                }
            }
        }
        for def in self.definitions() {
            let value = Eval {
                model: self,
                values: &*values,
            }
            .evaluate(&def.expr)?
            .ok_or_else(|| match def.expr {
                Expr::Lookup { .. } => {
                    ModelError::NoMatchingRow(self.var_name(def.target).to_string())
                }
                _ => ModelError::Evaluation {
                    name: self.var_name(def.target).to_string(),
                    message: "operands outside the expression's range".into(),
                },
            })?;
            values.set(def.target, value);
        }
        Ok(())
    }

    /// Value of the objective variable, if both are present.
    pub fn objective_value(&self, values: &Assignment) -> Option<i64> {
        self.objective().and_then(|o| values.get(o.var()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Cond, Domain, Rel};

    #[test]
    fn test_sub_circuit_length() {
        assert_eq!(sub_circuit_length(&[0, 1, 2]), Some(0));
        assert_eq!(sub_circuit_length(&[1, 0, 2]), Some(2));
        assert_eq!(sub_circuit_length(&[2, 1, 3, 0]), Some(3));
        // two disjoint cycles
        assert_eq!(sub_circuit_length(&[1, 0, 3, 2]), None);
        // path ending in a self loop
        assert_eq!(sub_circuit_length(&[1, 1, 2]), None);
        assert_eq!(sub_circuit_length(&[5, 1]), None);
    }

    #[test]
    fn test_check_reports_scope() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 5)).unwrap();
        let y = m.int_var("y", Domain::range(0, 5)).unwrap();
        m.set_scope("a");
        m.post(Constraint::vars(x, Rel::Lt, y));
        m.set_scope("b");
        m.add_implication(&[Cond::eq(x, 2)], Cond::eq(y, 5)).unwrap();

        let mut ok = Assignment::for_model(&m);
        ok.set(x, 2);
        ok.set(y, 5);
        assert!(m.check(&ok).unwrap().is_empty());

        let mut bad = Assignment::for_model(&m);
        bad.set(x, 2);
        bad.set(y, 3);
        let v = m.check(&bad).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].scope(), Some("b"));
    }

    #[test]
    fn test_out_of_domain_reported() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::from_values([0, 2])).unwrap();
        let mut a = Assignment::for_model(&m);
        a.set(x, 1);
        assert_eq!(
            m.check(&a).unwrap(),
            vec![Violation::OutOfDomain {
                var: "x".into(),
                value: 1
            }]
        );
    }

    #[test]
    fn test_unassigned_is_error() {
        let mut m = CpModel::new("t");
        m.int_var("x", Domain::range(0, 1)).unwrap();
        let a = Assignment::for_model(&m);
        assert_eq!(m.check(&a), Err(ModelError::Unassigned("x".into())));
    }

    #[test]
    fn test_complete_follows_definitions() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 5)).unwrap();
        let flag = m.reify(Constraint::ne(x, 0)).unwrap();
        let doubled = m
            .define(
                Some("d".into()),
                Expr::Linear {
                    terms: vec![(2, x)],
                    constant: 1,
                },
            )
            .unwrap();
        let prod = m.product(doubled, flag.int()).unwrap();
        let c = m.constant(4).unwrap();
        let mut a = Assignment::for_model(&m);
        a.set(x, 3);
        m.complete(&mut a).unwrap();
        assert_eq!(a.get(flag.int()), Some(1));
        assert_eq!(a.get(doubled), Some(7));
        assert_eq!(a.get(prod), Some(7));
        assert_eq!(a.get(c), Some(4));
        assert!(m.check(&a).unwrap().is_empty());
    }

    #[test]
    fn test_element_and_lookup() {
        let mut m = CpModel::new("t");
        let i = m.int_var("i", Domain::range(0, 2)).unwrap();
        let e = m
            .define(
                None,
                Expr::Element {
                    index: i,
                    array: vec![10, 20, 30],
                    offset: 0,
                },
            )
            .unwrap();
        let mut t = crate::cp::Tuples::new(2);
        t.push(&[0, 5]).unwrap();
        t.push(&[1, 6]).unwrap();
        let tid = m.add_table(t);
        let l = m
            .define(
                None,
                Expr::Lookup {
                    table: tid,
                    inputs: vec![i],
                },
            )
            .unwrap();
        let mut a = Assignment::for_model(&m);
        a.set(i, 1);
        m.complete(&mut a).unwrap();
        assert_eq!(a.get(e), Some(20));
        assert_eq!(a.get(l), Some(6));

        let mut b = Assignment::for_model(&m);
        b.set(i, 2);
        assert!(matches!(m.complete(&mut b), Err(ModelError::NoMatchingRow(_))));
    }

    #[test]
    fn test_if_then_and_disjunction() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 9)).unwrap();
        let y = m.int_var("y", Domain::range(0, 9)).unwrap();
        let c = Constraint::if_then(
            Constraint::eq(x, 1),
            Constraint::AnyOf(vec![
                Constraint::eq(y, 3),
                Constraint::AllOf(vec![Constraint::compare(y, Rel::Gt, 5), Constraint::ne(y, 7)]),
            ]),
        );
        let mut a = Assignment::for_model(&m);
        a.set(x, 1);
        for (yv, expected) in [(3, true), (6, true), (7, false), (4, false)] {
            a.set(y, yv);
            assert_eq!(m.holds(&c, &a).unwrap(), expected, "y = {yv}");
        }
        a.set(x, 0);
        a.set(y, 4);
        assert!(m.holds(&c, &a).unwrap());
    }

    #[test]
    fn test_all_different_except_and_occurs() {
        let mut m = CpModel::new("t");
        let xs = m.int_array("x", 4, |_| Domain::range(-1, 3)).unwrap();
        let c = Constraint::AllDifferentExcept {
            vars: xs.clone(),
            except: -1,
        };
        let occ = Constraint::Occurs {
            vars: xs.clone(),
            values: vec![-1],
            min: 2,
            max: 4,
        };
        let mut a = Assignment::for_model(&m);
        for (v, val) in xs.iter().zip([-1, 2, -1, 0]) {
            a.set(*v, val);
        }
        assert!(m.holds(&c, &a).unwrap());
        assert!(m.holds(&occ, &a).unwrap());
        a.set(xs[2], 2);
        assert!(!m.holds(&c, &a).unwrap());
        assert!(!m.holds(&occ, &a).unwrap());
    }
}
