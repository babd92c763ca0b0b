//! CP model definition.

use super::clause::Rel;
use super::domain::Domain;
use super::variables::{BoolVar, IntVar, Shape, VarDecl, VarGroup, VarKind};
use crate::error::{ModelError, Result};
use std::collections::HashMap;

/// Handle to a tuple set stored once in a [`CpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub(crate) usize);

/// A set of admissible tuples for a table constraint.
///
/// `None` in a row is a wildcard matching any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuples {
    arity: usize,
    rows: Vec<Vec<Option<i64>>>,
}

impl Tuples {
    /// An empty tuple set of the given arity.
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            rows: Vec::new(),
        }
    }

    /// Adds a fully specified row.
    pub fn push(&mut self, row: &[i64]) -> Result<()> {
        self.push_pattern(row.iter().copied().map(Some).collect())
    }

    /// Adds a row where `None` cells match anything.
    pub fn push_pattern(&mut self, row: Vec<Option<i64>>) -> Result<()> {
        if row.len() != self.arity {
            return Err(ModelError::TableArity {
                expected: self.arity,
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn rows(&self) -> &[Vec<Option<i64>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether some row matches `values` cell by cell.
    pub fn matches(&self, values: &[i64]) -> bool {
        self.rows.iter().any(|row| row_matches(row, values))
    }

    /// Last cell of the first row whose leading cells match `inputs`.
    pub fn lookup(&self, inputs: &[i64]) -> Option<i64> {
        self.rows.iter().find_map(|row| {
            let (last, head) = row.split_last()?;
            if row_matches(head, inputs) {
                Some(*last)
            } else {
                None
            }
        })?
    }

    /// Values of column `col`, ignoring wildcards.
    pub fn column(&self, col: usize) -> Domain {
        Domain::from_values(self.rows.iter().filter_map(|r| r.get(col).copied().flatten()))
    }
}

fn row_matches(row: &[Option<i64>], values: &[i64]) -> bool {
    row.len() == values.len()
        && row
            .iter()
            .zip(values)
            .all(|(cell, v)| cell.map_or(true, |c| c == *v))
}

/// One disjunct of a clause: `var` takes a value in `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub var: IntVar,
    pub values: Domain,
}

/// A constraint in the CP model.
///
/// The variants mirror the capability set a propagation engine is expected
/// to offer. They carry handles only; domains live in the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// At least one literal holds.
    Clause { literals: Vec<Literal> },

    /// `var rel value`.
    Compare { var: IntVar, rel: Rel, value: i64 },

    /// `Σ coef·var rel rhs`.
    Linear {
        terms: Vec<(i64, IntVar)>,
        rel: Rel,
        rhs: i64,
    },

    /// `z = x · y`.
    Times { x: IntVar, y: IntVar, z: IntVar },

    /// `z = x / y`, truncated toward zero; `y` must not be 0.
    Div { x: IntVar, y: IntVar, z: IntVar },

    /// `value = array[index - offset]` over constants.
    Element {
        index: IntVar,
        array: Vec<i64>,
        value: IntVar,
        offset: i64,
    },

    /// `value = array[index - offset]` over variables.
    ElementVar {
        index: IntVar,
        array: Vec<IntVar>,
        value: IntVar,
        offset: i64,
    },

    /// The tuple `vars` belongs to a stored tuple set.
    Table { vars: Vec<IntVar>, table: TableId },

    /// Pairwise different, except for values equal to `except`.
    AllDifferentExcept { vars: Vec<IntVar>, except: i64 },

    /// Nodes with `successors[i] != i` form a single cycle of `length`
    /// nodes; every other node loops on itself. All self-loops means
    /// `length = 0`.
    SubCircuit {
        successors: Vec<IntVar>,
        length: IntVar,
    },

    /// The number of `vars` taking a value in `values` lies in `[min, max]`.
    Occurs {
        vars: Vec<IntVar>,
        values: Vec<i64>,
        min: i64,
        max: i64,
    },

    /// `max = max(vars)`.
    Maximum { max: IntVar, vars: Vec<IntVar> },

    /// `vars[i] >= vars[i + 1]`.
    Decreasing { vars: Vec<IntVar> },

    /// Conjunction.
    AllOf(Vec<Constraint>),

    /// Disjunction.
    AnyOf(Vec<Constraint>),

    /// `then` must hold whenever `condition` holds.
    IfThen {
        condition: Box<Constraint>,
        then: Box<Constraint>,
    },

    /// `flag = 1` iff `inner` holds.
    Reified {
        inner: Box<Constraint>,
        flag: BoolVar,
    },
}

impl Constraint {
    /// `var rel value`.
    pub fn compare(var: IntVar, rel: Rel, value: i64) -> Self {
        Constraint::Compare { var, rel, value }
    }

    /// `var = value`.
    pub fn eq(var: IntVar, value: i64) -> Self {
        Self::compare(var, Rel::Eq, value)
    }

    /// `var != value`.
    pub fn ne(var: IntVar, value: i64) -> Self {
        Self::compare(var, Rel::Ne, value)
    }

    /// `x rel y` between two variables.
    pub fn vars(x: IntVar, rel: Rel, y: IntVar) -> Self {
        Constraint::Linear {
            terms: vec![(1, x), (-1, y)],
            rel,
            rhs: 0,
        }
    }

    /// `Σ coef·var rel rhs`.
    pub fn linear(terms: Vec<(i64, IntVar)>, rel: Rel, rhs: i64) -> Self {
        Constraint::Linear { terms, rel, rhs }
    }

    /// `Σ vars rel rhs`.
    pub fn sum(vars: &[IntVar], rel: Rel, rhs: i64) -> Self {
        Self::linear(vars.iter().map(|&v| (1, v)).collect(), rel, rhs)
    }

    /// `then` whenever `condition`.
    pub fn if_then(condition: Constraint, then: Constraint) -> Self {
        Constraint::IfThen {
            condition: Box::new(condition),
            then: Box::new(then),
        }
    }

    /// Calls `f` on every variable the constraint mentions.
    pub fn for_each_var(&self, f: &mut impl FnMut(IntVar)) {
        match self {
            Constraint::Clause { literals } => literals.iter().for_each(|l| f(l.var)),
            Constraint::Compare { var, .. } => f(*var),
            Constraint::Linear { terms, .. } => terms.iter().for_each(|&(_, v)| f(v)),
            Constraint::Times { x, y, z } | Constraint::Div { x, y, z } => {
                f(*x);
                f(*y);
                f(*z);
            }
            Constraint::Element { index, value, .. } => {
                f(*index);
                f(*value);
            }
            Constraint::ElementVar {
                index,
                array,
                value,
                ..
            } => {
                f(*index);
                array.iter().for_each(|&v| f(v));
                f(*value);
            }
            Constraint::Table { vars, .. }
            | Constraint::AllDifferentExcept { vars, .. }
            | Constraint::Occurs { vars, .. }
            | Constraint::Decreasing { vars } => vars.iter().for_each(|&v| f(v)),
            Constraint::SubCircuit { successors, length } => {
                successors.iter().for_each(|&v| f(v));
                f(*length);
            }
            Constraint::Maximum { max, vars } => {
                f(*max);
                vars.iter().for_each(|&v| f(v));
            }
            Constraint::AllOf(cs) | Constraint::AnyOf(cs) => {
                cs.iter().for_each(|c| c.for_each_var(f))
            }
            Constraint::IfThen { condition, then } => {
                condition.for_each_var(f);
                then.for_each_var(f);
            }
            Constraint::Reified { inner, flag } => {
                inner.for_each_var(f);
                f(flag.int());
            }
        }
    }

    /// Short name of the constraint kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Clause { .. } => "clause",
            Constraint::Compare { .. } => "compare",
            Constraint::Linear { .. } => "linear",
            Constraint::Times { .. } => "times",
            Constraint::Div { .. } => "div",
            Constraint::Element { .. } => "element",
            Constraint::ElementVar { .. } => "element_var",
            Constraint::Table { .. } => "table",
            Constraint::AllDifferentExcept { .. } => "all_different_except",
            Constraint::SubCircuit { .. } => "sub_circuit",
            Constraint::Occurs { .. } => "occurs",
            Constraint::Maximum { .. } => "maximum",
            Constraint::Decreasing { .. } => "decreasing",
            Constraint::AllOf(_) => "all_of",
            Constraint::AnyOf(_) => "any_of",
            Constraint::IfThen { .. } => "if_then",
            Constraint::Reified { .. } => "reified",
        }
    }
}

/// Expression defining a variable from earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 1 iff the constraint holds.
    Reified(Constraint),
    /// `Σ coef·var + constant`.
    Linear {
        terms: Vec<(i64, IntVar)>,
        constant: i64,
    },
    Product(IntVar, IntVar),
    Quotient(IntVar, IntVar),
    Element {
        index: IntVar,
        array: Vec<i64>,
        offset: i64,
    },
    ElementVar {
        index: IntVar,
        array: Vec<IntVar>,
        offset: i64,
    },
    /// Last column of the first row matching `inputs`.
    Lookup { table: TableId, inputs: Vec<IntVar> },
    Max(Vec<IntVar>),
}

/// A variable together with the expression that defines it.
#[derive(Debug, Clone)]
pub struct Definition {
    pub target: IntVar,
    pub expr: Expr,
}

/// A constraint tagged with the scope that posted it.
#[derive(Debug, Clone)]
pub struct Posted {
    pub constraint: Constraint,
    pub scope: &'static str,
}

/// Objective function for the CP model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Minimize(IntVar),
    Maximize(IntVar),
}

impl Objective {
    pub fn var(&self) -> IntVar {
        match *self {
            Objective::Minimize(v) | Objective::Maximize(v) => v,
        }
    }
}

/// A constraint programming model.
///
/// Holds variable declarations, shared tuple sets, constraints and an
/// optional objective. Variables are declared through the model and
/// referred to by the handles it returns.
///
/// # Examples
///
/// ```
/// use u_liner::cp::{Constraint, CpModel, Domain, Rel};
///
/// let mut model = CpModel::new("example");
/// let x = model.int_var("x", Domain::range(0, 9)).unwrap();
/// let y = model.int_var("y", Domain::range(0, 9)).unwrap();
/// model.post(Constraint::vars(x, Rel::Lt, y));
/// model.maximize(x);
/// assert!(model.validate().is_ok());
/// assert_eq!(model.var_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    vars: Vec<VarDecl>,
    names: HashMap<String, IntVar>,
    groups: Vec<VarGroup>,
    tables: Vec<Tuples>,
    constraints: Vec<Posted>,
    definitions: Vec<Definition>,
    constants: HashMap<i64, IntVar>,
    objective: Option<Objective>,
    scope: &'static str,
    next_aux: usize,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            names: HashMap::new(),
            groups: Vec::new(),
            tables: Vec::new(),
            constraints: Vec::new(),
            definitions: Vec::new(),
            constants: HashMap::new(),
            objective: None,
            scope: "model",
            next_aux: 0,
        }
    }

    // ---- declarations ----

    fn declare(
        &mut self,
        name: String,
        domain: Domain,
        kind: VarKind,
        auxiliary: bool,
    ) -> Result<IntVar> {
        if domain.is_empty() {
            return Err(ModelError::EmptyDomain(name));
        }
        if self.names.contains_key(&name) {
            return Err(ModelError::DuplicateVariable(name));
        }
        let var = IntVar(self.vars.len());
        self.names.insert(name.clone(), var);
        self.vars.push(VarDecl {
            name,
            domain,
            kind,
            auxiliary,
        });
        Ok(var)
    }

    fn aux_name(&mut self) -> String {
        let name = format!("aux_{}", self.next_aux);
        self.next_aux += 1;
        name
    }

    /// Declares an integer variable.
    pub fn int_var(&mut self, name: impl Into<String>, domain: Domain) -> Result<IntVar> {
        self.declare(name.into(), domain, VarKind::Int, false)
    }

    /// Declares a 0/1 variable.
    pub fn bool_var(&mut self, name: impl Into<String>) -> Result<BoolVar> {
        self.declare(name.into(), Domain::boolean(), VarKind::Bool, false)
            .map(BoolVar)
    }

    /// A fixed variable holding `value`; one per distinct value.
    pub fn constant(&mut self, value: i64) -> Result<IntVar> {
        if let Some(&v) = self.constants.get(&value) {
            return Ok(v);
        }
        let var = self.declare(
            format!("const_{value}"),
            Domain::singleton(value),
            VarKind::Int,
            true,
        )?;
        self.constants.insert(value, var);
        Ok(var)
    }

    /// Declares `name[i]` for `i < n` and records the group.
    pub fn int_array(
        &mut self,
        name: &str,
        n: usize,
        mut domain: impl FnMut(usize) -> Domain,
    ) -> Result<Vec<IntVar>> {
        let vars = (0..n)
            .map(|i| self.int_var(format!("{name}[{i}]"), domain(i)))
            .collect::<Result<Vec<_>>>()?;
        self.record_group(name, VarKind::Int, Shape::D1(n), vars.clone());
        Ok(vars)
    }

    /// Declares `name[i][j]` and records the group.
    pub fn int_matrix(
        &mut self,
        name: &str,
        n: usize,
        m: usize,
        mut domain: impl FnMut(usize, usize) -> Domain,
    ) -> Result<Vec<Vec<IntVar>>> {
        let mut rows = Vec::with_capacity(n);
        for i in 0..n {
            let row = (0..m)
                .map(|j| self.int_var(format!("{name}[{i}][{j}]"), domain(i, j)))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        let flat = rows.iter().flatten().copied().collect();
        self.record_group(name, VarKind::Int, Shape::D2(n, m), flat);
        Ok(rows)
    }

    /// Declares `name[i][j][k]` and records the group.
    pub fn int_cube(
        &mut self,
        name: &str,
        (a, b, c): (usize, usize, usize),
        mut domain: impl FnMut(usize, usize, usize) -> Domain,
    ) -> Result<Vec<Vec<Vec<IntVar>>>> {
        let mut cube = Vec::with_capacity(a);
        for i in 0..a {
            let mut plane = Vec::with_capacity(b);
            for j in 0..b {
                let row = (0..c)
                    .map(|k| self.int_var(format!("{name}[{i}][{j}][{k}]"), domain(i, j, k)))
                    .collect::<Result<Vec<_>>>()?;
                plane.push(row);
            }
            cube.push(plane);
        }
        let flat = cube.iter().flatten().flatten().copied().collect();
        self.record_group(name, VarKind::Int, Shape::D3(a, b, c), flat);
        Ok(cube)
    }

    /// Declares a 3-D array of 0/1 variables.
    pub fn bool_cube(
        &mut self,
        name: &str,
        (a, b, c): (usize, usize, usize),
    ) -> Result<Vec<Vec<Vec<BoolVar>>>> {
        let mut cube = Vec::with_capacity(a);
        for i in 0..a {
            let mut plane = Vec::with_capacity(b);
            for j in 0..b {
                let row = (0..c)
                    .map(|k| self.bool_var(format!("{name}[{i}][{j}][{k}]")))
                    .collect::<Result<Vec<_>>>()?;
                plane.push(row);
            }
            cube.push(plane);
        }
        let flat = cube.iter().flatten().flatten().map(|b| b.int()).collect();
        self.record_group(name, VarKind::Bool, Shape::D3(a, b, c), flat);
        Ok(cube)
    }

    /// Records an export group over already declared variables.
    pub fn record_group(&mut self, name: &str, kind: VarKind, shape: Shape, vars: Vec<IntVar>) {
        self.groups.push(VarGroup {
            name: name.to_string(),
            kind,
            shape,
            vars,
        });
    }

    // ---- functional definitions ----

    /// Declares a variable defined by `expr`, with a domain derived from
    /// the operands' bounds, and posts the defining constraint.
    pub fn define(&mut self, name: Option<String>, expr: Expr) -> Result<IntVar> {
        let domain = self.expr_bounds(&expr)?;
        self.define_in(name, domain, expr)
    }

    /// Like [`define`](Self::define) with an explicit domain.
    pub fn define_in(&mut self, name: Option<String>, domain: Domain, expr: Expr) -> Result<IntVar> {
        let kind = if matches!(expr, Expr::Reified(_)) {
            VarKind::Bool
        } else {
            VarKind::Int
        };
        let target = match name {
            Some(n) => self.declare(n, domain, kind, false)?,
            None => {
                let n = self.aux_name();
                self.declare(n, domain, kind, true)?
            }
        };
        let constraint = match &expr {
            Expr::Reified(c) => Constraint::Reified {
                inner: Box::new(c.clone()),
                flag: BoolVar(target),
            },
            Expr::Linear { terms, constant } => {
                let mut t = terms.clone();
                t.push((-1, target));
                Constraint::Linear {
                    terms: t,
                    rel: Rel::Eq,
                    rhs: -constant,
                }
            }
            Expr::Product(x, y) => Constraint::Times {
                x: *x,
                y: *y,
                z: target,
            },
            Expr::Quotient(x, y) => Constraint::Div {
                x: *x,
                y: *y,
                z: target,
            },
            Expr::Element {
                index,
                array,
                offset,
            } => Constraint::Element {
                index: *index,
                array: array.clone(),
                value: target,
                offset: *offset,
            },
            Expr::ElementVar {
                index,
                array,
                offset,
            } => Constraint::ElementVar {
                index: *index,
                array: array.clone(),
                value: target,
                offset: *offset,
            },
            Expr::Lookup { table, inputs } => {
                let mut vars = inputs.clone();
                vars.push(target);
                Constraint::Table {
                    vars,
                    table: *table,
                }
            }
            Expr::Max(vars) => Constraint::Maximum {
                max: target,
                vars: vars.clone(),
            },
        };
        self.post(constraint);
        self.definitions.push(Definition { target, expr });
        Ok(target)
    }

    /// Auxiliary 0/1 variable equal to the truth value of `c`.
    pub fn reify(&mut self, c: Constraint) -> Result<BoolVar> {
        self.define_in(None, Domain::boolean(), Expr::Reified(c))
            .map(BoolVar)
    }

    /// Auxiliary variable equal to `x · y`.
    pub fn product(&mut self, x: IntVar, y: IntVar) -> Result<IntVar> {
        self.define(None, Expr::Product(x, y))
    }

    /// Bounds of an expression from its operands' declared domains.
    pub fn expr_bounds(&self, expr: &Expr) -> Result<Domain> {
        match expr {
            Expr::Reified(_) => Ok(Domain::boolean()),
            Expr::Linear { terms, constant } => {
                let (lo, hi) = self.linear_bounds(terms)?;
                Ok(Domain::range(lo + constant, hi + constant))
            }
            Expr::Product(x, y) => {
                let (xl, xh) = self.bounds(*x)?;
                let (yl, yh) = self.bounds(*y)?;
                let corners = [xl * yl, xl * yh, xh * yl, xh * yh];
                Ok(Domain::range(
                    corners.iter().copied().min().unwrap_or(0),
                    corners.iter().copied().max().unwrap_or(0),
                ))
            }
            Expr::Quotient(x, y) => {
                let (xl, xh) = self.bounds(*x)?;
                let ydom = self.domain(*y)?;
                let mut divisors: Vec<i64> = [ydom.min(), ydom.max()].into_iter().flatten().collect();
                divisors.extend([-1, 1].into_iter().filter(|d| ydom.contains(*d)));
                divisors.retain(|&d| d != 0);
                let quotients: Vec<i64> = divisors
                    .iter()
                    .flat_map(|&d| [xl / d, xh / d])
                    .collect();
                match (quotients.iter().min(), quotients.iter().max()) {
                    (Some(&lo), Some(&hi)) => Ok(Domain::range(lo, hi)),
                    _ => Err(ModelError::Evaluation {
                        name: self.var_name(*y).to_string(),
                        message: "divisor can only be zero".into(),
                    }),
                }
            }
            Expr::Element { array, .. } => Ok(Domain::from_values(array.iter().copied())),
            Expr::ElementVar { array, .. } => {
                let mut out = Domain::empty();
                for &v in array {
                    out = out.union(self.domain(v)?);
                }
                Ok(out)
            }
            Expr::Lookup { table, .. } => {
                let t = self.tuples(*table)?;
                Ok(t.column(t.arity().saturating_sub(1)))
            }
            Expr::Max(vars) => {
                let mut lo = i64::MIN;
                let mut hi = i64::MIN;
                for &v in vars {
                    let (l, h) = self.bounds(v)?;
                    lo = lo.max(l);
                    hi = hi.max(h);
                }
                Ok(Domain::range(lo, hi))
            }
        }
    }

    /// `[Σ min(coef·var), Σ max(coef·var)]` over the declared domains.
    pub fn linear_bounds(&self, terms: &[(i64, IntVar)]) -> Result<(i64, i64)> {
        let mut lo = 0i64;
        let mut hi = 0i64;
        for &(c, v) in terms {
            let (l, h) = self.bounds(v)?;
            let (a, b) = (c * l, c * h);
            lo += a.min(b);
            hi += a.max(b);
        }
        Ok((lo, hi))
    }

    // ---- tables, constraints, objective ----

    /// Stores a tuple set and returns its handle.
    pub fn add_table(&mut self, tuples: Tuples) -> TableId {
        self.tables.push(tuples);
        TableId(self.tables.len() - 1)
    }

    /// Posts a constraint under the current scope.
    pub fn post(&mut self, constraint: Constraint) {
        self.constraints.push(Posted {
            constraint,
            scope: self.scope,
        });
    }

    /// Sets the scope recorded on subsequently posted constraints.
    pub fn set_scope(&mut self, scope: &'static str) {
        self.scope = scope;
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn maximize(&mut self, var: IntVar) {
        self.objective = Some(Objective::Maximize(var));
    }

    pub fn minimize(&mut self, var: IntVar) {
        self.objective = Some(Objective::Minimize(var));
    }

    // ---- queries ----

    pub fn decl(&self, var: IntVar) -> Result<&VarDecl> {
        self.vars
            .get(var.0)
            .ok_or(ModelError::UnknownVariable(var.0))
    }

    pub fn domain(&self, var: IntVar) -> Result<&Domain> {
        self.decl(var).map(|d| &d.domain)
    }

    /// `(min, max)` of the declared domain.
    pub fn bounds(&self, var: IntVar) -> Result<(i64, i64)> {
        let d = self.domain(var)?;
        match (d.min(), d.max()) {
            (Some(lo), Some(hi)) => Ok((lo, hi)),
            _ => Err(ModelError::EmptyDomain(self.var_name(var).to_string())),
        }
    }

    /// Name of a variable, or `"?"` for a foreign handle.
    pub fn var_name(&self, var: IntVar) -> &str {
        self.vars.get(var.0).map_or("?", |d| d.name.as_str())
    }

    /// Looks a variable up by name.
    pub fn var_by_name(&self, name: &str) -> Option<IntVar> {
        self.names.get(name).copied()
    }

    pub fn tuples(&self, table: TableId) -> Result<&Tuples> {
        self.tables
            .get(table.0)
            .ok_or(ModelError::UnknownTable(table.0))
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn groups(&self) -> &[VarGroup] {
        &self.groups
    }

    pub fn constraints(&self) -> &[Posted] {
        &self.constraints
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn objective(&self) -> Option<Objective> {
        self.objective
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of constraints posted under `scope`.
    pub fn constraints_in(&self, scope: &str) -> usize {
        self.constraints.iter().filter(|p| p.scope == scope).count()
    }

    /// Validates every handle and table reference.
    pub fn validate(&self) -> Result<()> {
        let n = self.vars.len();
        let mut bad = None;
        for posted in &self.constraints {
            posted.constraint.for_each_var(&mut |v| {
                if v.0 >= n {
                    bad = Some(v.0);
                }
            });
            if let Some(i) = bad {
                return Err(ModelError::UnknownVariable(i));
            }
            self.validate_tables(&posted.constraint)?;
        }
        if let Some(obj) = self.objective {
            self.decl(obj.var())?;
        }
        Ok(())
    }

    fn validate_tables(&self, c: &Constraint) -> Result<()> {
        match c {
            Constraint::Table { vars, table } => {
                let t = self.tuples(*table)?;
                if t.arity() != vars.len() {
                    return Err(ModelError::TableArity {
                        expected: t.arity(),
                        actual: vars.len(),
                    });
                }
                Ok(())
            }
            Constraint::AllOf(cs) | Constraint::AnyOf(cs) => {
                cs.iter().try_for_each(|c| self.validate_tables(c))
            }
            Constraint::IfThen { condition, then } => {
                self.validate_tables(condition)?;
                self.validate_tables(then)
            }
            Constraint::Reified { inner, .. } => self.validate_tables(inner),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_variable_rejected() {
        let mut m = CpModel::new("t");
        m.int_var("x", Domain::range(0, 3)).unwrap();
        let err = m.int_var("x", Domain::range(0, 3)).unwrap_err();
        assert_eq!(err, ModelError::DuplicateVariable("x".into()));
    }

    #[test]
    fn test_empty_domain_rejected() {
        let mut m = CpModel::new("t");
        assert!(matches!(
            m.int_var("x", Domain::empty()),
            Err(ModelError::EmptyDomain(_))
        ));
    }

    #[test]
    fn test_matrix_registers_group() {
        let mut m = CpModel::new("t");
        let x = m.int_matrix("x", 2, 3, |i, j| Domain::range(0, (i + j) as i64)).unwrap();
        assert_eq!(x.len(), 2);
        assert_eq!(x[1].len(), 3);
        assert_eq!(m.var_name(x[1][2]), "x[1][2]");
        let g = &m.groups()[0];
        assert_eq!(g.shape, Shape::D2(2, 3));
        assert_eq!(g.vars[5], x[1][2]);
        assert_eq!(m.var_by_name("x[0][1]"), Some(x[0][1]));
    }

    #[test]
    fn test_constants_are_shared() {
        let mut m = CpModel::new("t");
        let a = m.constant(0).unwrap();
        let b = m.constant(0).unwrap();
        assert_eq!(a, b);
        assert!(m.decl(a).unwrap().auxiliary);
    }

    #[test]
    fn test_define_linear_bounds() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 10)).unwrap();
        let y = m.int_var("y", Domain::range(-2, 3)).unwrap();
        let z = m
            .define(
                Some("z".into()),
                Expr::Linear {
                    terms: vec![(2, x), (-1, y)],
                    constant: 1,
                },
            )
            .unwrap();
        assert_eq!(m.bounds(z).unwrap(), (-2, 23));
        assert_eq!(m.definitions().len(), 1);
        assert_eq!(m.constraint_count(), 1);
    }

    #[test]
    fn test_product_bounds() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(-3, 2)).unwrap();
        let y = m.int_var("y", Domain::range(1, 4)).unwrap();
        let p = m.product(x, y).unwrap();
        assert_eq!(m.bounds(p).unwrap(), (-12, 8));
    }

    #[test]
    fn test_tuples_lookup_with_wildcard() {
        let mut t = Tuples::new(3);
        t.push_pattern(vec![Some(0), None, Some(0)]).unwrap();
        t.push(&[5, 1, 7]).unwrap();
        assert_eq!(t.lookup(&[0, 42]), Some(0));
        assert_eq!(t.lookup(&[5, 1]), Some(7));
        assert_eq!(t.lookup(&[5, 2]), None);
        assert!(t.matches(&[0, 9, 0]));
        assert!(t.push(&[1, 2]).is_err());
        assert_eq!(t.column(2), Domain::from_values([0, 7]));
    }

    #[test]
    fn test_scope_recorded() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 3)).unwrap();
        m.set_scope("rotation");
        m.post(Constraint::eq(x, 1));
        m.set_scope("time");
        m.post(Constraint::ne(x, 2));
        assert_eq!(m.constraints_in("rotation"), 1);
        assert_eq!(m.constraints()[1].scope, "time");
    }

    #[test]
    fn test_validate_table_arity() {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 3)).unwrap();
        let t = m.add_table(Tuples::new(2));
        m.post(Constraint::Table {
            vars: vec![x],
            table: t,
        });
        assert!(matches!(m.validate(), Err(ModelError::TableArity { .. })));
    }
}
