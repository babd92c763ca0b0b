//! Constraint Programming (CP) modelling layer.
//!
//! Describes integer and boolean variables, shared tuple sets, constraints
//! and an objective, in the shape an external propagation engine consumes.
//!
//! # Key Components
//!
//! - **Domains**: [`Domain`], sorted disjoint integer ranges
//! - **Variables**: [`IntVar`] and [`BoolVar`], typed handles returned at declaration
//! - **Constraints**: [`Constraint`] (clause, linear, table, element, sub-circuit, etc.)
//! - **Model**: [`CpModel`] holding variables, tables, constraints and the objective
//! - **Clause encoder**: [`admissible_range`] and [`Cond`], relational
//!   conditions posted as clauses instead of reified auxiliaries
//! - **Checker**: [`CpModel::check`] evaluates a complete [`Assignment`]
//! - **Solver**: the [`CpSolver`] trait, implemented by engine adapters
//!
//! # Design
//!
//! This module defines the modelling layer only. It does NOT include a
//! propagation engine or a search procedure. The [`CpSolver`] trait lets an
//! external engine be plugged in; [`CertifyingSolver`] re-checks what it
//! returns.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod check;
mod clause;
mod domain;
mod model;
mod solver;
mod variables;

pub use check::{sub_circuit_length, Assignment, Violation};
pub use clause::{admissible_range, Cond, Rel, MAX_CLAUSE_ARITY};
pub use domain::Domain;
pub use model::{
    Constraint, CpModel, Definition, Expr, Literal, Objective, Posted, TableId, Tuples,
};
pub use solver::{
    CertifyingSolver, CpSolution, CpSolver, SearchOrder, SolverConfig, SolverStats, SolverStatus,
};
pub use variables::{BoolVar, IntVar, Shape, VarDecl, VarGroup, VarKind};
