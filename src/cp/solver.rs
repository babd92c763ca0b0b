//! CP solver interface and solution certification.

use super::check::Assignment;
use super::model::CpModel;
use super::variables::IntVar;
use tracing::{debug, warn};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible solution found; optimality not proven (for instance the
    /// best solution at timeout).
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid, or the returned assignment failed certification.
    ModelInvalid,
    /// Time limit reached without any solution.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

/// Search statistics reported by an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
    pub nodes: u64,
    pub failures: u64,
    /// Number of improving solutions found.
    pub solutions: u64,
}

/// Solution from a CP solver.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value (if any).
    pub objective_value: Option<i64>,
    /// Best assignment found, indexed by variable handle.
    pub assignment: Option<Assignment>,
    pub stats: SolverStats,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            assignment: None,
            stats: SolverStats::default(),
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
            && self.assignment.is_some()
    }

    /// Value of one variable in the returned assignment.
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.assignment.as_ref().and_then(|a| a.get(var))
    }
}

/// A named variable ordering handed to the engine's branching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOrder {
    pub name: String,
    pub vars: Vec<IntVar>,
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: i64,
    /// Number of parallel workers.
    pub num_workers: usize,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
    /// Search orders; a portfolio engine runs one per worker.
    pub search_orders: Vec<SearchOrder>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 60_000,
            num_workers: 1,
            stop_after_first: false,
            search_orders: Vec::new(),
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit_ms(mut self, ms: i64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }

    pub fn with_search_orders(mut self, orders: Vec<SearchOrder>) -> Self {
        self.search_orders = orders;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_limit_ms <= 0 {
            return Err("time_limit_ms must be positive".into());
        }
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        Ok(())
    }
}

/// Trait for CP solver implementations.
///
/// Implementors wrap an external propagation and search engine. The
/// model only describes variables, constraints and the objective.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

impl<S: CpSolver + ?Sized> CpSolver for &S {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        (**self).solve(model, config)
    }
}

/// Wraps an engine and re-checks every returned assignment against the
/// model.
///
/// A solution that violates a constraint, leaves a variable unassigned, or
/// reports an objective value different from the objective variable's
/// value is downgraded to [`SolverStatus::ModelInvalid`].
#[derive(Debug, Clone)]
pub struct CertifyingSolver<S> {
    inner: S,
}

impl<S: CpSolver> CertifyingSolver<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: CpSolver> CpSolver for CertifyingSolver<S> {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let mut solution = self.inner.solve(model, config);
        let Some(assignment) = solution.assignment.as_ref() else {
            return solution;
        };
        match model.check(assignment) {
            Ok(violations) if violations.is_empty() => {
                let reported = model.objective_value(assignment);
                if solution.objective_value.is_some() && reported != solution.objective_value {
                    warn!(
                        reported = ?solution.objective_value,
                        actual = ?reported,
                        "objective value does not match the assignment"
                    );
                    solution.status = SolverStatus::ModelInvalid;
                } else {
                    debug!(status = ?solution.status, "solution certified");
                }
            }
            Ok(violations) => {
                warn!(
                    count = violations.len(),
                    first = ?violations.first(),
                    "solution violates the model"
                );
                solution.status = SolverStatus::ModelInvalid;
            }
            Err(err) => {
                warn!(error = %err, "solution could not be checked");
                solution.status = SolverStatus::ModelInvalid;
            }
        }
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Constraint, Domain, Rel};

    struct Fixed(Vec<i64>, Option<i64>);

    impl CpSolver for Fixed {
        fn solve(&self, _model: &CpModel, _config: &SolverConfig) -> CpSolution {
            CpSolution {
                status: SolverStatus::Optimal,
                objective_value: self.1,
                assignment: Some(Assignment::from_values(self.0.clone())),
                stats: SolverStats {
                    solutions: 1,
                    ..SolverStats::default()
                },
            }
        }
    }

    fn model() -> CpModel {
        let mut m = CpModel::new("t");
        let x = m.int_var("x", Domain::range(0, 5)).unwrap();
        let y = m.int_var("y", Domain::range(0, 5)).unwrap();
        m.post(Constraint::vars(x, Rel::Lt, y));
        m.maximize(y);
        m
    }

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, 60_000);
        assert!(config.validate().is_ok());
        assert!(config.with_workers(0).validate().is_err());
    }

    #[test]
    fn test_certified_solution_kept() {
        let solver = CertifyingSolver::new(Fixed(vec![1, 5], Some(5)));
        let sol = solver.solve(&model(), &SolverConfig::default());
        assert_eq!(sol.status, SolverStatus::Optimal);
        assert!(sol.is_solution_found());
    }

    #[test]
    fn test_violating_solution_downgraded() {
        let solver = CertifyingSolver::new(Fixed(vec![4, 2], Some(2)));
        let sol = solver.solve(&model(), &SolverConfig::default());
        assert_eq!(sol.status, SolverStatus::ModelInvalid);
        assert!(!sol.is_solution_found());
    }

    #[test]
    fn test_wrong_objective_downgraded() {
        let solver = CertifyingSolver::new(Fixed(vec![1, 5], Some(4)));
        let sol = solver.solve(&model(), &SolverConfig::default());
        assert_eq!(sol.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_incomplete_solution_downgraded() {
        let solver = CertifyingSolver::new(Fixed(vec![1], None));
        let sol = solver.solve(&model(), &SolverConfig::default());
        assert_eq!(sol.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_empty_solution_passes_through() {
        let sol = CpSolution::empty(SolverStatus::Timeout);
        assert!(!sol.is_solution_found());
        assert_eq!(sol.value(IntVar(0)), None);
    }
}
