//! Wires the submodels into one network design model.

use super::cargo_flow::CargoFlow;
use super::cargo_rotation::CargoRotation;
use super::config::ModelConfig;
use super::context::{Dimensions, ModelContext};
use super::cost::Cost;
use super::export::{export, ResultRecord};
use super::feature::Feature;
use super::load::Load;
use super::objective::Objective;
use super::precompute::Precomputed;
use super::rotation::Rotation;
use super::submodel::compose;
use super::symmetry::SymmetryConstraints;
use super::time::Time;
use super::transit_time::TransitTime;
use super::vessel_availability::VesselAvailability;
use crate::cp::{
    Assignment, CertifyingSolver, CpModel, CpSolution, CpSolver, IntVar, SearchOrder,
    SolverConfig, SolverStatus, Violation,
};
use crate::error::Result;
use crate::instance::Instance;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{info, warn};

/// A complete LSNDP model with handles to every submodel.
///
/// # Examples
///
/// ```no_run
/// use u_liner::instance::Instance;
/// use u_liner::network::{ModelConfig, NetworkModel};
///
/// # fn load() -> Instance { unimplemented!() }
/// let instance = load();
/// let model = NetworkModel::build(&instance, ModelConfig::default().with_rotations(2))?;
/// println!("{} variables", model.model().var_count());
/// # Ok::<(), u_liner::error::ModelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NetworkModel {
    model: CpModel,
    config: ModelConfig,
    dims: Dimensions,
    pre: Precomputed,
    pub rotation: Rotation,
    pub cargo_flow: CargoFlow,
    pub feature: Feature,
    pub load: Load,
    pub time: Time,
    pub transit_time: TransitTime,
    pub vessel_availability: VesselAvailability,
    pub cost: Cost,
    pub objective: Objective,
}

impl NetworkModel {
    /// Validates the inputs and composes every submodel in dependency
    /// order.
    pub fn build(instance: &Instance, config: ModelConfig) -> Result<Self> {
        let mut ctx = ModelContext::new(instance, config)?;
        let c = &mut ctx;

        let rotation = compose::<Rotation>(c, ())?;
        let cargo_flow = compose::<CargoFlow>(c, &rotation)?;
        compose::<CargoRotation>(c, (&rotation, &cargo_flow))?;
        let feature = compose::<Feature>(c, &rotation)?;
        let load = compose::<Load>(c, (&rotation, &cargo_flow, &feature))?;
        let time = compose::<Time>(c, (&rotation, &cargo_flow, &feature, &load))?;
        let transit_time = compose::<TransitTime>(c, (&rotation, &cargo_flow, &time))?;
        let vessel_availability =
            compose::<VesselAvailability>(c, (&rotation, &feature, &time))?;
        let cost = compose::<Cost>(c, (&rotation, &cargo_flow, &feature, &time))?;
        let objective =
            compose::<Objective>(c, (&cargo_flow, &feature, &vessel_availability, &cost))?;
        compose::<SymmetryConstraints>(c, (&rotation, &time))?;

        ctx.model.validate()?;
        info!(
            variables = ctx.model.var_count(),
            constraints = ctx.model.constraint_count(),
            tables = ctx.model.table_count(),
            rotations = ctx.dims.rotations,
            commodities = ctx.dims.commodities,
            "network model built"
        );

        let ModelContext {
            model,
            config,
            dims,
            pre,
            ..
        } = ctx;
        Ok(Self {
            model,
            config,
            dims,
            pre,
            rotation,
            cargo_flow,
            feature,
            load,
            time,
            transit_time,
            vessel_availability,
            cost,
            objective,
        })
    }

    pub fn model(&self) -> &CpModel {
        &self.model
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Instance-derived tables the model was sized from.
    pub fn precomputed(&self) -> &Precomputed {
        &self.pre
    }

    /// Fills every derived variable of `values`; the decision variables
    /// must already be set.
    pub fn complete(&self, values: &mut Assignment) -> Result<()> {
        self.model.complete(values)
    }

    /// Every violation of a complete assignment.
    pub fn check(&self, values: &Assignment) -> Result<Vec<Violation>> {
        self.model.check(values)
    }

    /// Solves with `solver` and certifies what it returns.
    ///
    /// When `config` names no search order, the default decision order is
    /// used.
    pub fn solve<S: CpSolver>(&self, solver: &S, config: &SolverConfig) -> CpSolution {
        if let Err(message) = config.validate() {
            warn!(%message, "rejecting solver configuration");
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }
        let mut config = config.clone();
        if config.search_orders.is_empty() {
            config.search_orders.push(self.decision_order());
        }
        let solution = CertifyingSolver::new(solver).solve(&self.model, &config);
        info!(
            status = ?solution.status,
            objective = ?solution.objective_value,
            time_ms = solution.stats.solve_time_ms,
            "solve finished"
        );
        solution
    }

    /// Named variable arrays with their values.
    pub fn export(&self, values: &Assignment) -> Result<Vec<ResultRecord>> {
        export(&self.model, values)
    }

    /// Profit under `values`.
    pub fn objective_value(&self, values: &Assignment) -> Option<i64> {
        values.get(self.objective.profit)
    }

    /// Branching order: vessel types, successors, accepted flags, cargo
    /// legs, speeds, then every other decision variable.
    pub fn decision_order(&self) -> SearchOrder {
        let mut vars: Vec<IntVar> = Vec::new();
        vars.extend(&self.rotation.vessel);
        vars.extend(self.rotation.succ.iter().flatten());
        vars.extend(self.cargo_flow.accepted.iter().map(|b| b.int()));
        vars.extend(self.cargo_flow.rot.iter().flatten());
        vars.extend(self.cargo_flow.port.iter().flatten());
        vars.extend(&self.cargo_flow.hops);
        vars.extend(self.time.speed.iter().flatten());

        let mut seen: HashSet<IntVar> = vars.iter().copied().collect();
        let defined: HashSet<IntVar> = self.model.definitions().iter().map(|d| d.target).collect();
        for (i, decl) in self.model.vars().iter().enumerate() {
            let v = IntVar(i);
            if decl.auxiliary || decl.is_fixed() || defined.contains(&v) {
                continue;
            }
            if seen.insert(v) {
                vars.push(v);
            }
        }
        SearchOrder {
            name: "default".into(),
            vars,
        }
    }

    /// The default order followed by `count - 1` seeded shuffles of it.
    ///
    /// The same `(count, seed)` always yields the same orders.
    pub fn search_portfolio(&self, count: usize, seed: u64) -> Vec<SearchOrder> {
        let base = self.decision_order();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut orders = Vec::with_capacity(count);
        for i in 1..count {
            let mut vars = base.vars.clone();
            vars.shuffle(&mut rng);
            orders.push(SearchOrder {
                name: format!("shuffle_{i}"),
                vars,
            });
        }
        if count > 0 {
            orders.insert(0, base);
        }
        orders
    }
}
