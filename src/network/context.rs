//! Shared state handed to every submodel.

use super::config::ModelConfig;
use super::precompute::Precomputed;
use crate::cp::{BoolVar, Constraint, CpModel, Domain, Expr, IntVar, Shape, VarKind};
use crate::error::{ModelError, Result};
use crate::instance::Instance;

/// Sizes of the model's index spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub ports: usize,
    pub canals: usize,
    /// Ports plus both copies of every canal.
    pub locations: usize,
    pub rotations: usize,
    pub commodities: usize,
    /// Commodities with a transit-time bound; a prefix of all commodities.
    pub with_transit_time: usize,
    pub vessel_types: usize,
    /// Transshipments allowed per commodity.
    pub tsmax: usize,
}

/// The model under construction together with everything needed to size
/// its variables.
#[derive(Debug)]
pub struct ModelContext<'i> {
    pub model: CpModel,
    pub instance: &'i Instance,
    pub config: ModelConfig,
    pub dims: Dimensions,
    pub pre: Precomputed,
}

impl<'i> ModelContext<'i> {
    /// Validates `config` and `instance` and runs the precomputation.
    pub fn new(instance: &'i Instance, config: ModelConfig) -> Result<Self> {
        config.validate().map_err(ModelError::InvalidConfig)?;
        check_instance(instance)?;
        let pre = Precomputed::compute(instance, &config)?;
        let dims = Dimensions {
            ports: instance.ports().len(),
            canals: instance.canals().len(),
            locations: pre.locations.len(),
            rotations: config.rotations,
            commodities: instance.commodities().len(),
            with_transit_time: instance.commodities_with_transit_time(),
            vessel_types: instance.vessel_types().len(),
            tsmax: config.max_transshipments,
        };
        Ok(Self {
            model: CpModel::new("lsndp"),
            instance,
            config,
            dims,
            pre,
        })
    }

    /// Upper bound on every clock time.
    pub fn hmax(&self) -> i64 {
        self.config.max_rotation_hours
    }

    pub fn is_port(&self, p: usize) -> bool {
        self.pre.locations.is_port(p)
    }

    /// Shared constant variable.
    pub fn constant(&mut self, value: i64) -> Result<IntVar> {
        self.model.constant(value)
    }

    /// `0..=hmax`.
    pub fn time_domain(&self) -> Domain {
        Domain::range(0, self.hmax())
    }

    /// Named 0/1 variable equal to the truth value of `c`.
    pub fn define_bool(&mut self, name: String, c: Constraint) -> Result<BoolVar> {
        self.model
            .define_in(Some(name), Domain::boolean(), Expr::Reified(c))
            .map(BoolVar)
    }

    /// `name[i]` defined by `expr(ctx, i)`, recorded as an export group.
    pub fn define_array(
        &mut self,
        name: &str,
        n: usize,
        mut expr: impl FnMut(&mut Self, usize) -> Result<Expr>,
    ) -> Result<Vec<IntVar>> {
        let mut vars = Vec::with_capacity(n);
        for i in 0..n {
            let e = expr(self, i)?;
            vars.push(self.model.define(Some(format!("{name}[{i}]")), e)?);
        }
        self.model
            .record_group(name, VarKind::Int, Shape::D1(n), vars.clone());
        Ok(vars)
    }

    /// `name[i][j]` defined by `expr(ctx, i, j)`, recorded as an export
    /// group of the given kind.
    pub fn define_matrix(
        &mut self,
        name: &str,
        (n, m): (usize, usize),
        kind: VarKind,
        mut expr: impl FnMut(&mut Self, usize, usize) -> Result<Expr>,
    ) -> Result<Vec<Vec<IntVar>>> {
        let mut rows = Vec::with_capacity(n);
        for i in 0..n {
            let mut row = Vec::with_capacity(m);
            for j in 0..m {
                let e = expr(self, i, j)?;
                row.push(self.model.define(Some(format!("{name}[{i}][{j}]")), e)?);
            }
            rows.push(row);
        }
        let flat = rows.iter().flatten().copied().collect();
        self.model.record_group(name, kind, Shape::D2(n, m), flat);
        Ok(rows)
    }

    /// `name[i][j][k]` defined by `expr(ctx, i, j, k)`.
    pub fn define_cube(
        &mut self,
        name: &str,
        (a, b, c): (usize, usize, usize),
        kind: VarKind,
        mut expr: impl FnMut(&mut Self, usize, usize, usize) -> Result<Expr>,
    ) -> Result<Vec<Vec<Vec<IntVar>>>> {
        let mut cube = Vec::with_capacity(a);
        for i in 0..a {
            let mut plane = Vec::with_capacity(b);
            for j in 0..b {
                let mut row = Vec::with_capacity(c);
                for k in 0..c {
                    let e = expr(self, i, j, k)?;
                    row.push(
                        self.model
                            .define(Some(format!("{name}[{i}][{j}][{k}]")), e)?,
                    );
                }
                plane.push(row);
            }
            cube.push(plane);
        }
        let flat = cube.iter().flatten().flatten().copied().collect();
        self.model.record_group(name, kind, Shape::D3(a, b, c), flat);
        Ok(cube)
    }

    /// Auxiliary `Σ coef·var` with bounds taken from the operands.
    pub fn sum_of(&mut self, terms: Vec<(i64, IntVar)>) -> Result<IntVar> {
        self.model.define(None, Expr::Linear { terms, constant: 0 })
    }
}

fn check_instance(instance: &Instance) -> Result<()> {
    if instance.ports().len() < 2 {
        return Err(ModelError::InvalidInstance(format!(
            "at least 2 ports are needed, got {}",
            instance.ports().len()
        )));
    }
    if instance.vessel_types().is_empty() {
        return Err(ModelError::InvalidInstance("no vessel type".into()));
    }
    if let Some(v) = instance
        .vessel_types()
        .iter()
        .find(|v| v.primary_fuel().is_none())
    {
        return Err(ModelError::InvalidInstance(format!(
            "vessel type {} burns no fuel",
            v.label
        )));
    }
    if instance.distances().is_empty() {
        return Err(ModelError::InvalidInstance("empty distance table".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Port, VesselType};

    #[test]
    fn test_rejects_invalid_config() {
        let inst = Instance::new();
        let err = ModelContext::new(&inst, ModelConfig::default().with_rotations(0)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_too_few_ports() {
        let mut inst = Instance::new();
        inst.add_port(Port::new("NLRTM", 0, 0.0, 0).unwrap()).unwrap();
        let err = ModelContext::new(&inst, ModelConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInstance(_)));
    }

    #[test]
    fn test_rejects_fuelless_vessel() {
        let mut inst = Instance::new();
        inst.add_port(Port::new("NLRTM", 0, 0.0, 0).unwrap()).unwrap();
        inst.add_port(Port::new("DEHAM", 0, 0.0, 0).unwrap()).unwrap();
        inst.add_distance("NLRTM", "DEHAM", 10).unwrap();
        inst.add_vessel_type(VesselType::new("Feeder", 10, 10, 1, 1, 10, 12).unwrap())
            .unwrap();
        let err = ModelContext::new(&inst, ModelConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Feeder"));
    }
}
