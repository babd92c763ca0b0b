//! Vessel and location attributes broadcast onto rotations.
//!
//! Every variable here is derived by an element lookup keyed by the
//! rotation's vessel type; index 0 (no vessel) maps to a neutral value.

use super::context::ModelContext;
use super::rotation::Rotation;
use super::submodel::Submodel;
use crate::cp::{Expr, IntVar, VarKind};
use crate::error::Result;
use crate::instance::{PortCall, VesselType};

#[derive(Debug, Clone)]
pub struct Feature {
    /// Fuel price per scaled consumption unit.
    pub fuel_price: Vec<IntVar>,
    pub capacity: Vec<IntVar>,
    /// Daily charter rate.
    pub charter: Vec<IntVar>,
    pub speed_min: Vec<IntVar>,
    pub speed_max: Vec<IntVar>,
    /// `[p][r]` over all locations; canal nodes carry the passage cost.
    pub call_cost: Vec<Vec<IntVar>>,
    pub waiting: Vec<Vec<IntVar>>,
    pub man_in: Vec<Vec<IntVar>>,
    pub man_out: Vec<Vec<IntVar>>,
    /// `[p][r]` over ports, in moves per 100 hours; `-1` without vessel or
    /// productivity.
    pub productivity: Vec<Vec<IntVar>>,
}

fn by_vessel(index: IntVar, none: i64, values: impl Iterator<Item = i64>) -> Expr {
    Expr::Element {
        index,
        array: std::iter::once(none).chain(values).collect(),
        offset: 0,
    }
}

impl Submodel for Feature {
    const NAME: &'static str = "feature";
    type Deps<'a> = &'a Rotation;

    fn declare(ctx: &mut ModelContext<'_>, rotation: &Rotation) -> Result<Self> {
        let (nr, nl, np) = (ctx.dims.rotations, ctx.dims.locations, ctx.dims.ports);
        let instance = ctx.instance;
        let vessels: &[VesselType] = instance.vessel_types();
        let fuel_cost = |v: &VesselType| {
            v.primary_fuel()
                .and_then(|f| instance.fuel_type(&f.fuel))
                .map_or(0, |f| f.cost / 10)
        };

        let fuel_price = ctx.define_array("fuel_price", nr, |_, r| {
            Ok(by_vessel(rotation.vessel[r], 0, vessels.iter().map(fuel_cost)))
        })?;
        let capacity = ctx.define_array("capacity", nr, |_, r| {
            Ok(by_vessel(rotation.vessel[r], 0, vessels.iter().map(|v| v.max_capacity)))
        })?;
        let charter = ctx.define_array("charter", nr, |_, r| {
            Ok(by_vessel(rotation.vessel[r], 0, vessels.iter().map(|v| v.charter_rate)))
        })?;
        let speed_min = ctx.define_array("speed_min", nr, |_, r| {
            Ok(by_vessel(rotation.vessel[r], 0, vessels.iter().map(|v| v.min_speed)))
        })?;
        let speed_max = ctx.define_array("speed_max", nr, |_, r| {
            Ok(by_vessel(rotation.vessel[r], 0, vessels.iter().map(|v| v.max_speed)))
        })?;

        let locations = ctx.pre.locations;
        let port_call = |p: usize, v: &VesselType| -> Option<PortCall> {
            match locations.canal_of(p) {
                Some(_) => None,
                None => Some(instance.ports()[p].call(&v.label)),
            }
        };
        let passage = |p: usize, v: &VesselType| {
            locations
                .canal_of(p)
                .map(|c| instance.canals()[c].passage(&v.label))
                .unwrap_or_default()
        };

        let call_cost = ctx.define_matrix("call_cost", (nl, nr), VarKind::Int, |_, p, r| {
            Ok(by_vessel(
                rotation.vessel[r],
                0,
                vessels.iter().map(|v| match port_call(p, v) {
                    Some(call) => call.call_cost,
                    None => passage(p, v).cost,
                }),
            ))
        })?;
        let waiting = ctx.define_matrix("waiting", (nl, nr), VarKind::Int, |_, p, r| {
            Ok(by_vessel(
                rotation.vessel[r],
                0,
                vessels.iter().map(|v| match port_call(p, v) {
                    Some(call) => call.waiting_time,
                    None => passage(p, v).waiting_time,
                }),
            ))
        })?;
        let man_in = ctx.define_matrix("man_in", (nl, nr), VarKind::Int, |_, p, r| {
            Ok(by_vessel(
                rotation.vessel[r],
                0,
                vessels
                    .iter()
                    .map(|v| port_call(p, v).map_or(0, |c| c.manoeuvring_in)),
            ))
        })?;
        let man_out = ctx.define_matrix("man_out", (nl, nr), VarKind::Int, |_, p, r| {
            Ok(by_vessel(
                rotation.vessel[r],
                0,
                vessels
                    .iter()
                    .map(|v| port_call(p, v).map_or(0, |c| c.manoeuvring_out)),
            ))
        })?;
        let productivity = ctx.define_matrix("productivity", (np, nr), VarKind::Int, |_, p, r| {
            Ok(by_vessel(
                rotation.vessel[r],
                -1,
                vessels.iter().map(|v| match port_call(p, v) {
                    Some(call) if call.productivity > 0 => call.productivity * 100,
                    _ => -1,
                }),
            ))
        })?;

        Ok(Self {
            fuel_price,
            capacity,
            charter,
            speed_min,
            speed_max,
            call_cost,
            waiting,
            man_in,
            man_out,
            productivity,
        })
    }

    fn post(&self, _: &mut ModelContext<'_>, _: &Rotation) -> Result<()> {
        // element definitions are posted as they are declared
        Ok(())
    }
}
