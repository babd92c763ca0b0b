//! Fuel, port call and transshipment costs.

use super::cargo_flow::CargoFlow;
use super::context::ModelContext;
use super::feature::Feature;
use super::precompute::{consumption, speed_range};
use super::rotation::Rotation;
use super::submodel::Submodel;
use super::time::Time;
use crate::cp::{Expr, IntVar, Tuples, VarKind};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Cost {
    /// `[r][p]`: scaled fuel burnt on the leg leaving `p`.
    pub consumption: Vec<Vec<IntVar>>,
    /// `[r][p]`: call cost plus fuel cost of the leg leaving `p`.
    pub cost: Vec<Vec<IntVar>>,
    /// TEU transshipped at each port.
    pub transshipped: Vec<IntVar>,
}

type CostDeps<'a> = (&'a Rotation, &'a CargoFlow, &'a Feature, &'a Time);

impl Cost {
    /// `(vessel, speed, consumption)` rows, idle rows included.
    fn consumption_table(ctx: &ModelContext<'_>) -> Result<Tuples> {
        let step = ctx.config.speed_step;
        let mut rows = Tuples::new(3);
        rows.push(&[0, 0, 0])?;
        for (v, vessel) in ctx.instance.vessel_types().iter().enumerate() {
            let v = v as i64 + 1;
            rows.push(&[v, 0, 0])?;
            for speed in speed_range(vessel.min_speed, vessel.max_speed, step) {
                rows.push(&[v, speed, consumption(vessel, speed)?])?;
            }
        }
        Ok(rows)
    }
}

impl Submodel for Cost {
    const NAME: &'static str = "cost";
    type Deps<'a> = CostDeps<'a>;

    fn declare(
        ctx: &mut ModelContext<'_>,
        (rotation, flow, feature, time): CostDeps<'_>,
    ) -> Result<Self> {
        let d = ctx.dims;
        let table = ctx.model.add_table(Self::consumption_table(ctx)?);
        let consumption = ctx.define_matrix(
            "consumption",
            (d.rotations, d.locations),
            VarKind::Int,
            |_, r, p| {
                Ok(Expr::Lookup {
                    table,
                    inputs: vec![rotation.vessel[r], time.speed[r][p]],
                })
            },
        )?;

        let cost = ctx.define_matrix("cost", (d.rotations, d.locations), VarKind::Int, |ctx, r, p| {
            let call = ctx.model.product(feature.call_cost[p][r], rotation.visit(r, p))?;
            let burnt = ctx.model.product(feature.fuel_price[r], consumption[r][p])?;
            let fuel = ctx.model.product(burnt, time.sailing[r][p])?;
            Ok(Expr::Linear {
                terms: vec![(1, call), (1, fuel)],
                constant: 0,
            })
        })?;

        let commodities = ctx.pre.commodities.clone();
        let transshipped = ctx.define_array("transshipped", d.ports, |_, p| {
            let terms = commodities
                .iter()
                .enumerate()
                .filter(|(_, c)| c.origin != p && c.destination != p)
                .flat_map(|(k, c)| (0..d.rotations).map(move |r| (c.quantity, flow.to[k][p][r])))
                .collect();
            Ok(Expr::Linear { terms, constant: 0 })
        })?;

        Ok(Self {
            consumption,
            cost,
            transshipped,
        })
    }

    fn post(&self, _: &mut ModelContext<'_>, _: CostDeps<'_>) -> Result<()> {
        Ok(())
    }
}
