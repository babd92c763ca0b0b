//! Links commodity flows to rotation topology.

use super::cargo_flow::CargoFlow;
use super::context::ModelContext;
use super::rotation::Rotation;
use super::submodel::Submodel;
use crate::cp::{Cond, Constraint, IntVar, Rel};
use crate::error::Result;

/// Posts only; declares nothing of its own.
#[derive(Debug, Clone, Copy)]
pub struct CargoRotation;

impl Submodel for CargoRotation {
    const NAME: &'static str = "cargo_rotation";
    type Deps<'a> = (&'a Rotation, &'a CargoFlow);

    fn declare(_: &mut ModelContext<'_>, _: Self::Deps<'_>) -> Result<Self> {
        Ok(CargoRotation)
    }

    fn post(&self, ctx: &mut ModelContext<'_>, (rotation, flow): Self::Deps<'_>) -> Result<()> {
        let d = ctx.dims;
        let all_ports: Vec<IntVar> = flow.port.iter().flatten().copied().collect();
        let all_rots: Vec<IntVar> = flow.rot.iter().flatten().copied().collect();

        // boarding or leaving at p means r calls at p
        for k in 0..d.commodities {
            for p in 0..d.ports {
                for r in 0..d.rotations {
                    let visit = rotation.visit(r, p);
                    for flag in [flow.from[k][p][r], flow.to[k][p][r]] {
                        ctx.model
                            .add_implication(&[Cond::ge(flag, 1)], Cond::eq(visit, 1))?;
                    }
                }
            }
        }

        for p in 0..d.ports {
            let served = ctx.model.reify(Constraint::Occurs {
                vars: all_ports.clone(),
                values: vec![p as i64],
                min: 1,
                max: i64::MAX,
            })?;
            for r in 0..d.rotations {
                ctx.model.add_implication(
                    &[Cond::eq(rotation.visit(r, p), 1)],
                    Cond::eq(served, 1),
                )?;
            }
        }

        for r in 0..d.rotations {
            let idle = ctx.model.reify(Constraint::Occurs {
                vars: all_rots.clone(),
                values: vec![r as i64],
                min: 0,
                max: 0,
            })?;
            ctx.model
                .add_equivalence(Cond::eq(rotation.vessel[r], 0), Cond::eq(idle, 1))?;
        }

        if ctx.config.limit_rotations_per_port {
            for p in 0..d.ports {
                let origins = ctx.pre.commodities.iter().filter(|c| c.origin == p).count();
                let destinations = ctx
                    .pre
                    .commodities
                    .iter()
                    .filter(|c| c.destination == p)
                    .count();
                let visits: Vec<IntVar> = (0..d.rotations).map(|r| rotation.visit(r, p)).collect();
                ctx.model.post(Constraint::sum(
                    &visits,
                    Rel::Le,
                    origins.max(destinations) as i64,
                ));
            }
        }
        Ok(())
    }
}
