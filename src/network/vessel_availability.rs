//! Rotation duration, vessels needed for a weekly service, fleet limits.

use super::context::ModelContext;
use super::feature::Feature;
use super::precompute::vessels_needed;
use super::rotation::Rotation;
use super::submodel::Submodel;
use super::time::{next_nodes, Time};
use crate::cp::{Cond, Constraint, Expr, IntVar, Rel, Tuples};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct VesselAvailability {
    /// Vessels deployed on each rotation.
    pub vessels: Vec<IntVar>,
}

type AvailabilityDeps<'a> = (&'a Rotation, &'a Feature, &'a Time);

impl Submodel for VesselAvailability {
    const NAME: &'static str = "vessel_availability";
    type Deps<'a> = AvailabilityDeps<'a>;

    fn declare(ctx: &mut ModelContext<'_>, (_, _, time): AvailabilityDeps<'_>) -> Result<Self> {
        let policy = ctx.config.vessel_count_policy;
        let mut rows = Tuples::new(2);
        for hours in 0..=ctx.hmax() {
            rows.push(&[hours, vessels_needed(hours, policy)])?;
        }
        let table = ctx.model.add_table(rows);
        let vessels = ctx.define_array("vessels", ctx.dims.rotations, |_, r| {
            Ok(Expr::Lookup {
                table,
                inputs: vec![time.duration[r]],
            })
        })?;
        Ok(Self { vessels })
    }

    fn post(
        &self,
        ctx: &mut ModelContext<'_>,
        (rotation, feature, time): AvailabilityDeps<'_>,
    ) -> Result<()> {
        let d = ctx.dims;
        for r in 0..d.rotations {
            let (start, duration) = (time.start[r], time.duration[r]);
            ctx.model
                .add_equivalence(Cond::eq(rotation.vessel[r], 0), Cond::eq(duration, 0))?;

            // the leg back into the start location closes the round trip
            for p in 0..d.locations {
                let succ = rotation.succ[r][p];
                for sp in next_nodes(ctx, succ, p)? {
                    ctx.model.post(Constraint::if_then(
                        Constraint::AllOf(vec![
                            Constraint::eq(start, sp as i64),
                            Constraint::eq(succ, sp as i64),
                        ]),
                        Constraint::linear(
                            vec![
                                (1, duration),
                                (-1, time.departure[p][r]),
                                (-1, feature.man_out[p][r]),
                                (-1, time.sailing[r][p]),
                                (-1, feature.waiting[sp][r]),
                                (-1, feature.man_in[sp][r]),
                            ],
                            Rel::Eq,
                            0,
                        ),
                    ));
                }
            }
        }

        for (v, vessel_type) in ctx.instance.vessel_types().iter().enumerate() {
            let mut deployed = Vec::with_capacity(d.rotations);
            for r in 0..d.rotations {
                let of_type = ctx
                    .model
                    .reify(Constraint::eq(rotation.vessel[r], v as i64 + 1))?;
                deployed.push(ctx.model.product(self.vessels[r], of_type.int())?);
            }
            ctx.model
                .post(Constraint::sum(&deployed, Rel::Le, vessel_type.count));
        }
        Ok(())
    }
}
