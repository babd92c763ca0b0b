//! Ordering of interchangeable rotation slots.

use super::context::ModelContext;
use super::rotation::Rotation;
use super::submodel::Submodel;
use super::time::Time;
use crate::cp::{Cond, Constraint};
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct SymmetryConstraints;

impl Submodel for SymmetryConstraints {
    const NAME: &'static str = "symmetry_breaking";
    type Deps<'a> = (&'a Rotation, &'a Time);

    fn declare(_: &mut ModelContext<'_>, _: Self::Deps<'_>) -> Result<Self> {
        Ok(SymmetryConstraints)
    }

    fn post(&self, ctx: &mut ModelContext<'_>, (rotation, time): Self::Deps<'_>) -> Result<()> {
        let policy = ctx.config.symmetry_breaking;
        if policy.unused_last() {
            for pair in rotation.vessel.windows(2) {
                ctx.model
                    .add_implication(&[Cond::eq(pair[0], 0)], Cond::eq(pair[1], 0))?;
            }
        }
        if policy.decreasing_duration() && time.duration.len() > 1 {
            ctx.model.post(Constraint::Decreasing {
                vars: time.duration.clone(),
            });
        }
        Ok(())
    }
}
