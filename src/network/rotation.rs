//! Rotation topology: vessel type, successor function and circuit length.

use super::context::ModelContext;
use super::submodel::Submodel;
use crate::cp::{BoolVar, Cond, Constraint, Domain, Expr, IntVar, Rel, VarKind};
use crate::error::Result;

/// Per rotation slot `r`: `vessel[r]` (0 when unused), `succ[r][p]` and
/// `length[r]`.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub vessel: Vec<IntVar>,
    pub succ: Vec<Vec<IntVar>>,
    pub length: Vec<IntVar>,
    /// `visits[r][p]` iff `succ[r][p] != p`.
    pub visits: Vec<Vec<BoolVar>>,
}

impl Rotation {
    pub fn visit(&self, r: usize, p: usize) -> IntVar {
        self.visits[r][p].int()
    }
}

impl Submodel for Rotation {
    const NAME: &'static str = "rotation";
    type Deps<'a> = ();

    fn declare(ctx: &mut ModelContext<'_>, _: ()) -> Result<Self> {
        let (nr, nl) = (ctx.dims.rotations, ctx.dims.locations);
        let nv = ctx.dims.vessel_types as i64;
        let vessel = ctx.model.int_array("vessel", nr, |_| Domain::range(0, nv))?;

        let locations = ctx.pre.locations;
        let instance = ctx.instance;
        let successors = &ctx.pre.successors;
        let domains: Vec<Domain> = (0..nl)
            .map(|p| {
                let from = locations.code(instance, p);
                Domain::from_values(std::iter::once(p as i64).chain(
                    successors[p]
                        .iter()
                        .filter(|&&sp| instance.distance(from, locations.code(instance, sp)) > 0)
                        .map(|&sp| sp as i64),
                ))
            })
            .collect();
        let succ = ctx
            .model
            .int_matrix("succ", nr, nl, |_, p| domains[p].clone())?;
        let length = ctx
            .model
            .int_array("length", nr, |_| Domain::range(0, nl as i64))?;

        let visits = ctx.define_matrix("visits", (nr, nl), VarKind::Bool, |_, r, p| {
            Ok(Expr::Reified(Constraint::ne(succ[r][p], p as i64)))
        })?;
        let visits = visits
            .into_iter()
            .map(|row| row.into_iter().map(BoolVar).collect())
            .collect();

        Ok(Self {
            vessel,
            succ,
            length,
            visits,
        })
    }

    fn post(&self, ctx: &mut ModelContext<'_>, _: ()) -> Result<()> {
        let min_len = ctx.config.min_rotation_length as i64;
        let ports = ctx.dims.ports;
        for r in 0..ctx.dims.rotations {
            let vessel = self.vessel[r];
            ctx.model.post(Constraint::SubCircuit {
                successors: self.succ[r].clone(),
                length: self.length[r],
            });
            ctx.model
                .add_equivalence(Cond::eq(vessel, 0), Cond::eq(self.length[r], 0))?;
            ctx.model
                .add_equivalence(Cond::ne(vessel, 0), Cond::ge(self.length[r], min_len))?;
            for (p, &s) in self.succ[r].iter().enumerate() {
                ctx.model
                    .add_implication(&[Cond::eq(vessel, 0)], Cond::eq(s, p as i64))?;
            }

            // a used circuit goes through enough ports, never only canals
            let port_visits: Vec<IntVar> = (0..ports).map(|p| self.visit(r, p)).collect();
            let enough = ctx
                .model
                .reify(Constraint::sum(&port_visits, Rel::Ge, min_len))?;
            ctx.model
                .add_implication(&[Cond::ne(vessel, 0)], Cond::eq(enough, 1))?;
        }
        Ok(())
    }
}
