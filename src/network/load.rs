//! Cargo aboard each rotation and TEU handled at each call.

use super::cargo_flow::CargoFlow;
use super::context::ModelContext;
use super::feature::Feature;
use super::rotation::Rotation;
use super::submodel::Submodel;
use crate::cp::{BoolVar, Cond, Constraint, Domain, Expr, IntVar, Rel, Shape, VarKind};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Load {
    /// `aboard[k][p][r]`: commodity `k` is on rotation `r` when it leaves
    /// location `p`.
    pub aboard: Vec<Vec<Vec<BoolVar>>>,
    /// `teu[p][r]`: TEU loaded plus unloaded at port `p` by rotation `r`.
    pub teu: Vec<Vec<IntVar>>,
}

impl Submodel for Load {
    const NAME: &'static str = "load";
    type Deps<'a> = (&'a Rotation, &'a CargoFlow, &'a Feature);

    fn declare(ctx: &mut ModelContext<'_>, (_, flow, _): Self::Deps<'_>) -> Result<Self> {
        let d = ctx.dims;
        let aboard = ctx
            .model
            .bool_cube("aboard", (d.commodities, d.locations, d.rotations))?;

        let domain = if ctx.config.refined_domains {
            Domain::from_values(ctx.pre.total_loads.iter().copied())
        } else {
            Domain::range(0, 2 * ctx.pre.total_quantity.min(ctx.pre.max_capacity))
        };
        let quantities: Vec<i64> = ctx.pre.commodities.iter().map(|c| c.quantity).collect();
        let mut teu = Vec::with_capacity(d.ports);
        for p in 0..d.ports {
            let mut row = Vec::with_capacity(d.rotations);
            for r in 0..d.rotations {
                let terms = quantities
                    .iter()
                    .enumerate()
                    .flat_map(|(k, &q)| [(q, flow.from[k][p][r]), (q, flow.to[k][p][r])])
                    .collect();
                row.push(ctx.model.define_in(
                    Some(format!("teu[{p}][{r}]")),
                    domain.clone(),
                    Expr::Linear { terms, constant: 0 },
                )?);
            }
            teu.push(row);
        }
        let flat = teu.iter().flatten().copied().collect();
        ctx.model
            .record_group("teu", VarKind::Int, Shape::D2(d.ports, d.rotations), flat);

        Ok(Self { aboard, teu })
    }

    fn post(
        &self,
        ctx: &mut ModelContext<'_>,
        (rotation, flow, feature): Self::Deps<'_>,
    ) -> Result<()> {
        let d = ctx.dims;
        let quantities: Vec<i64> = ctx.pre.commodities.iter().map(|c| c.quantity).collect();

        for r in 0..d.rotations {
            for p in 0..d.locations {
                let succ = rotation.succ[r][p];
                let next: Vec<usize> = ctx
                    .model
                    .domain(succ)?
                    .values()
                    .filter(|&sp| sp != p as i64)
                    .map(|sp| sp as usize)
                    .collect();

                for k in 0..d.commodities {
                    let here = self.aboard[k][p][r];
                    if ctx.is_port(p) {
                        ctx.model
                            .add_implication(&[Cond::ge(flow.from[k][p][r], 1)], Cond::eq(here, 1))?;
                        ctx.model
                            .add_implication(&[Cond::ge(flow.to[k][p][r], 1)], Cond::eq(here, 0))?;
                    }
                    ctx.model
                        .add_implication(&[Cond::eq(succ, p as i64)], Cond::eq(here, 0))?;

                    // status carries over to the next call unless cargo
                    // boards or leaves there
                    for &sp in &next {
                        let there = self.aboard[k][sp][r];
                        let mut condition = vec![Constraint::eq(succ, sp as i64)];
                        if ctx.is_port(sp) {
                            condition.push(Constraint::eq(flow.from[k][sp][r], 0));
                            condition.push(Constraint::eq(flow.to[k][sp][r], 0));
                        }
                        ctx.model.post(Constraint::if_then(
                            Constraint::AllOf(condition),
                            Constraint::vars(here.int(), Rel::Eq, there.int()),
                        ));
                    }
                }

                if !ctx.is_port(p) {
                    continue;
                }
                let mut load: Vec<(i64, IntVar)> = (0..d.commodities)
                    .map(|k| (quantities[k], self.aboard[k][p][r].int()))
                    .collect();
                load.push((-1, feature.capacity[r]));
                ctx.model.post(Constraint::linear(load, Rel::Le, 0));

                let mut busy: Vec<IntVar> = Vec::with_capacity(2 * d.commodities);
                for k in 0..d.commodities {
                    busy.push(self.aboard[k][p][r].int());
                    busy.push(flow.to[k][p][r]);
                }
                let idle = ctx.model.reify(Constraint::sum(&busy, Rel::Eq, 0))?;
                ctx.model
                    .add_equivalence(Cond::eq(succ, p as i64), Cond::eq(idle, 1))?;
            }
        }

        for k in 0..d.commodities {
            let carried: Vec<IntVar> = (0..d.ports)
                .flat_map(|p| (0..d.rotations).map(move |r| (p, r)))
                .map(|(p, r)| self.aboard[k][p][r].int())
                .collect();
            let any = ctx.model.reify(Constraint::sum(&carried, Rel::Gt, 0))?;
            ctx.model
                .add_equivalence(Cond::eq(flow.accepted[k], 1), Cond::eq(any, 1))?;
        }
        Ok(())
    }
}
