//! Port operations, sailing legs and the clock along each rotation.
//!
//! Clock times are relative to the rotation's start location, the visited
//! node with the largest index, whose arrival is 0. The leg closing the
//! circuit back to the start is accounted for by the rotation duration in
//! [`VesselAvailability`](super::vessel_availability::VesselAvailability).

use super::cargo_flow::CargoFlow;
use super::config::OperationTime;
use super::context::ModelContext;
use super::feature::Feature;
use super::load::Load;
use super::precompute::production_time;
use super::rotation::Rotation;
use super::submodel::Submodel;
use crate::cp::{Cond, Constraint, Domain, Expr, IntVar, Rel, TableId, Tuples, VarKind};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Time {
    /// `[p][r]`: hours spent handling cargo or crossing a canal.
    pub op_time: Vec<Vec<IntVar>>,
    /// Start location of each rotation, `-1` when unused.
    pub start: Vec<IntVar>,
    pub arrival: Vec<Vec<IntVar>>,
    pub departure: Vec<Vec<IntVar>>,
    /// `[r][p]`: knots on the leg leaving `p`.
    pub speed: Vec<Vec<IntVar>>,
    /// `[r][p]`: hours on the leg leaving `p`.
    pub sailing: Vec<Vec<IntVar>>,
    /// Round-trip hours of each rotation.
    pub duration: Vec<IntVar>,
}

type TimeDeps<'a> = (&'a Rotation, &'a CargoFlow, &'a Feature, &'a Load);

impl Time {
    /// `(teu, vessel, hours)` rows for port `p`, with `(0, *, 0)` first.
    fn production_table(ctx: &ModelContext<'_>, p: usize, teu: &Domain) -> Result<Tuples> {
        let ratio = ctx.config.handling_ratio_percent();
        let port = &ctx.instance.ports()[p];
        let mut rows = Tuples::new(3);
        rows.push_pattern(vec![Some(0), None, Some(0)])?;
        for (v, vessel) in ctx.instance.vessel_types().iter().enumerate() {
            let productivity = port.call(&vessel.label).productivity;
            for t in teu.values().filter(|&t| t > 0 && t <= 2 * vessel.real_capacity) {
                if let Some(hours) = production_time(t, ratio, productivity) {
                    rows.push(&[t, v as i64 + 1, hours])?;
                }
            }
        }
        Ok(rows)
    }

    fn op_domain(ctx: &ModelContext<'_>, p: usize, teu: &Domain) -> Result<Domain> {
        if let Some(c) = ctx.pre.locations.canal_of(p) {
            return Ok(Domain::from_values([0, ctx.instance.canals()[c].duration]));
        }
        if !ctx.config.refined_domains {
            return Ok(ctx.time_domain());
        }
        Ok(Self::production_table(ctx, p, teu)?.column(2))
    }

    fn post_operation_time(
        &self,
        ctx: &mut ModelContext<'_>,
        (rotation, _, feature, load): TimeDeps<'_>,
        p: usize,
        table: Option<TableId>,
    ) -> Result<()> {
        for r in 0..ctx.dims.rotations {
            let (teu, op) = (load.teu[p][r], self.op_time[p][r]);
            let visit = rotation.visit(r, p);
            match (ctx.config.operation_time, table) {
                (OperationTime::ConditionalTable, Some(table)) => ctx.model.post(Constraint::if_then(
                    Constraint::eq(visit, 1),
                    Constraint::Table {
                        vars: vec![teu, rotation.vessel[r], op],
                        table,
                    },
                )),
                (OperationTime::Table, Some(table)) => ctx.model.post(Constraint::Table {
                    vars: vec![teu, rotation.vessel[r], op],
                    table,
                }),
                _ => {
                    let ratio = ctx.constant(ctx.config.handling_ratio_percent())?;
                    let moves = ctx.model.product(teu, ratio)?;
                    let hours = ctx
                        .model
                        .define(None, Expr::Quotient(moves, feature.productivity[p][r]))?;
                    ctx.model.post(Constraint::if_then(
                        Constraint::eq(visit, 1),
                        Constraint::vars(op, Rel::Eq, hours),
                    ));
                }
            }
            ctx.model
                .add_implication(&[Cond::eq(visit, 0)], Cond::eq(op, 0))?;
        }
        Ok(())
    }
}

/// Other nodes `succ` may point to.
pub(super) fn next_nodes(ctx: &ModelContext<'_>, succ: IntVar, p: usize) -> Result<Vec<usize>> {
    Ok(ctx
        .model
        .domain(succ)?
        .values()
        .filter(|&sp| sp != p as i64)
        .map(|sp| sp as usize)
        .collect())
}

impl Submodel for Time {
    const NAME: &'static str = "time";
    type Deps<'a> = TimeDeps<'a>;

    fn declare(ctx: &mut ModelContext<'_>, (rotation, _, _, load): TimeDeps<'_>) -> Result<Self> {
        let d = ctx.dims;
        let (nl, nr) = (d.locations, d.rotations);

        let mut op_domains = Vec::with_capacity(nl);
        for p in 0..nl {
            let teu = match load.teu.get(p) {
                Some(row) if !row.is_empty() => ctx.model.domain(row[0])?.clone(),
                _ => Domain::singleton(0),
            };
            op_domains.push(Self::op_domain(ctx, p, &teu)?);
        }
        let op_time = ctx
            .model
            .int_matrix("op_time", nl, nr, |p, _| op_domains[p].clone())?;
        let start = ctx
            .model
            .int_array("start", nr, |_| Domain::range(-1, nl as i64 - 1))?;
        let time = ctx.time_domain();
        let arrival = ctx.model.int_matrix("arrival", nl, nr, |_, _| time.clone())?;
        let departure = ctx.define_matrix("departure", (nl, nr), VarKind::Int, |_, p, r| {
            Ok(Expr::Linear {
                terms: vec![(1, arrival[p][r]), (1, op_time[p][r])],
                constant: 0,
            })
        })?;

        let speeds = Domain::from_values(ctx.pre.speeds.iter().copied());
        let speed = ctx.model.int_matrix("speed", nr, nl, |_, _| speeds.clone())?;
        let mut tables = Vec::with_capacity(nl);
        for rows in &ctx.pre.sailing {
            let mut t = Tuples::new(3);
            for row in rows {
                t.push(&[row.successor as i64, row.speed, row.hours])?;
            }
            tables.push(t);
        }
        let tables: Vec<TableId> = tables.into_iter().map(|t| ctx.model.add_table(t)).collect();
        let sailing = ctx.define_matrix("sailing", (nr, nl), VarKind::Int, |_, r, p| {
            Ok(Expr::Lookup {
                table: tables[p],
                inputs: vec![rotation.succ[r][p], speed[r][p]],
            })
        })?;
        let duration = ctx.model.int_array("duration", nr, |_| time.clone())?;

        Ok(Self {
            op_time,
            start,
            arrival,
            departure,
            speed,
            sailing,
            duration,
        })
    }

    fn post(&self, ctx: &mut ModelContext<'_>, deps: TimeDeps<'_>) -> Result<()> {
        let (rotation, flow, feature, load) = deps;
        let d = ctx.dims;

        for p in 0..d.ports {
            let table = match ctx.config.operation_time {
                OperationTime::Division => None,
                _ if d.rotations == 0 => None,
                _ => {
                    let teu = ctx.model.domain(load.teu[p][0])?.clone();
                    let rows = Self::production_table(ctx, p, &teu)?;
                    Some(ctx.model.add_table(rows))
                }
            };
            self.post_operation_time(ctx, deps, p, table)?;
        }
        for p in d.ports..d.locations {
            let duration = ctx
                .pre
                .locations
                .canal_of(p)
                .map_or(0, |c| ctx.instance.canals()[c].duration);
            for r in 0..d.rotations {
                ctx.model.post(Constraint::linear(
                    vec![(1, self.op_time[p][r]), (-duration, rotation.visit(r, p))],
                    Rel::Eq,
                    0,
                ));
            }
        }

        for r in 0..d.rotations {
            let (vessel, start) = (rotation.vessel[r], self.start[r]);
            ctx.model
                .add_equivalence(Cond::eq(vessel, 0), Cond::eq(start, -1))?;

            let mut weighted = Vec::with_capacity(d.locations);
            for p in 0..d.locations {
                weighted.push(ctx.sum_of(vec![(p as i64, rotation.visit(r, p))])?);
            }
            let is_last = ctx.model.reify(Constraint::Maximum {
                max: start,
                vars: weighted,
            })?;
            ctx.model
                .add_implication(&[Cond::ne(vessel, 0)], Cond::eq(is_last, 1))?;

            for p in 0..d.locations {
                let succ = rotation.succ[r][p];
                let (speed, sailing) = (self.speed[r][p], self.sailing[r][p]);
                let m = &mut ctx.model;
                m.add_implication(&[Cond::eq(start, p as i64)], Cond::eq(self.arrival[p][r], 0))?;
                m.post(Constraint::if_then(
                    Constraint::eq(rotation.visit(r, p), 1),
                    Constraint::AllOf(vec![
                        Constraint::vars(speed, Rel::Ge, feature.speed_min[r]),
                        Constraint::vars(speed, Rel::Le, feature.speed_max[r]),
                    ]),
                ));
                m.add_equivalence(Cond::eq(succ, p as i64), Cond::eq(speed, 0))?;
                m.add_implication(&[Cond::eq(succ, p as i64)], Cond::eq(sailing, 0))?;
                m.add_implication(&[Cond::eq(succ, p as i64)], Cond::eq(self.arrival[p][r], 0))?;

                for sp in next_nodes(ctx, succ, p)? {
                    ctx.model.post(Constraint::if_then(
                        Constraint::AllOf(vec![
                            Constraint::eq(succ, sp as i64),
                            Constraint::ne(start, sp as i64),
                        ]),
                        Constraint::linear(
                            vec![
                                (1, self.arrival[sp][r]),
                                (-1, self.departure[p][r]),
                                (-1, feature.man_out[p][r]),
                                (-1, sailing),
                                (-1, feature.waiting[sp][r]),
                                (-1, feature.man_in[sp][r]),
                            ],
                            Rel::Eq,
                            0,
                        ),
                    ));
                }
            }

            // cargo reaches its port after boarding, possibly in the next
            // round of the rotation
            let duration = self.duration[r];
            for k in 0..d.commodities {
                for p in 0..d.ports {
                    for sp in (0..d.ports).filter(|&sp| sp != p) {
                        let (board, land) = (self.arrival[p][r], self.arrival[sp][r]);
                        ctx.model.post(Constraint::if_then(
                            Constraint::AllOf(vec![
                                Constraint::compare(flow.from[k][p][r], Rel::Ge, 1),
                                Constraint::compare(flow.to[k][sp][r], Rel::Ge, 1),
                            ]),
                            Constraint::AnyOf(vec![
                                Constraint::vars(board, Rel::Lt, land),
                                Constraint::AllOf(vec![
                                    Constraint::vars(land, Rel::Lt, board),
                                    Constraint::linear(
                                        vec![(1, board), (-1, land), (-1, duration)],
                                        Rel::Lt,
                                        0,
                                    ),
                                ]),
                            ]),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
