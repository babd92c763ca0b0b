//! Door-to-door time of commodities with a transit-time bound.
//!
//! Each leg's boarding and landing clock times are fetched from flattened
//! departure and arrival arrays through an index derived from the leg's
//! `(port, rotation)` pair. Time aboard is the difference of the two,
//! plus one rotation duration when the leg wraps around the start. Waits
//! between legs are measured on the weekly clock.

use super::cargo_flow::{CargoFlow, UNUSED};
use super::context::ModelContext;
use super::precompute::WEEK;
use super::rotation::Rotation;
use super::submodel::Submodel;
use super::time::Time;
use crate::cp::{Cond, Constraint, Domain, Expr, IntVar, Rel, Shape, TableId, Tuples, VarKind};
use crate::error::Result;

/// Per bounded commodity `k` and leg `i`.
#[derive(Debug, Clone)]
pub struct TransitTime {
    pub in_index: Vec<Vec<IntVar>>,
    pub in_time: Vec<Vec<IntVar>>,
    pub out_index: Vec<Vec<IntVar>>,
    pub out_time: Vec<Vec<IntVar>>,
    /// Hours aboard the rotation of each leg.
    pub leg_hours: Vec<Vec<IntVar>>,
    /// Hours between landing from leg `i` and boarding leg `i + 1`.
    pub wait: Vec<Vec<IntVar>>,
}

type TransitDeps<'a> = (&'a Rotation, &'a CargoFlow, &'a Time);

fn weekly_table(hours: i64) -> Result<Tuples> {
    let mut t = Tuples::new(2);
    for h in 0..=hours {
        t.push(&[h, h % WEEK])?;
    }
    Ok(t)
}

/// `(more, landed, boarded, wait)` on the weekly clock; no wait unless a
/// further leg follows.
fn wait_table() -> Result<Tuples> {
    let mut t = Tuples::new(4);
    t.push_pattern(vec![Some(0), None, None, Some(0)])?;
    for landed in 0..WEEK {
        for boarded in 0..WEEK {
            let wait = if boarded >= landed {
                boarded - landed
            } else {
                WEEK + boarded - landed
            };
            t.push(&[1, landed, boarded, wait])?;
        }
    }
    Ok(t)
}

impl TransitTime {
    fn weekly(ctx: &mut ModelContext<'_>, table: TableId, hours: IntVar) -> Result<IntVar> {
        ctx.model.define(
            None,
            Expr::Lookup {
                table,
                inputs: vec![hours],
            },
        )
    }
}

impl Submodel for TransitTime {
    const NAME: &'static str = "transit_time";
    type Deps<'a> = TransitDeps<'a>;

    fn declare(ctx: &mut ModelContext<'_>, (_, flow, time): TransitDeps<'_>) -> Result<Self> {
        let d = ctx.dims;
        let (np, nr) = (d.ports as i64, d.rotations as i64);
        let nk = d.with_transit_time;
        let legs = d.tsmax + 1;

        let zero = ctx.constant(0)?;
        let mut departures: Vec<IntVar> = (0..d.ports)
            .flat_map(|p| (0..d.rotations).map(move |r| (p, r)))
            .map(|(p, r)| time.departure[p][r])
            .collect();
        departures.push(zero);
        let mut arrivals: Vec<IntVar> = (0..d.ports)
            .flat_map(|p| (0..d.rotations).map(move |r| (p, r)))
            .map(|(p, r)| time.arrival[p][r])
            .collect();
        arrivals.extend_from_slice(&time.duration);
        arrivals.push(zero);

        let mut boarding = Tuples::new(3);
        for p in 0..np {
            for r in 0..nr {
                boarding.push(&[p, r, p * nr + r])?;
            }
        }
        boarding.push_pattern(vec![None, Some(UNUSED), Some(np * nr)])?;
        let boarding = ctx.model.add_table(boarding);

        let mut in_index = Vec::with_capacity(nk);
        let mut in_time = Vec::with_capacity(nk);
        let mut out_index = Vec::with_capacity(nk);
        let mut out_time = Vec::with_capacity(nk);
        for k in 0..nk {
            let mut ii = Vec::with_capacity(legs);
            let mut it = Vec::with_capacity(legs);
            let mut oi = Vec::with_capacity(legs);
            let mut ot = Vec::with_capacity(legs);
            for i in 0..legs {
                let idx = ctx
                    .model
                    .int_var(format!("in_index[{k}][{i}]"), Domain::range(0, np * nr))?;
                ctx.model.post(Constraint::Table {
                    vars: vec![flow.port[k][i], flow.rot[k][i], idx],
                    table: boarding,
                });
                ii.push(idx);
                it.push(ctx.model.define(
                    Some(format!("in_time[{k}][{i}]")),
                    Expr::ElementVar {
                        index: idx,
                        array: departures.clone(),
                        offset: 0,
                    },
                )?);
                let idx = ctx
                    .model
                    .int_var(format!("out_index[{k}][{i}]"), Domain::range(0, np * nr + nr))?;
                oi.push(idx);
                ot.push(ctx.model.define(
                    Some(format!("out_time[{k}][{i}]")),
                    Expr::ElementVar {
                        index: idx,
                        array: arrivals.clone(),
                        offset: 0,
                    },
                )?);
            }
            in_index.push(ii);
            in_time.push(it);
            out_index.push(oi);
            out_time.push(ot);
        }

        let hmax = ctx.hmax();
        let leg_hours = ctx
            .model
            .int_matrix("leg_hours", nk, legs, |_, _| Domain::range(0, hmax))?;

        let weekly = ctx.model.add_table(weekly_table(2 * hmax)?);
        let waits = ctx.model.add_table(wait_table()?);
        let mut wait = Vec::with_capacity(nk);
        for k in 0..nk {
            let mut row = Vec::with_capacity(d.tsmax);
            for i in 0..d.tsmax {
                let landed = Self::weekly(ctx, weekly, out_time[k][i])?;
                let boarded = Self::weekly(ctx, weekly, in_time[k][i + 1])?;
                let more = ctx
                    .model
                    .reify(Constraint::compare(flow.hops[k], Rel::Gt, i as i64 + 1))?;
                row.push(ctx.model.define(
                    Some(format!("wait[{k}][{i}]")),
                    Expr::Lookup {
                        table: waits,
                        inputs: vec![more.int(), landed, boarded],
                    },
                )?);
            }
            wait.push(row);
        }
        for (name, vars, width) in [
            ("in_time", &in_time, legs),
            ("out_time", &out_time, legs),
            ("wait", &wait, d.tsmax),
        ] {
            let flat = vars.iter().flatten().copied().collect();
            ctx.model
                .record_group(name, VarKind::Int, Shape::D2(nk, width), flat);
        }

        Ok(Self {
            in_index,
            in_time,
            out_index,
            out_time,
            leg_hours,
            wait,
        })
    }

    fn post(&self, ctx: &mut ModelContext<'_>, (_, flow, time): TransitDeps<'_>) -> Result<()> {
        let d = ctx.dims;
        let (np, nr) = (d.ports as i64, d.rotations as i64);
        for k in 0..d.with_transit_time {
            let mut total = Vec::new();
            for i in 0..=d.tsmax {
                let (rot, landing) = (flow.rot[k][i], flow.port[k][i + 1]);
                let out = self.out_index[k][i];
                for r in 0..d.rotations {
                    let start = time.start[r];
                    let on_r = Constraint::eq(rot, r as i64);
                    ctx.model.post(Constraint::if_then(
                        Constraint::AllOf(vec![
                            Constraint::vars(landing, Rel::Ne, start),
                            on_r.clone(),
                        ]),
                        Constraint::linear(vec![(1, out), (-nr, landing)], Rel::Eq, r as i64),
                    ));
                    // landing at the start location closes the round trip
                    ctx.model.post(Constraint::if_then(
                        Constraint::AllOf(vec![
                            Constraint::vars(landing, Rel::Eq, start),
                            on_r.clone(),
                        ]),
                        Constraint::eq(out, np * nr + r as i64),
                    ));
                }
                ctx.model
                    .add_implication(&[Cond::eq(rot, UNUSED)], Cond::eq(out, np * nr + nr))?;

                let (board, land, hours) = (
                    self.in_time[k][i],
                    self.out_time[k][i],
                    self.leg_hours[k][i],
                );
                ctx.model.post(Constraint::if_then(
                    Constraint::vars(board, Rel::Le, land),
                    Constraint::linear(vec![(1, hours), (-1, land), (1, board)], Rel::Eq, 0),
                ));
                for r in 0..d.rotations {
                    ctx.model.post(Constraint::if_then(
                        Constraint::AllOf(vec![
                            Constraint::vars(board, Rel::Gt, land),
                            Constraint::eq(rot, r as i64),
                        ]),
                        Constraint::linear(
                            vec![
                                (1, hours),
                                (-1, land),
                                (1, board),
                                (-1, time.duration[r]),
                            ],
                            Rel::Eq,
                            0,
                        ),
                    ));
                }
                total.push(hours);
            }
            for (i, &w) in self.wait[k].iter().enumerate() {
                ctx.model
                    .add_implication(&[Cond::le(flow.hops[k], i as i64 + 1)], Cond::eq(w, 0))?;
                total.push(w);
            }
            let bound = ctx.pre.commodities[k].transit_time;
            ctx.model.post(Constraint::sum(&total, Rel::Le, bound));
        }
        Ok(())
    }
}
