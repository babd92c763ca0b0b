//! Commodity routing across rotations.
//!
//! A commodity moves along at most `tsmax + 1` legs. Leg `i` is carried
//! by rotation `rot[k][i]` from port `port[k][i]` to port `port[k][i + 1]`;
//! `-1` marks unused legs and ports.

use super::context::ModelContext;
use super::rotation::Rotation;
use super::submodel::Submodel;
use crate::cp::{BoolVar, Cond, Constraint, Domain, Expr, IntVar, Shape, VarKind};
use crate::error::Result;

/// Sentinel for unused legs and ports.
pub const UNUSED: i64 = -1;

#[derive(Debug, Clone)]
pub struct CargoFlow {
    pub accepted: Vec<BoolVar>,
    /// `rot[k][i]` for `i` in `0..=tsmax`.
    pub rot: Vec<Vec<IntVar>>,
    /// `port[k][i]` for `i` in `0..=tsmax + 1`.
    pub port: Vec<Vec<IntVar>>,
    /// Number of legs actually used.
    pub hops: Vec<IntVar>,
    /// Port where the commodity leaves its last rotation, `-1` if rejected.
    pub dest: Vec<IntVar>,
    /// `from[k][p][r]`: boards rotation `r` at port `p`.
    pub from: Vec<Vec<Vec<IntVar>>>,
    /// `to[k][p][r]`: leaves rotation `r` at port `p`.
    pub to: Vec<Vec<Vec<IntVar>>>,
}

/// Auxiliary 0/1 count of the legs matching `(port, rotation)`.
fn leg_count(
    ctx: &mut ModelContext<'_>,
    legs: &[(IntVar, IntVar)],
    p: usize,
    r: usize,
) -> Result<Expr> {
    let mut terms = Vec::with_capacity(legs.len());
    for &(port, rot) in legs {
        let both = ctx.model.reify(Constraint::AllOf(vec![
            Constraint::eq(port, p as i64),
            Constraint::eq(rot, r as i64),
        ]))?;
        terms.push((1, both.int()));
    }
    Ok(Expr::Linear { terms, constant: 0 })
}

impl Submodel for CargoFlow {
    const NAME: &'static str = "cargo_flow";
    type Deps<'a> = &'a Rotation;

    fn declare(ctx: &mut ModelContext<'_>, _: &Rotation) -> Result<Self> {
        let d = ctx.dims;
        let (nk, np, nr, ts) = (d.commodities, d.ports, d.rotations, d.tsmax);
        let commodities = ctx.pre.commodities.clone();

        let mut accepted = Vec::with_capacity(nk);
        for k in 0..nk {
            accepted.push(ctx.model.bool_var(format!("accepted[{k}]"))?);
        }
        ctx.model.record_group(
            "accepted",
            VarKind::Bool,
            Shape::D1(nk),
            accepted.iter().map(|b| b.int()).collect(),
        );

        let rot = ctx
            .model
            .int_matrix("rot", nk, ts + 1, |_, _| Domain::range(UNUSED, nr as i64 - 1))?;
        let port = ctx.model.int_matrix("port", nk, ts + 2, |k, i| {
            let c = &commodities[k];
            if i == 0 {
                Domain::from_values([UNUSED, c.origin as i64])
            } else if i == ts + 1 {
                Domain::from_values([UNUSED, c.destination as i64])
            } else {
                Domain::from_values(
                    std::iter::once(UNUSED)
                        .chain((0..np as i64).filter(|&p| p != c.origin as i64)),
                )
            }
        })?;
        let hops = ctx
            .model
            .int_array("hops", nk, |_| Domain::range(0, ts as i64 + 1))?;

        let mut dest = Vec::with_capacity(nk);
        for k in 0..nk {
            let mut array = vec![ctx.constant(UNUSED)?];
            array.extend_from_slice(&port[k][1..]);
            let domain = Domain::from_values([UNUSED, commodities[k].destination as i64]);
            dest.push(ctx.model.define_in(
                Some(format!("dest[{k}]")),
                domain,
                Expr::ElementVar {
                    index: hops[k],
                    array,
                    offset: 0,
                },
            )?);
        }
        ctx.model
            .record_group("dest", VarKind::Int, Shape::D1(nk), dest.clone());

        let boarding: Vec<Vec<(IntVar, IntVar)>> = (0..nk)
            .map(|k| (0..=ts).map(|i| (port[k][i], rot[k][i])).collect())
            .collect();
        let landing: Vec<Vec<(IntVar, IntVar)>> = (0..nk)
            .map(|k| (0..=ts).map(|i| (port[k][i + 1], rot[k][i])).collect())
            .collect();
        let from = ctx.define_cube("from", (nk, np, nr), VarKind::Bool, |ctx, k, p, r| {
            leg_count(ctx, &boarding[k], p, r)
        })?;
        let to = ctx.define_cube("to", (nk, np, nr), VarKind::Bool, |ctx, k, p, r| {
            leg_count(ctx, &landing[k], p, r)
        })?;

        Ok(Self {
            accepted,
            rot,
            port,
            hops,
            dest,
            from,
            to,
        })
    }

    fn post(&self, ctx: &mut ModelContext<'_>, _: &Rotation) -> Result<()> {
        let ts = ctx.dims.tsmax;
        for (k, c) in ctx.pre.commodities.clone().iter().enumerate() {
            let (acc, hops) = (self.accepted[k], self.hops[k]);
            let m = &mut ctx.model;
            m.add_equivalence(Cond::eq(acc, 1), Cond::gt(hops, 0))?;
            m.add_equivalence(Cond::eq(acc, 1), Cond::eq(self.port[k][0], c.origin as i64))?;
            m.add_equivalence(Cond::eq(acc, 0), Cond::eq(self.port[k][0], UNUSED))?;
            m.add_equivalence(Cond::eq(acc, 1), Cond::eq(self.dest[k], c.destination as i64))?;

            for i in 0..=ts {
                m.add_equivalence(Cond::le(hops, i as i64), Cond::eq(self.rot[k][i], UNUSED))?;
            }
            for i in 1..=ts + 1 {
                m.add_equivalence(Cond::lt(hops, i as i64), Cond::eq(self.port[k][i], UNUSED))?;
            }

            m.post(Constraint::AllDifferentExcept {
                vars: self.port[k].clone(),
                except: UNUSED,
            });
            m.post(Constraint::AllDifferentExcept {
                vars: self.rot[k].clone(),
                except: UNUSED,
            });
        }
        Ok(())
    }
}
