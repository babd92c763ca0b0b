//! Profit: revenue minus operating, charter and transshipment costs.

use super::cargo_flow::CargoFlow;
use super::context::ModelContext;
use super::cost::Cost;
use super::feature::Feature;
use super::submodel::Submodel;
use super::vessel_availability::VesselAvailability;
use crate::cp::{Expr, IntVar, Shape, VarKind};
use crate::error::Result;

/// Days in a week; charter rates are daily.
const CHARTER_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct Objective {
    pub revenue: IntVar,
    /// Port call and fuel costs over all rotations.
    pub operating: IntVar,
    pub charter: IntVar,
    pub transshipment: IntVar,
    pub profit: IntVar,
}

type ObjectiveDeps<'a> = (&'a CargoFlow, &'a Feature, &'a VesselAvailability, &'a Cost);

impl Submodel for Objective {
    const NAME: &'static str = "objective";
    type Deps<'a> = ObjectiveDeps<'a>;

    fn declare(
        ctx: &mut ModelContext<'_>,
        (flow, feature, availability, cost): ObjectiveDeps<'_>,
    ) -> Result<Self> {
        let revenue_terms = ctx
            .pre
            .commodities
            .iter()
            .zip(&flow.accepted)
            .map(|(c, acc)| (c.quantity * c.revenue, acc.int()))
            .collect();
        let revenue = ctx
            .model
            .define(Some("revenue".into()), Expr::Linear {
                terms: revenue_terms,
                constant: 0,
            })?;

        let operating = ctx.model.define(
            Some("operating_cost".into()),
            Expr::Linear {
                terms: cost.cost.iter().flatten().map(|&c| (1, c)).collect(),
                constant: 0,
            },
        )?;

        let mut charter_terms = Vec::with_capacity(ctx.dims.rotations);
        for (&rate, &vessels) in feature.charter.iter().zip(&availability.vessels) {
            charter_terms.push((CHARTER_DAYS, ctx.model.product(rate, vessels)?));
        }
        let charter = ctx.model.define(
            Some("charter_cost".into()),
            Expr::Linear {
                terms: charter_terms,
                constant: 0,
            },
        )?;

        let transshipment_terms = ctx
            .instance
            .ports()
            .iter()
            .zip(&cost.transshipped)
            .map(|(port, &teu)| (port.transshipment_cost, teu))
            .collect();
        let transshipment = ctx.model.define(
            Some("transshipment_cost".into()),
            Expr::Linear {
                terms: transshipment_terms,
                constant: 0,
            },
        )?;

        let profit = ctx.model.define(
            Some("profit".into()),
            Expr::Linear {
                terms: vec![
                    (1, revenue),
                    (-1, operating),
                    (-1, charter),
                    (-1, transshipment),
                ],
                constant: 0,
            },
        )?;

        ctx.model.record_group(
            "objective",
            VarKind::Int,
            Shape::D1(5),
            vec![revenue, operating, charter, transshipment, profit],
        );

        Ok(Self {
            revenue,
            operating,
            charter,
            transshipment,
            profit,
        })
    }

    fn post(&self, ctx: &mut ModelContext<'_>, _: ObjectiveDeps<'_>) -> Result<()> {
        ctx.model.maximize(self.profit);
        Ok(())
    }
}
