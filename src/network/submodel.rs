//! The submodel protocol.

use super::context::ModelContext;
use crate::error::Result;
use tracing::info;

/// One slice of the network model.
///
/// A submodel first declares its variables, then posts the constraints
/// linking them to the handles of the submodels it depends on. Dependencies
/// are passed as typed references, so a submodel cannot be built before
/// the ones it reads from.
pub trait Submodel: Sized {
    /// Scope recorded on every constraint the submodel posts.
    const NAME: &'static str;

    /// Handles of earlier submodels.
    type Deps<'a>: Copy;

    /// Declares the submodel's variables, including derived ones.
    fn declare(ctx: &mut ModelContext<'_>, deps: Self::Deps<'_>) -> Result<Self>;

    /// Posts the submodel's constraints.
    fn post(&self, ctx: &mut ModelContext<'_>, deps: Self::Deps<'_>) -> Result<()>;
}

/// Declares then posts `S` under its own scope.
pub fn compose<S: Submodel>(ctx: &mut ModelContext<'_>, deps: S::Deps<'_>) -> Result<S> {
    let (vars, constraints) = (ctx.model.var_count(), ctx.model.constraint_count());
    ctx.model.set_scope(S::NAME);
    let submodel = S::declare(ctx, deps)?;
    submodel.post(ctx, deps)?;
    info!(
        submodel = S::NAME,
        variables = ctx.model.var_count() - vars,
        constraints = ctx.model.constraint_count() - constraints,
        "submodel posted"
    );
    Ok(submodel)
}
