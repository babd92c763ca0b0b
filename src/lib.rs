//! Liner shipping network design as a constraint-programming model.
//!
//! Builds the CP model of the Liner Shipping Network Design Problem
//! (LSNDP): which rotations to sail with which vessel types, how
//! commodities are routed over them, and at what speeds, so that revenue
//! minus operating, charter and transshipment costs is maximal.
//!
//! - **CP modelling layer** ([`cp`]): variables with typed handles,
//!   domains, shared tuple sets, constraints, a clause encoder for
//!   conditional statements, a solution checker and the [`cp::CpSolver`]
//!   trait for engine adapters.
//! - **Instance facade** ([`instance`]): ports, canals, fuel types, vessel
//!   types, commodities and distances, validated on insertion.
//! - **Network model** ([`network`]): auxiliary precomputation, the
//!   submodels, the builder wiring them in dependency order, result
//!   export and search-order portfolios.
//!
//! # Architecture
//!
//! The crate describes the model only. Propagation and search belong to
//! an external engine behind [`cp::CpSolver`]; every solution it returns
//! is re-checked against the model before being reported.
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for configuration, instance data
//!   and exported records.
//! - `parallel`: per-location sailing tables computed with `rayon`.

pub mod cp;
pub mod error;
pub mod instance;
pub mod network;
