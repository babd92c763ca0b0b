//! Liner Shipping Network Design Problem (LSNDP) as a CP model.
//!
//! A fleet of vessel types is deployed on up to `rotations` closed
//! rotations over the ports and canals of an [`Instance`](crate::instance::Instance).
//! Commodities are routed over those rotations with a bounded number of
//! transshipments, and the model maximizes revenue minus port call, fuel,
//! charter and transshipment costs.
//!
//! # Location index space
//!
//! Ports come first, followed by every canal twice (one copy per
//! crossing direction). Canal copies are never successors of each other.
//!
//! # Submodels
//!
//! The model is composed of slices that each declare variables and post
//! constraints under their own scope, in this order:
//!
//! | Scope | Content |
//! |-------|---------|
//! | `rotation` | vessel type, successor circuit, length |
//! | `cargo_flow` | accepted flags, per-leg rotation and port |
//! | `cargo_rotation` | commodity legs call at visited ports |
//! | `feature` | vessel attributes looked up per rotation |
//! | `load` | aboard flags, capacity, handled TEU |
//! | `time` | operation, arrival, departure, speed, duration |
//! | `transit_time` | per-leg boarding and landing times |
//! | `vessel_availability` | vessels per rotation, fleet limits |
//! | `cost` | fuel and port call cost, transshipped TEU |
//! | `objective` | profit |
//! | `symmetry_breaking` | ordering of rotation slots |
//!
//! Only decision variables are free; everything else is defined from them
//! and can be derived with [`NetworkModel::complete`].
//!
//! # Sentinels
//!
//! Vessel type `0` marks an unused rotation and [`UNUSED`] (`-1`) an
//! unused cargo leg or unused start location.

mod builder;
mod cargo_flow;
mod cargo_rotation;
mod config;
mod context;
mod cost;
mod export;
mod feature;
mod load;
mod locations;
mod objective;
mod precompute;
mod rotation;
mod submodel;
mod symmetry;
mod time;
mod transit_time;
mod vessel_availability;

pub use builder::NetworkModel;
pub use cargo_flow::{CargoFlow, UNUSED};
pub use cargo_rotation::CargoRotation;
pub use config::{LoadEnumeration, ModelConfig, OperationTime, SymmetryBreaking, VesselCountPolicy};
pub use context::{Dimensions, ModelContext};
pub use cost::Cost;
pub use export::{export, ResultRecord};
pub use feature::Feature;
pub use load::Load;
pub use locations::Locations;
pub use objective::Objective;
pub use precompute::{
    all_possible_loads, all_possible_loads_by_combination, consumption, production_time,
    project_commodities, round_sailing_time, sailing_time_table, speed_range, successor_sets,
    total_loads, vessels_needed, CommodityProjection, Precomputed, SailingRow,
    MAX_ENUMERATED_COMMODITIES, WEEK,
};
pub use rotation::Rotation;
pub use submodel::{compose, Submodel};
pub use symmetry::SymmetryConstraints;
pub use time::Time;
pub use transit_time::TransitTime;
pub use vessel_availability::VesselAvailability;
