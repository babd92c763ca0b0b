//! Read-only instance facade.
//!
//! Plain data holders for one liner shipping network design instance.
//! Values are validated as they are inserted, so a built [`Instance`] only
//! holds well-formed codes, positive quantities and known references.
//! Parsing a concrete file format is left to callers.

mod entities;

pub use entities::{
    Canal, CanalPassage, Commodity, FuelProfile, FuelType, LocationCode, Port, PortCall,
    VesselType,
};

use crate::error::{ModelError, Result};
use std::collections::HashMap;

/// Directed sailing distances in nautical miles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distances {
    table: HashMap<String, HashMap<String, i64>>,
    count: usize,
}

impl Distances {
    /// Records `origin → destination`. Self distances, duplicates and
    /// non-positive values are rejected.
    pub fn add(&mut self, origin: &str, destination: &str, distance: i64) -> Result<()> {
        if origin == destination {
            return Err(ModelError::InvalidInstance(format!(
                "distance from {origin} to itself"
            )));
        }
        if distance <= 0 {
            return Err(ModelError::out_of_range(
                "distance",
                format!("{origin} -> {destination}: {distance} is not positive"),
            ));
        }
        let row = self.table.entry(origin.to_string()).or_default();
        if row.contains_key(destination) {
            return Err(ModelError::Duplicate {
                kind: "distance",
                name: format!("{origin} -> {destination}"),
            });
        }
        row.insert(destination.to_string(), distance);
        self.count += 1;
        Ok(())
    }

    /// Distance from `origin` to `destination`, 0 when undefined.
    pub fn get(&self, origin: &str, destination: &str) -> i64 {
        self.table
            .get(origin)
            .and_then(|row| row.get(destination))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Largest recorded distance, 0 when empty.
    pub fn max(&self) -> i64 {
        self.table
            .values()
            .flat_map(|row| row.values())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// One problem instance.
///
/// Commodities with a transit-time bound are kept in a prefix of
/// [`commodities`](Self::commodities) of length
/// [`commodities_with_transit_time`](Self::commodities_with_transit_time).
///
/// # Examples
///
/// ```
/// use u_liner::instance::{Commodity, Instance, Port};
///
/// let mut inst = Instance::new();
/// inst.add_port(Port::new("NLRTM", 10_000, 15.0, 5).unwrap()).unwrap();
/// inst.add_port(Port::new("DEHAM", 10_000, 15.0, 5).unwrap()).unwrap();
/// inst.add_distance("NLRTM", "DEHAM", 300).unwrap();
/// inst.add_commodity(Commodity::new("NLRTM", "DEHAM", 40, 900, "dry", 0).unwrap()).unwrap();
/// inst.add_commodity(Commodity::new("DEHAM", "NLRTM", 10, 900, "dry", 72).unwrap()).unwrap();
/// assert_eq!(inst.commodities_with_transit_time(), 1);
/// assert_eq!(inst.commodities()[0].transit_time, 72);
/// assert_eq!(inst.distance("DEHAM", "NLRTM"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    ports: Vec<Port>,
    canals: Vec<Canal>,
    fuel_types: Vec<FuelType>,
    vessel_types: Vec<VesselType>,
    commodities: Vec<Commodity>,
    with_transit_time: usize,
    distances: Distances,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_location(&self, code: &str) -> bool {
        self.port_index(code).is_some() || self.canal_index(code).is_some()
    }

    pub fn add_port(&mut self, port: Port) -> Result<()> {
        if self.is_location(port.code.as_str()) {
            return Err(ModelError::Duplicate {
                kind: "location",
                name: port.code.to_string(),
            });
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn add_canal(&mut self, canal: Canal) -> Result<()> {
        if self.is_location(canal.code.as_str()) {
            return Err(ModelError::Duplicate {
                kind: "location",
                name: canal.code.to_string(),
            });
        }
        self.canals.push(canal);
        Ok(())
    }

    pub fn add_fuel_type(&mut self, fuel: FuelType) -> Result<()> {
        if self.fuel_type(&fuel.label).is_some() {
            return Err(ModelError::Duplicate {
                kind: "fuel type",
                name: fuel.label,
            });
        }
        self.fuel_types.push(fuel);
        Ok(())
    }

    /// Adds a vessel type; every fuel it burns must already be known.
    pub fn add_vessel_type(&mut self, vessel: VesselType) -> Result<()> {
        if self.vessel_types.iter().any(|v| v.label == vessel.label) {
            return Err(ModelError::Duplicate {
                kind: "vessel type",
                name: vessel.label,
            });
        }
        if let Some(f) = vessel
            .fuels()
            .iter()
            .find(|f| self.fuel_type(&f.fuel).is_none())
        {
            return Err(ModelError::UnknownReference {
                kind: "fuel type",
                name: f.fuel.clone(),
            });
        }
        self.vessel_types.push(vessel);
        Ok(())
    }

    /// Adds a commodity between two known ports.
    pub fn add_commodity(&mut self, commodity: Commodity) -> Result<()> {
        for code in [&commodity.origin, &commodity.destination] {
            if self.port_index(code.as_str()).is_none() {
                return Err(ModelError::UnknownReference {
                    kind: "port",
                    name: code.to_string(),
                });
            }
        }
        if commodity.has_transit_bound() {
            self.commodities.insert(self.with_transit_time, commodity);
            self.with_transit_time += 1;
        } else {
            self.commodities.push(commodity);
        }
        Ok(())
    }

    /// Adds a directed distance between two known locations.
    pub fn add_distance(&mut self, origin: &str, destination: &str, distance: i64) -> Result<()> {
        for code in [origin, destination] {
            if !self.is_location(code) {
                return Err(ModelError::UnknownReference {
                    kind: "location",
                    name: code.to_string(),
                });
            }
        }
        self.distances.add(origin, destination, distance)
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn canals(&self) -> &[Canal] {
        &self.canals
    }

    pub fn fuel_types(&self) -> &[FuelType] {
        &self.fuel_types
    }

    pub fn vessel_types(&self) -> &[VesselType] {
        &self.vessel_types
    }

    pub fn commodities(&self) -> &[Commodity] {
        &self.commodities
    }

    /// Length of the transit-bounded prefix of the commodity list.
    pub fn commodities_with_transit_time(&self) -> usize {
        self.with_transit_time
    }

    pub fn distances(&self) -> &Distances {
        &self.distances
    }

    /// Distance between two location codes, 0 when undefined.
    pub fn distance(&self, origin: &str, destination: &str) -> i64 {
        self.distances.get(origin, destination)
    }

    pub fn port_index(&self, code: &str) -> Option<usize> {
        self.ports.iter().position(|p| p.code.as_str() == code)
    }

    pub fn canal_index(&self, code: &str) -> Option<usize> {
        self.canals.iter().position(|c| c.code.as_str() == code)
    }

    pub fn fuel_type(&self, label: &str) -> Option<&FuelType> {
        self.fuel_types.iter().find(|f| f.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ports() -> Instance {
        let mut inst = Instance::new();
        inst.add_port(Port::new("NLRTM", 0, 0.0, 0).unwrap()).unwrap();
        inst.add_port(Port::new("DEHAM", 0, 0.0, 0).unwrap()).unwrap();
        inst
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let mut inst = two_ports();
        assert!(inst.add_port(Port::new("NLRTM", 0, 0.0, 0).unwrap()).is_err());
        assert!(inst.add_canal(Canal::new("DEHAM", 0, 0.0, 5).unwrap()).is_err());
    }

    #[test]
    fn test_distance_rules() {
        let mut inst = two_ports();
        assert!(inst.add_distance("NLRTM", "NLRTM", 10).is_err());
        assert!(inst.add_distance("NLRTM", "DEHAM", 0).is_err());
        assert!(inst.add_distance("NLRTM", "XXXXX", 10).is_err());
        inst.add_distance("NLRTM", "DEHAM", 10).unwrap();
        assert!(matches!(
            inst.add_distance("NLRTM", "DEHAM", 12),
            Err(ModelError::Duplicate { .. })
        ));
        assert_eq!(inst.distance("NLRTM", "DEHAM"), 10);
        assert_eq!(inst.distance("DEHAM", "NLRTM"), 0);
        assert_eq!(inst.distances().max(), 10);
        assert_eq!(inst.distances().len(), 1);
    }

    #[test]
    fn test_commodity_needs_known_ports() {
        let mut inst = two_ports();
        let c = Commodity::new("NLRTM", "BEANR", 1, 1, "dry", 0).unwrap();
        assert!(matches!(
            inst.add_commodity(c),
            Err(ModelError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_transit_bounded_commodities_first() {
        let mut inst = two_ports();
        for tt in [0, 24, 0, 48] {
            inst.add_commodity(Commodity::new("NLRTM", "DEHAM", 1, 1, "dry", tt).unwrap())
                .unwrap();
        }
        let tts: Vec<i64> = inst.commodities().iter().map(|c| c.transit_time).collect();
        assert_eq!(tts, vec![24, 48, 0, 0]);
        assert_eq!(inst.commodities_with_transit_time(), 2);
    }

    #[test]
    fn test_vessel_fuel_must_exist() {
        let mut inst = two_ports();
        let v = VesselType::new("Feeder", 100, 100, 1, 10, 10, 20)
            .unwrap()
            .with_fuel("IFO", 15, 3.0)
            .unwrap();
        assert!(inst.add_vessel_type(v.clone()).is_err());
        inst.add_fuel_type(FuelType::new("IFO", 300).unwrap()).unwrap();
        inst.add_vessel_type(v).unwrap();
        assert_eq!(inst.vessel_types().len(), 1);
    }
}
