//! Instance entities: locations, fuels, vessel types, commodities.

use crate::error::{ModelError, Result};
use std::collections::HashMap;
use std::fmt;

/// Five-character location code: two uppercase letters, then uppercase
/// letters or digits (`NLRTM`, `PAPC1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationCode(String);

impl LocationCode {
    pub fn new(code: &str) -> Result<Self> {
        let valid = code.len() == 5
            && code.chars().enumerate().all(|(i, c)| {
                c.is_ascii_uppercase() || (i > 1 && c.is_ascii_digit())
            });
        if valid {
            Ok(Self(code.to_string()))
        } else {
            Err(ModelError::MalformedCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_negative(field: &str, value: i64) -> Result<i64> {
    if value < 0 {
        return Err(ModelError::out_of_range(field, format!("{value} is negative")));
    }
    Ok(value)
}

fn positive(field: &str, value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(ModelError::out_of_range(field, format!("{value} is not positive")));
    }
    Ok(value)
}

fn label(field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(ModelError::out_of_range(field, "empty label"));
    }
    Ok(value.to_string())
}

/// Port attributes specific to one vessel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortCall {
    /// Container moves per hour.
    pub productivity: i64,
    /// Hours to enter the port.
    pub manoeuvring_in: i64,
    /// Hours to leave the port.
    pub manoeuvring_out: i64,
    pub call_cost: i64,
    /// Hours waited before entering.
    pub waiting_time: i64,
}

/// A port.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Port {
    pub code: LocationCode,
    /// Largest vessel size (TEU) the port accepts.
    pub max_size: i64,
    pub max_draft: f64,
    /// Cost per transshipped TEU.
    pub transshipment_cost: i64,
    calls: HashMap<String, PortCall>,
}

impl Port {
    pub fn new(code: &str, max_size: i64, max_draft: f64, transshipment_cost: i64) -> Result<Self> {
        if max_draft < 0.0 {
            return Err(ModelError::out_of_range("max_draft", format!("{max_draft} is negative")));
        }
        Ok(Self {
            code: LocationCode::new(code)?,
            max_size: non_negative("max_size", max_size)?,
            max_draft,
            transshipment_cost: non_negative("transshipment_cost", transshipment_cost)?,
            calls: HashMap::new(),
        })
    }

    /// Registers the attributes of one vessel type at this port.
    pub fn with_call(mut self, vessel_type: &str, call: PortCall) -> Result<Self> {
        non_negative("productivity", call.productivity)?;
        non_negative("manoeuvring_in", call.manoeuvring_in)?;
        non_negative("manoeuvring_out", call.manoeuvring_out)?;
        non_negative("call_cost", call.call_cost)?;
        non_negative("waiting_time", call.waiting_time)?;
        if self.calls.contains_key(vessel_type) {
            return Err(ModelError::Duplicate {
                kind: "port call information",
                name: format!("{}/{vessel_type}", self.code),
            });
        }
        self.calls.insert(vessel_type.to_string(), call);
        Ok(self)
    }

    /// Attributes for `vessel_type`; all zero when undefined.
    pub fn call(&self, vessel_type: &str) -> PortCall {
        self.calls.get(vessel_type).copied().unwrap_or_default()
    }
}

/// Canal attributes specific to one vessel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanalPassage {
    pub cost: i64,
    pub waiting_time: i64,
}

/// A canal, traversable in both directions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Canal {
    pub code: LocationCode,
    pub max_size: i64,
    pub max_draft: f64,
    /// Traversal time in hours.
    pub duration: i64,
    passages: HashMap<String, CanalPassage>,
}

impl Canal {
    pub fn new(code: &str, max_size: i64, max_draft: f64, duration: i64) -> Result<Self> {
        if max_draft < 0.0 {
            return Err(ModelError::out_of_range("max_draft", format!("{max_draft} is negative")));
        }
        Ok(Self {
            code: LocationCode::new(code)?,
            max_size: non_negative("max_size", max_size)?,
            max_draft,
            duration: positive("duration", duration)?,
            passages: HashMap::new(),
        })
    }

    pub fn with_passage(mut self, vessel_type: &str, passage: CanalPassage) -> Result<Self> {
        non_negative("cost", passage.cost)?;
        non_negative("waiting_time", passage.waiting_time)?;
        if self.passages.contains_key(vessel_type) {
            return Err(ModelError::Duplicate {
                kind: "canal passage information",
                name: format!("{}/{vessel_type}", self.code),
            });
        }
        self.passages.insert(vessel_type.to_string(), passage);
        Ok(self)
    }

    /// Attributes for `vessel_type`; all zero when undefined.
    pub fn passage(&self, vessel_type: &str) -> CanalPassage {
        self.passages.get(vessel_type).copied().unwrap_or_default()
    }
}

/// A bunker fuel and its price per ton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuelType {
    pub label: String,
    pub cost: i64,
}

impl FuelType {
    pub fn new(name: &str, cost: i64) -> Result<Self> {
        Ok(Self {
            label: label("fuel label", name)?,
            cost: non_negative("fuel cost", cost)?,
        })
    }
}

/// Design point of a vessel type burning one fuel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuelProfile {
    pub fuel: String,
    /// Knots.
    pub design_speed: i64,
    /// Tons per day at design speed.
    pub design_consumption: f64,
}

/// A class of interchangeable vessels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VesselType {
    pub label: String,
    /// Nominal capacity (TEU).
    pub max_capacity: i64,
    /// Usable capacity (TEU).
    pub real_capacity: i64,
    /// Vessels available in the fleet.
    pub count: i64,
    /// Daily time-charter rate.
    pub charter_rate: i64,
    pub min_speed: i64,
    pub max_speed: i64,
    fuels: Vec<FuelProfile>,
}

impl VesselType {
    pub fn new(
        name: &str,
        max_capacity: i64,
        real_capacity: i64,
        count: i64,
        charter_rate: i64,
        min_speed: i64,
        max_speed: i64,
    ) -> Result<Self> {
        let min_speed = positive("min_speed", min_speed)?;
        let max_speed = positive("max_speed", max_speed)?;
        if min_speed > max_speed {
            return Err(ModelError::out_of_range(
                "speed",
                format!("range {min_speed}..{max_speed} is empty"),
            ));
        }
        Ok(Self {
            label: label("vessel label", name)?,
            max_capacity: positive("max_capacity", max_capacity)?,
            real_capacity: positive("real_capacity", real_capacity)?,
            count: positive("count", count)?,
            charter_rate: positive("charter_rate", charter_rate)?,
            min_speed,
            max_speed,
            fuels: Vec::new(),
        })
    }

    /// Adds the design point for one fuel. The design speed must lie in
    /// the vessel's speed range.
    pub fn with_fuel(mut self, fuel: &str, design_speed: i64, design_consumption: f64) -> Result<Self> {
        if self.fuels.iter().any(|f| f.fuel == fuel) {
            return Err(ModelError::Duplicate {
                kind: "fuel profile",
                name: format!("{}/{fuel}", self.label),
            });
        }
        if design_speed < self.min_speed || design_speed > self.max_speed {
            return Err(ModelError::out_of_range(
                "design_speed",
                format!(
                    "{design_speed} outside {}..{}",
                    self.min_speed, self.max_speed
                ),
            ));
        }
        if design_consumption <= 0.0 {
            return Err(ModelError::out_of_range(
                "design_consumption",
                format!("{design_consumption} is not positive"),
            ));
        }
        self.fuels.push(FuelProfile {
            fuel: fuel.to_string(),
            design_speed,
            design_consumption,
        });
        Ok(self)
    }

    pub fn fuels(&self) -> &[FuelProfile] {
        &self.fuels
    }

    /// The first declared fuel profile, used for consumption and pricing.
    pub fn primary_fuel(&self) -> Option<&FuelProfile> {
        self.fuels.first()
    }
}

/// A demand to move containers between two ports.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Commodity {
    pub origin: LocationCode,
    pub destination: LocationCode,
    /// TEU to move.
    pub quantity: i64,
    /// Revenue per TEU.
    pub revenue: i64,
    pub nature: String,
    /// Maximal transit time in hours; 0 means unconstrained.
    pub transit_time: i64,
}

impl Commodity {
    pub fn new(
        origin: &str,
        destination: &str,
        quantity: i64,
        revenue: i64,
        nature: &str,
        transit_time: i64,
    ) -> Result<Self> {
        Ok(Self {
            origin: LocationCode::new(origin)?,
            destination: LocationCode::new(destination)?,
            quantity: positive("quantity", quantity)?,
            revenue: non_negative("revenue", revenue)?,
            nature: label("nature", nature)?,
            transit_time: non_negative("transit_time", transit_time)?,
        })
    }

    pub fn has_transit_bound(&self) -> bool {
        self.transit_time > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_code() {
        assert!(LocationCode::new("NLRTM").is_ok());
        assert!(LocationCode::new("PAPC1").is_ok());
        assert!(LocationCode::new("N1RTM").is_err());
        assert!(LocationCode::new("nlrtm").is_err());
        assert!(LocationCode::new("NLRT").is_err());
        assert!(LocationCode::new("NLRTMX").is_err());
    }

    #[test]
    fn test_port_call_defaults_to_zero() {
        let port = Port::new("NLRTM", 10_000, 15.0, 5)
            .unwrap()
            .with_call(
                "Feeder",
                PortCall {
                    productivity: 80,
                    manoeuvring_in: 2,
                    manoeuvring_out: 1,
                    call_cost: 500,
                    waiting_time: 3,
                },
            )
            .unwrap();
        assert_eq!(port.call("Feeder").productivity, 80);
        assert_eq!(port.call("Panamax"), PortCall::default());
    }

    #[test]
    fn test_duplicate_call_rejected() {
        let port = Port::new("NLRTM", 10_000, 15.0, 5)
            .unwrap()
            .with_call("Feeder", PortCall::default())
            .unwrap();
        assert!(matches!(
            port.with_call("Feeder", PortCall::default()),
            Err(ModelError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_vessel_validation() {
        assert!(VesselType::new("Feeder", 100, 90, 2, 10, 20, 10).is_err());
        assert!(VesselType::new("", 100, 90, 2, 10, 10, 20).is_err());
        let v = VesselType::new("Feeder", 100, 90, 2, 10, 10, 20).unwrap();
        assert!(v.clone().with_fuel("IFO", 25, 5.0).is_err());
        assert!(v.clone().with_fuel("IFO", 15, 0.0).is_err());
        let v = v.with_fuel("IFO", 15, 5.0).unwrap();
        assert_eq!(v.primary_fuel().map(|f| f.design_speed), Some(15));
    }

    #[test]
    fn test_commodity_validation() {
        assert!(Commodity::new("NLRTM", "DEHAM", 0, 10, "dry", 0).is_err());
        assert!(Commodity::new("NLRTM", "DEHAM", 5, -1, "dry", 0).is_err());
        assert!(Commodity::new("NLRTM", "DEHAM", 5, 10, "dry", -3).is_err());
        let c = Commodity::new("NLRTM", "DEHAM", 5, 10, "dry", 48).unwrap();
        assert!(c.has_transit_bound());
    }

    #[test]
    fn test_canal_duration_positive() {
        assert!(Canal::new("EGSUZ", 0, 0.0, 0).is_err());
        let c = Canal::new("EGSUZ", 0, 0.0, 12).unwrap();
        assert_eq!(c.passage("Feeder"), CanalPassage::default());
    }
}
