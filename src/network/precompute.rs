//! Combinatorial precomputation shared by the submodels.
//!
//! Everything here is a pure function of the instance and the
//! configuration: calling it twice yields identical tables.

use super::config::{LoadEnumeration, ModelConfig, VesselCountPolicy};
use super::locations::Locations;
use crate::error::{ModelError, Result};
use crate::instance::{Instance, VesselType};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Hours in a week.
pub const WEEK: i64 = 168;

/// Largest commodity count accepted by explicit combination enumeration.
pub const MAX_ENUMERATED_COMMODITIES: usize = 30;

/// Candidate next nodes for every node: any other node except the mirror
/// copy of the same canal.
pub fn successor_sets(nb_locations: usize, nb_canals: usize, nb_ports: usize) -> Vec<Vec<usize>> {
    let locations = Locations {
        ports: nb_ports,
        canals: nb_canals,
    };
    debug_assert_eq!(locations.len(), nb_locations);
    (0..nb_locations)
        .map(|p| {
            (0..nb_locations)
                .filter(|&sp| sp != p && !locations.are_mirrors(p, sp))
                .collect()
        })
        .collect()
}

/// Every sum reachable by a subset of `quantities`, ascending, 0 included.
///
/// # Examples
///
/// ```
/// use u_liner::network::all_possible_loads;
///
/// assert_eq!(all_possible_loads(&[3, 5, 3]), vec![0, 3, 5, 6, 8, 11]);
/// ```
pub fn all_possible_loads(quantities: &[i64]) -> Vec<i64> {
    let total: i64 = quantities.iter().filter(|&&q| q > 0).sum();
    let mut reachable = vec![false; total as usize + 1];
    reachable[0] = true;
    let mut high = 0usize;
    for &q in quantities.iter().filter(|&&q| q > 0) {
        let q = q as usize;
        for s in (0..=high).rev() {
            if reachable[s] {
                reachable[s + q] = true;
            }
        }
        high += q;
    }
    reachable
        .iter()
        .enumerate()
        .filter(|(_, &r)| r)
        .map(|(s, _)| s as i64)
        .collect()
}

/// Same set as [`all_possible_loads`], obtained by enumerating every
/// combination of commodities.
pub fn all_possible_loads_by_combination(quantities: &[i64]) -> Result<Vec<i64>> {
    let n = quantities.len();
    if n > MAX_ENUMERATED_COMMODITIES {
        return Err(ModelError::InvalidConfig(format!(
            "{n} commodities exceed the {MAX_ENUMERATED_COMMODITIES} accepted by combination enumeration"
        )));
    }
    if n > 20 {
        warn!(commodities = n, "enumerating 2^{n} commodity combinations");
    }
    let mut sums: Vec<i64> = (0u64..1 << n)
        .map(|mask| {
            quantities
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &q)| q)
                .sum()
        })
        .collect();
    sums.sort_unstable();
    sums.dedup();
    Ok(sums)
}

/// Values `l1 + l2` over distinct achievable loads, capped at twice the
/// largest capacity, plus 0.
pub fn total_loads(all_loads: &[i64], max_capacity: i64) -> Vec<i64> {
    let cap = 2 * max_capacity;
    let mut loads: Vec<i64> = all_loads.to_vec();
    loads.sort_unstable();
    loads.dedup();
    let mut out = vec![0];
    for (i, &a) in loads.iter().enumerate() {
        for &b in &loads[i + 1..] {
            if a + b > cap {
                break;
            }
            out.push(a + b);
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// `distance / speed` in whole hours; a fractional part up to one half
/// rounds down, above one half rounds up.
pub fn round_sailing_time(distance: i64, speed: i64) -> i64 {
    let (q, r) = (distance / speed, distance % speed);
    if 2 * r <= speed {
        q
    } else {
        q + 1
    }
}

/// One admissible `(successor, speed, hours)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SailingRow {
    pub successor: usize,
    pub speed: i64,
    pub hours: i64,
}

/// Candidate speeds from `min` to `max` by `step`.
pub fn speed_range(min: i64, max: i64, step: i64) -> impl Iterator<Item = i64> {
    (min..=max).step_by(step.max(1) as usize)
}

fn sailing_rows(
    instance: &Instance,
    locations: &Locations,
    p: usize,
    successors: &[usize],
    speeds: (i64, i64, i64),
    hmax: i64,
) -> Vec<SailingRow> {
    let mut rows = vec![SailingRow {
        successor: p,
        speed: 0,
        hours: 0,
    }];
    let from = locations.code(instance, p);
    for &sp in successors {
        let d = instance.distance(from, locations.code(instance, sp));
        if d <= 0 {
            continue;
        }
        // the bound applies to the exact time, before rounding
        for speed in speed_range(speeds.0, speeds.1, speeds.2).filter(|&s| d <= hmax * 24 * s) {
            rows.push(SailingRow {
                successor: sp,
                speed,
                hours: round_sailing_time(d, speed),
            });
        }
    }
    rows
}

/// Per node: the self-loop row `(p, 0, 0)` and every successor reachable
/// at a candidate speed within `hmax · 24` hours.
///
/// A leg is kept when `distance / speed` does not exceed the bound; a leg
/// just past it is dropped even if its rounded time would fit.
pub fn sailing_time_table(
    instance: &Instance,
    locations: &Locations,
    successors: &[Vec<usize>],
    speed_min: i64,
    speed_max: i64,
    speed_step: i64,
    hmax: i64,
) -> Vec<Vec<SailingRow>> {
    let speeds = (speed_min, speed_max, speed_step);
    #[cfg(feature = "parallel")]
    let iter = successors.par_iter().enumerate();
    #[cfg(not(feature = "parallel"))]
    let iter = successors.iter().enumerate();
    iter.map(|(p, succ)| sailing_rows(instance, locations, p, succ, speeds, hmax))
        .collect()
}

/// Fuel burnt at `speed` under the cubic law, scaled by 10 and truncated.
pub fn consumption(vessel: &VesselType, speed: i64) -> Result<i64> {
    let profile = vessel
        .primary_fuel()
        .ok_or_else(|| ModelError::InvalidInstance(format!("vessel type {} burns no fuel", vessel.label)))?;
    let ratio = speed as f64 / profile.design_speed as f64;
    Ok((ratio.powi(3) * profile.design_consumption * 10.0) as i64)
}

/// Port operation hours for `teu`, or `None` when the port has no
/// productivity for the vessel type.
pub fn production_time(teu: i64, ratio_percent: i64, productivity: i64) -> Option<i64> {
    if productivity <= 0 {
        return None;
    }
    Some(ratio_percent * teu / (productivity * 100))
}

/// Vessels needed to keep a weekly frequency on a rotation lasting `hours`.
pub fn vessels_needed(hours: i64, policy: VesselCountPolicy) -> i64 {
    if hours <= 0 {
        return 0;
    }
    if hours <= WEEK {
        return 1;
    }
    let (weeks, rest) = (hours / WEEK, hours % WEEK);
    let extra = match policy {
        VesselCountPolicy::RoundUp => rest > 0,
        VesselCountPolicy::RoundUpPastHalf => rest >= WEEK / 2,
        VesselCountPolicy::RoundNearest => rest > WEEK / 2,
    };
    weeks + i64::from(extra)
}

/// Commodity attributes resolved to location indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommodityProjection {
    pub origin: usize,
    pub destination: usize,
    pub quantity: i64,
    pub revenue: i64,
    pub transit_time: i64,
}

pub fn project_commodities(instance: &Instance) -> Result<Vec<CommodityProjection>> {
    instance
        .commodities()
        .iter()
        .map(|c| -> Result<CommodityProjection> {
            let index = |code: &crate::instance::LocationCode| {
                instance
                    .port_index(code.as_str())
                    .ok_or_else(|| ModelError::UnknownReference {
                        kind: "port",
                        name: code.to_string(),
                    })
            };
            Ok(CommodityProjection {
                origin: index(&c.origin)?,
                destination: index(&c.destination)?,
                quantity: c.quantity,
                revenue: c.revenue,
                transit_time: c.transit_time,
            })
        })
        .collect()
}

/// All precomputed artifacts for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precomputed {
    pub locations: Locations,
    pub successors: Vec<Vec<usize>>,
    pub commodities: Vec<CommodityProjection>,
    /// Achievable aggregate loads.
    pub all_loads: Vec<i64>,
    /// Achievable loaded-plus-unloaded volumes at a call.
    pub total_loads: Vec<i64>,
    /// Largest nominal vessel capacity.
    pub max_capacity: i64,
    /// Sum of all commodity quantities.
    pub total_quantity: i64,
    pub speed_min: i64,
    pub speed_max: i64,
    /// 0 followed by every candidate speed.
    pub speeds: Vec<i64>,
    pub sailing: Vec<Vec<SailingRow>>,
    pub max_distance: i64,
}

impl Precomputed {
    pub fn compute(instance: &Instance, config: &ModelConfig) -> Result<Self> {
        let locations = Locations::of(instance);
        let successors = successor_sets(locations.len(), locations.canals, locations.ports);
        let commodities = project_commodities(instance)?;
        let quantities: Vec<i64> = commodities.iter().map(|c| c.quantity).collect();
        let all_loads = match config.load_enumeration {
            LoadEnumeration::DynamicProgramming => all_possible_loads(&quantities),
            LoadEnumeration::Combinations => all_possible_loads_by_combination(&quantities)?,
        };
        let max_capacity = instance
            .vessel_types()
            .iter()
            .map(|v| v.max_capacity)
            .max()
            .unwrap_or(0);
        let total_loads = total_loads(&all_loads, max_capacity);
        let speed_min = instance.vessel_types().iter().map(|v| v.min_speed).min().unwrap_or(0);
        let speed_max = instance.vessel_types().iter().map(|v| v.max_speed).max().unwrap_or(0);
        let speeds = std::iter::once(0)
            .chain(speed_range(speed_min, speed_max, config.speed_step))
            .collect();
        let sailing = sailing_time_table(
            instance,
            &locations,
            &successors,
            speed_min,
            speed_max,
            config.speed_step,
            config.max_rotation_hours,
        );
        debug!(
            locations = locations.len(),
            loads = all_loads.len(),
            total_loads = total_loads.len(),
            sailing_rows = sailing.iter().map(Vec::len).sum::<usize>(),
            "precomputation done"
        );
        Ok(Self {
            locations,
            successors,
            total_quantity: quantities.iter().sum(),
            commodities,
            all_loads,
            total_loads,
            max_capacity,
            speed_min,
            speed_max,
            speeds,
            sailing,
            max_distance: instance.distances().max(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Canal, CanalPassage, Commodity, FuelType, Port, PortCall};
    use proptest::prelude::*;

    fn two_ports(forward: i64, backward: i64) -> Instance {
        let mut inst = Instance::new();
        inst.add_port(Port::new("NLRTM", 10_000, 15.0, 5).unwrap()).unwrap();
        inst.add_port(Port::new("DEHAM", 10_000, 15.0, 5).unwrap()).unwrap();
        inst.add_distance("NLRTM", "DEHAM", forward).unwrap();
        inst.add_distance("DEHAM", "NLRTM", backward).unwrap();
        inst
    }

    fn canal_instance() -> Instance {
        let call = PortCall {
            productivity: 30,
            manoeuvring_in: 1,
            manoeuvring_out: 1,
            call_cost: 500,
            waiting_time: 2,
        };
        let mut inst = Instance::new();
        inst.add_fuel_type(FuelType::new("IFO", 400).unwrap()).unwrap();
        inst.add_vessel_type(
            VesselType::new("Feeder", 800, 750, 3, 9_000, 12, 18)
                .unwrap()
                .with_fuel("IFO", 16, 40.0)
                .unwrap(),
        )
        .unwrap();
        inst.add_vessel_type(
            VesselType::new("Panamax", 4_000, 3_800, 2, 25_000, 14, 22)
                .unwrap()
                .with_fuel("IFO", 18, 90.0)
                .unwrap(),
        )
        .unwrap();
        for code in ["NLRTM", "DEHAM", "GBFXT"] {
            let port = Port::new(code, 10_000, 14.0, 60)
                .unwrap()
                .with_call("Feeder", call)
                .unwrap()
                .with_call("Panamax", call)
                .unwrap();
            inst.add_port(port).unwrap();
        }
        let canal = Canal::new("DEKIE", 5_000, 9.5, 8)
            .unwrap()
            .with_passage(
                "Feeder",
                CanalPassage {
                    cost: 2_000,
                    waiting_time: 3,
                },
            )
            .unwrap();
        inst.add_canal(canal).unwrap();
        for (a, b, d) in [
            ("NLRTM", "DEHAM", 310),
            ("NLRTM", "GBFXT", 240),
            ("DEHAM", "GBFXT", 540),
            ("NLRTM", "DEKIE", 280),
            ("DEHAM", "DEKIE", 60),
            ("GBFXT", "DEKIE", 500),
        ] {
            inst.add_distance(a, b, d).unwrap();
            inst.add_distance(b, a, d).unwrap();
        }
        for (o, dst, q, tt) in [
            ("NLRTM", "DEHAM", 120, 0),
            ("DEHAM", "GBFXT", 45, 96),
            ("GBFXT", "NLRTM", 300, 0),
            ("DEHAM", "NLRTM", 45, 0),
        ] {
            inst.add_commodity(Commodity::new(o, dst, q, 1_100, "dry", tt).unwrap())
                .unwrap();
        }
        inst
    }

    #[test]
    fn test_successors_skip_mirror_canal() {
        // 2 ports, 1 canal: nodes 0, 1, 2, 3 with 2 and 3 mirrored
        let s = successor_sets(4, 1, 2);
        assert_eq!(s[0], vec![1, 2, 3]);
        assert_eq!(s[2], vec![0, 1]);
        assert_eq!(s[3], vec![0, 1]);
    }

    #[test]
    fn test_loads_match_combinations() {
        let q = [4, 7, 4, 10];
        assert_eq!(
            all_possible_loads(&q),
            all_possible_loads_by_combination(&q).unwrap()
        );
    }

    #[test]
    fn test_combination_limit() {
        let q = vec![1; MAX_ENUMERATED_COMMODITIES + 1];
        assert!(all_possible_loads_by_combination(&q).is_err());
    }

    #[test]
    fn test_total_loads() {
        assert_eq!(total_loads(&[0, 10], 100), vec![0, 10]);
        assert_eq!(total_loads(&[0, 3, 5, 8], 4), vec![0, 3, 5, 8]);
        assert_eq!(total_loads(&[0, 3, 5, 8], 100), vec![0, 3, 5, 8, 11, 13]);
    }

    #[test]
    fn test_round_sailing_time() {
        assert_eq!(round_sailing_time(1000, 20), 50);
        assert_eq!(round_sailing_time(1000, 16), 62); // 62.5
        assert_eq!(round_sailing_time(1000, 15), 67); // 66.67
        assert_eq!(round_sailing_time(1000, 11), 91); // 90.9
        assert_eq!(round_sailing_time(1000, 13), 77); // 76.9
    }

    #[test]
    fn test_vessels_needed_policies() {
        use VesselCountPolicy::*;
        for policy in [RoundUp, RoundUpPastHalf, RoundNearest] {
            assert_eq!(vessels_needed(0, policy), 0);
            assert_eq!(vessels_needed(1, policy), 1);
            assert_eq!(vessels_needed(168, policy), 1);
            assert_eq!(vessels_needed(336, policy), 2);
        }
        assert_eq!(vessels_needed(169, RoundUp), 2);
        assert_eq!(vessels_needed(169, RoundUpPastHalf), 1);
        assert_eq!(vessels_needed(168 + 84, RoundUpPastHalf), 2);
        assert_eq!(vessels_needed(168 + 84, RoundNearest), 1);
        assert_eq!(vessels_needed(168 + 85, RoundNearest), 2);
    }

    #[test]
    fn test_sailing_bound_uses_exact_time() {
        // 244 / 10 = 24.4 rounds to 24 but exceeds one day
        let inst = two_ports(244, 240);
        let locations = Locations::of(&inst);
        let successors = successor_sets(2, 0, 2);
        let table = sailing_time_table(&inst, &locations, &successors, 10, 10, 1, 1);
        assert_eq!(
            table[0],
            vec![SailingRow {
                successor: 0,
                speed: 0,
                hours: 0
            }]
        );
        assert_eq!(
            table[1][1],
            SailingRow {
                successor: 0,
                speed: 10,
                hours: 24
            }
        );
        assert_eq!(table[1].len(), 2);
    }

    #[test]
    fn test_compute_is_repeatable() {
        let inst = canal_instance();
        for config in [
            ModelConfig::default().with_speed_step(2),
            ModelConfig::default()
                .with_refined_domains(true)
                .with_load_enumeration(LoadEnumeration::Combinations),
        ] {
            let first = Precomputed::compute(&inst, &config).unwrap();
            let second = Precomputed::compute(&inst, &config).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.successors, second.successors);
            assert_eq!(first.all_loads, second.all_loads);
            assert_eq!(first.total_loads, second.total_loads);
            assert_eq!(first.sailing, second.sailing);

            let consumption_table = || -> Vec<i64> {
                inst.vessel_types()
                    .iter()
                    .flat_map(|v| speed_range(v.min_speed, v.max_speed, config.speed_step).map(move |s| (v, s)))
                    .map(|(v, s)| consumption(v, s).unwrap())
                    .collect()
            };
            assert_eq!(consumption_table(), consumption_table());
            let vessels_table = || -> Vec<i64> {
                (0..=config.max_rotation_hours)
                    .map(|h| vessels_needed(h, config.vessel_count_policy))
                    .collect()
            };
            assert_eq!(vessels_table(), vessels_table());
        }
    }

    #[test]
    fn test_compute_on_canal_instance() {
        let inst = canal_instance();
        let dp = Precomputed::compute(&inst, &ModelConfig::default()).unwrap();
        let combinations = Precomputed::compute(
            &inst,
            &ModelConfig::default().with_load_enumeration(LoadEnumeration::Combinations),
        )
        .unwrap();
        assert_eq!(dp.all_loads, combinations.all_loads);
        assert_eq!(dp.locations.len(), 5);
        // canal copies 3 and 4 never follow each other
        assert_eq!(dp.successors[3], vec![0, 1, 2]);
        assert_eq!(dp.successors[4], vec![0, 1, 2]);
        assert_eq!(dp.max_capacity, 4_000);
        assert_eq!(dp.total_quantity, 510);
        assert_eq!((dp.speed_min, dp.speed_max), (12, 22));
        assert_eq!(dp.speeds.len(), 12);
        // the commodity with a transit-time bound comes first
        assert_eq!(dp.commodities[0].transit_time, 96);
        assert!(dp.sailing[3].iter().all(|row| row.successor != 4));
    }

    #[test]
    fn test_production_time() {
        assert_eq!(production_time(10, 54, 1), Some(5));
        assert_eq!(production_time(0, 54, 3), Some(0));
        assert_eq!(production_time(10, 54, 0), None);
    }

    #[test]
    fn test_consumption_cubic() {
        let v = VesselType::new("Feeder", 100, 100, 1, 10, 10, 20)
            .unwrap()
            .with_fuel("MDO", 20, 5.0)
            .unwrap();
        assert_eq!(consumption(&v, 20).unwrap(), 50);
        assert_eq!(consumption(&v, 10).unwrap(), 6);
        assert_eq!(consumption(&v, 0).unwrap(), 0);
        let bare = VesselType::new("Bare", 100, 100, 1, 10, 10, 20).unwrap();
        assert!(consumption(&bare, 15).is_err());
    }

    proptest! {
        #[test]
        fn prop_loads_closed_under_subsets(q in prop::collection::vec(1i64..40, 0..10), mask in any::<u16>()) {
            let loads = all_possible_loads(&q);
            prop_assert_eq!(loads[0], 0);
            let sum: i64 = q.iter().enumerate().filter(|(i, _)| mask & (1 << i) != 0).map(|(_, &x)| x).sum();
            prop_assert!(loads.binary_search(&sum).is_ok());
            prop_assert!(loads.iter().all(|&l| l <= q.iter().sum::<i64>()));
        }

        #[test]
        fn prop_rounding_within_half_hour(d in 1i64..20_000, s in 1i64..30) {
            let t = round_sailing_time(d, s);
            let exact = d as f64 / s as f64;
            prop_assert!((t as f64 - exact).abs() <= 0.5 + 1e-9);
            if exact.fract() <= 0.5 {
                prop_assert_eq!(t, exact.floor() as i64);
            }
        }
    }
}
