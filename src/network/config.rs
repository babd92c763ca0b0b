//! Model configuration.

/// How the number of vessels is derived from a rotation's duration when
/// it is not a whole number of weeks. The first week always needs one
/// vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VesselCountPolicy {
    /// `ceil(hours / 168)`.
    #[default]
    RoundUp,
    /// One more vessel once at least half a week (84 h) is left over.
    RoundUpPastHalf,
    /// Nearest number of weeks; a remainder of exactly half a week rounds
    /// down.
    RoundNearest,
}

/// Constraints ordering interchangeable rotation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymmetryBreaking {
    None,
    /// An unused rotation is followed by unused rotations.
    UnusedLast,
    /// Rotation durations are non-increasing.
    DecreasingDuration,
    /// Both orderings.
    #[default]
    Both,
}

impl SymmetryBreaking {
    pub fn unused_last(self) -> bool {
        matches!(self, SymmetryBreaking::UnusedLast | SymmetryBreaking::Both)
    }

    pub fn decreasing_duration(self) -> bool {
        matches!(
            self,
            SymmetryBreaking::DecreasingDuration | SymmetryBreaking::Both
        )
    }
}

/// Encoding of port operation time from the TEU handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationTime {
    /// Production table posted only when the port is visited.
    #[default]
    ConditionalTable,
    /// Production table posted unconditionally.
    Table,
    /// `teu · ratio / productivity` with product and quotient constraints.
    Division,
}

/// How achievable aggregate loads are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadEnumeration {
    /// Subset-sum reachability over quantities.
    #[default]
    DynamicProgramming,
    /// Every combination of every size; exponential in the commodity count.
    Combinations,
}

/// Configuration of the network design model.
///
/// # Examples
///
/// ```
/// use u_liner::network::{ModelConfig, VesselCountPolicy};
///
/// let config = ModelConfig::default()
///     .with_rotations(3)
///     .with_max_transshipments(1)
///     .with_max_rotation_hours(24 * 7 * 6)
///     .with_vessel_count_policy(VesselCountPolicy::RoundUpPastHalf);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelConfig {
    /// Rotation slots available to the model.
    pub rotations: usize,
    /// Transshipments allowed per commodity (`tsmax`).
    pub max_transshipments: usize,
    /// Upper bound on every clock time and on rotation duration (hours).
    pub max_rotation_hours: i64,
    /// Container moves per TEU handled.
    pub handling_ratio: f64,
    /// Gap between consecutive candidate speeds (knots).
    pub speed_step: i64,
    pub vessel_count_policy: VesselCountPolicy,
    pub symmetry_breaking: SymmetryBreaking,
    /// Use precomputed value sets instead of plain bounds for load, time
    /// and transshipment variables.
    pub refined_domains: bool,
    pub operation_time: OperationTime,
    pub load_enumeration: LoadEnumeration,
    /// Fewest locations (and ports) on a used rotation.
    pub min_rotation_length: usize,
    /// Cap the rotations calling at a port by the commodities starting or
    /// ending there.
    pub limit_rotations_per_port: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rotations: 1,
            max_transshipments: 1,
            max_rotation_hours: 24 * 7 * 12,
            handling_ratio: 0.54,
            speed_step: 1,
            vessel_count_policy: VesselCountPolicy::RoundUp,
            symmetry_breaking: SymmetryBreaking::Both,
            refined_domains: false,
            operation_time: OperationTime::ConditionalTable,
            load_enumeration: LoadEnumeration::DynamicProgramming,
            min_rotation_length: 3,
            limit_rotations_per_port: true,
        }
    }
}

impl ModelConfig {
    pub fn with_rotations(mut self, n: usize) -> Self {
        self.rotations = n;
        self
    }

    pub fn with_max_transshipments(mut self, n: usize) -> Self {
        self.max_transshipments = n;
        self
    }

    pub fn with_max_rotation_hours(mut self, hours: i64) -> Self {
        self.max_rotation_hours = hours;
        self
    }

    pub fn with_handling_ratio(mut self, ratio: f64) -> Self {
        self.handling_ratio = ratio;
        self
    }

    pub fn with_speed_step(mut self, step: i64) -> Self {
        self.speed_step = step;
        self
    }

    pub fn with_vessel_count_policy(mut self, policy: VesselCountPolicy) -> Self {
        self.vessel_count_policy = policy;
        self
    }

    pub fn with_symmetry_breaking(mut self, policy: SymmetryBreaking) -> Self {
        self.symmetry_breaking = policy;
        self
    }

    pub fn with_refined_domains(mut self, refined: bool) -> Self {
        self.refined_domains = refined;
        self
    }

    pub fn with_operation_time(mut self, encoding: OperationTime) -> Self {
        self.operation_time = encoding;
        self
    }

    pub fn with_load_enumeration(mut self, enumeration: LoadEnumeration) -> Self {
        self.load_enumeration = enumeration;
        self
    }

    pub fn with_min_rotation_length(mut self, n: usize) -> Self {
        self.min_rotation_length = n;
        self
    }

    pub fn with_limit_rotations_per_port(mut self, limit: bool) -> Self {
        self.limit_rotations_per_port = limit;
        self
    }

    /// Handling ratio scaled to an integer percentage.
    pub fn handling_ratio_percent(&self) -> i64 {
        (self.handling_ratio * 100.0).round() as i64
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rotations == 0 {
            return Err("rotations must be at least 1".into());
        }
        if self.max_rotation_hours <= 0 {
            return Err(format!(
                "max_rotation_hours must be positive, got {}",
                self.max_rotation_hours
            ));
        }
        if !(self.handling_ratio > 0.0) {
            return Err(format!(
                "handling_ratio must be positive, got {}",
                self.handling_ratio
            ));
        }
        if self.speed_step <= 0 {
            return Err(format!("speed_step must be positive, got {}", self.speed_step));
        }
        if self.min_rotation_length < 2 {
            return Err(format!(
                "min_rotation_length must be at least 2, got {}",
                self.min_rotation_length
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        let c = ModelConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.handling_ratio_percent(), 54);
        assert_eq!(c.min_rotation_length, 3);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ModelConfig::default().with_rotations(0).validate().is_err());
        assert!(ModelConfig::default().with_max_rotation_hours(0).validate().is_err());
        assert!(ModelConfig::default().with_handling_ratio(0.0).validate().is_err());
        assert!(ModelConfig::default().with_handling_ratio(f64::NAN).validate().is_err());
        assert!(ModelConfig::default().with_speed_step(0).validate().is_err());
        assert!(ModelConfig::default().with_min_rotation_length(1).validate().is_err());
    }

    #[test]
    fn test_handling_ratio_percent_rounds() {
        for (ratio, percent) in [(0.29, 29), (0.57, 57), (0.58, 58), (0.54, 54), (1.0, 100)] {
            let c = ModelConfig::default().with_handling_ratio(ratio);
            assert_eq!(c.handling_ratio_percent(), percent, "ratio {ratio}");
        }
    }

    #[test]
    fn test_zero_transshipments_allowed() {
        let c = ModelConfig::default().with_max_transshipments(0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_symmetry_flags() {
        assert!(SymmetryBreaking::Both.unused_last());
        assert!(SymmetryBreaking::Both.decreasing_duration());
        assert!(!SymmetryBreaking::None.unused_last());
        assert!(SymmetryBreaking::DecreasingDuration.decreasing_duration());
        assert!(!SymmetryBreaking::DecreasingDuration.unused_last());
    }
}
