use std::fmt;

/// Why a configuration was refused. The session does not start on any of these.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonFinite {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    ThresholdOrder {
        activation: f32,
        deactivation: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{field} must be a finite number"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} out of range: {value} (allowed {min}..={max})"),
            Self::InvertedRange { field, min, max } => {
                write!(f, "{field} is inverted: min {min} > max {max}")
            }
            Self::ThresholdOrder {
                activation,
                deactivation,
            } => write!(
                f,
                "slice deactivation threshold {deactivation} exceeds activation threshold {activation}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A hand sample the tracker refused. Recovered locally by dropping the sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAnomaly {
    LowConfidence,
    OutOfOrder,
    NonFinite,
}

impl fmt::Display for InputAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowConfidence => write!(f, "sample below confidence threshold"),
            Self::OutOfOrder => write!(f, "sample not newer than last accepted sample"),
            Self::NonFinite => write!(f, "sample has non-finite position or timestamp"),
        }
    }
}

impl std::error::Error for InputAnomaly {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    PhaseLivesConsistency,
    LivesAboveMaximum,
    FruitIdMismatch,
    FruitIllegalTransition,
    FruitResolutionTimestamp,
    FruitNonFinite,
    SlicePathOrder,
    SlicePathRetention,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseLivesConsistency => write!(f, "PHASE_LIVES_CONSISTENCY"),
            Self::LivesAboveMaximum => write!(f, "LIVES_ABOVE_MAXIMUM"),
            Self::FruitIdMismatch => write!(f, "FRUIT_ID_MISMATCH"),
            Self::FruitIllegalTransition => write!(f, "FRUIT_ILLEGAL_TRANSITION"),
            Self::FruitResolutionTimestamp => write!(f, "FRUIT_RESOLUTION_TIMESTAMP"),
            Self::FruitNonFinite => write!(f, "FRUIT_NON_FINITE"),
            Self::SlicePathOrder => write!(f, "SLICE_PATH_ORDER"),
            Self::SlicePathRetention => write!(f, "SLICE_PATH_RETENTION"),
        }
    }
}

/// Core state broke a rule it must always hold. The frame that observed it is
/// aborted; continuing would propagate the corruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub frame: u64,
    pub rule: RuleCode,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violation at frame {}: {}", self.frame, self.rule)
    }
}

impl std::error::Error for InvariantViolation {}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    Config(ConfigError),
    Invariant(InvariantViolation),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Invariant(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Invariant(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<InvariantViolation> for SessionError {
    fn from(err: InvariantViolation) -> Self {
        Self::Invariant(err)
    }
}
