use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonFinite { field: &'static str },
    GapRangeInverted { min: i32, max_exclusive: i32 },
    GapSizeNotPositive { gap_size: i32 },
    ScrollVelocityNotPositive { velocity: f64 },
    TiltBoundsInverted { min: f64, max: f64 },
    GroundAboveCeiling { ceiling_y: f64, ground_y: f64 },
    AgentStartOutOfBounds { x: f64, y: f64 },
    GapOutsidePlayfield { min: i32, max_exclusive: i32, gap_size: i32 },
    SpawnBehindAgent { spawn_x: f64, agent_start_x: f64 },
    ZeroTickLimit,
    FirstGapOutOfRange { center: i32, min: i32, max_exclusive: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{field} must be a finite number"),
            Self::GapRangeInverted { min, max_exclusive } => write!(
                f,
                "gap centre range is empty or inverted: [{min}, {max_exclusive})"
            ),
            Self::GapSizeNotPositive { gap_size } => {
                write!(f, "gap size must be positive, got {gap_size}")
            }
            Self::ScrollVelocityNotPositive { velocity } => {
                write!(f, "scroll velocity must be positive, got {velocity}")
            }
            Self::TiltBoundsInverted { min, max } => {
                write!(f, "tilt bounds inverted: min={min}, max={max}")
            }
            Self::GroundAboveCeiling { ceiling_y, ground_y } => write!(
                f,
                "ground y ({ground_y}) must lie below ceiling y ({ceiling_y})"
            ),
            Self::AgentStartOutOfBounds { x, y } => {
                write!(f, "agent start ({x}, {y}) is outside the playfield")
            }
            Self::GapOutsidePlayfield {
                min,
                max_exclusive,
                gap_size,
            } => write!(
                f,
                "gap size {gap_size} over centres [{min}, {max_exclusive}) leaves the playfield"
            ),
            Self::SpawnBehindAgent {
                spawn_x,
                agent_start_x,
            } => write!(
                f,
                "obstacles spawn at x={spawn_x}, left of the agent at x={agent_start_x}"
            ),
            Self::ZeroTickLimit => write!(f, "max_ticks must be at least 1 when set"),
            Self::FirstGapOutOfRange {
                center,
                min,
                max_exclusive,
            } => write!(
                f,
                "first gap centre {center} outside configured range [{min}, {max_exclusive})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantCode {
    PopulationAccounting,
    AgentTiltRange,
    AgentNotFinite,
    ObstacleOrder,
    FitnessNotFinite,
}

impl fmt::Display for InvariantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PopulationAccounting => write!(f, "POPULATION_ACCOUNTING"),
            Self::AgentTiltRange => write!(f, "AGENT_TILT_RANGE"),
            Self::AgentNotFinite => write!(f, "AGENT_NOT_FINITE"),
            Self::ObstacleOrder => write!(f, "OBSTACLE_ORDER"),
            Self::FitnessNotFinite => write!(f, "FITNESS_NOT_FINITE"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EpisodeError {
    InvariantViolation { tick: u32, code: InvariantCode },
    Finished { tick: u32 },
}

impl fmt::Display for EpisodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvariantViolation { tick, code } => {
                write!(f, "invariant violation at tick {tick}: {code}")
            }
            Self::Finished { tick } => write!(f, "episode already terminated at tick {tick}"),
        }
    }
}

impl std::error::Error for EpisodeError {}

/// Failure reported by a decision function. The evaluator eliminates the
/// agent that produced it and carries on with the rest of the population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionError {
    message: String,
}

impl DecisionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision function failed: {}", self.message)
    }
}

impl std::error::Error for DecisionError {}
