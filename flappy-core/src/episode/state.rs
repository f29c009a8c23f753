use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::ground::ScrollingGround;
use crate::obstacle::Obstacle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodePhase {
    Initializing,
    Running,
    Terminated(TerminationReason),
}

impl EpisodePhase {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    AllEliminated,
    TickLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    Collision,
    OutOfBounds,
    DecisionFault,
    /// Still flying when the episode hit its tick limit.
    TickLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub id: MemberId,
    pub fitness: f64,
    pub ticks_survived: u32,
    pub cause: EliminationCause,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u32,
    pub eliminations: Vec<AgentResult>,
    pub cleared: u32,
    pub live: usize,
    pub score: u32,
    pub phase: EpisodePhase,
}

/// Terminal fitness per member, in population order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub generation: u32,
    pub seed: u32,
    /// Obstacles cleared. Reported for observability; not part of fitness.
    pub score: u32,
    pub ticks: u32,
    pub reason: TerminationReason,
    pub results: Vec<AgentResult>,
}

impl EpisodeOutcome {
    pub fn fitness_of(&self, id: MemberId) -> Option<f64> {
        self.results
            .iter()
            .find(|result| result.id == id)
            .map(|result| result.fitness)
    }

    pub fn best(&self) -> Option<&AgentResult> {
        self.results
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub id: MemberId,
    pub x: f64,
    pub y: f64,
    pub tilt_deg: f64,
    pub fitness: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub x: f64,
    pub gap_center: i32,
    pub gap_top: i32,
    pub gap_bottom: i32,
    pub top_barrier_y: i32,
    pub passed: bool,
}

impl From<&Obstacle> for ObstacleSnapshot {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            x: obstacle.x,
            gap_center: obstacle.gap_center(),
            gap_top: obstacle.gap_top(),
            gap_bottom: obstacle.gap_bottom(),
            top_barrier_y: obstacle.top_barrier_y(),
            passed: obstacle.passed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u32,
    pub generation: u32,
    pub score: u32,
    pub live: usize,
    pub relevant_obstacle: usize,
    pub agents: Vec<AgentPose>,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub ground: ScrollingGround,
}
