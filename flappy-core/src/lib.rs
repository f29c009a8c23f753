pub mod agent;
pub mod config;
pub mod constants;
pub mod error;
pub mod ground;
pub mod obstacle;
pub mod rng;
pub mod silhouette;
pub mod stream;

mod episode;

pub use agent::Agent;
pub use config::SimConfig;
pub use episode::{
    AgentPose, AgentResult, Controller, EliminationCause, Episode, EpisodeOutcome, EpisodePhase,
    EpisodeSetup, FnController, FrameSnapshot, MemberId, Observation, ObstacleSnapshot,
    PopulationMember, TerminationReason, TickReport,
};
pub use error::{ConfigError, DecisionError, EpisodeError, InvariantCode};
pub use obstacle::Obstacle;
pub use stream::ObstacleStream;
