//! Population evaluator: one episode of many agents sharing an obstacle stream.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::{ConfigError, DecisionError, EpisodeError, InvariantCode};
use crate::ground::ScrollingGround;
use crate::obstacle::{agent_origin, Obstacle};
use crate::silhouette::SilhouetteSet;
use crate::stream::ObstacleStream;

mod state;

pub use state::{
    AgentPose, AgentResult, EliminationCause, EpisodeOutcome, EpisodePhase, FrameSnapshot,
    ObstacleSnapshot, TerminationReason, TickReport,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an agent sees when deciding whether to jump.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub height: f64,
    /// Vertical distance to the relevant top barrier sprite's y, i.e. the
    /// lower edge of the gap raised by the barrier height.
    pub top_gap_distance: f64,
    /// Vertical distance to the upper edge of the relevant bottom barrier.
    pub bottom_gap_distance: f64,
}

impl Observation {
    fn new(agent: &Agent, obstacle: Option<&Obstacle>, config: &SimConfig) -> Self {
        let (top, bottom) = match obstacle {
            Some(obstacle) => (
                f64::from(obstacle.top_barrier_y()),
                f64::from(obstacle.gap_bottom()),
            ),
            None => (config.playfield.ceiling_y, config.playfield.ground_y),
        };
        Self {
            height: agent.y,
            top_gap_distance: (agent.y - top).abs(),
            bottom_gap_distance: (agent.y - bottom).abs(),
        }
    }
}

/// Decision function of one population member. Values above the configured
/// threshold make the agent jump.
pub trait Controller {
    fn decide(&mut self, observation: &Observation) -> Result<f64, DecisionError>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn decide(&mut self, observation: &Observation) -> Result<f64, DecisionError> {
        (**self).decide(observation)
    }
}

impl<C: Controller + ?Sized> Controller for &mut C {
    fn decide(&mut self, observation: &Observation) -> Result<f64, DecisionError> {
        (**self).decide(observation)
    }
}

/// Adapts an infallible closure into a `Controller`.
pub struct FnController<F>(pub F);

impl<F> Controller for FnController<F>
where
    F: FnMut(&Observation) -> f64,
{
    fn decide(&mut self, observation: &Observation) -> Result<f64, DecisionError> {
        Ok((self.0)(observation))
    }
}

pub struct PopulationMember<C> {
    pub id: MemberId,
    pub controller: C,
}

impl<C> PopulationMember<C> {
    pub fn new(id: MemberId, controller: C) -> Self {
        Self { id, controller }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSetup {
    pub seed: u32,
    /// Owned by the evolutionary driver; carried through to reports.
    pub generation: u32,
    /// Pins the first gap instead of drawing it from the seed.
    pub first_gap_center: Option<i32>,
}

impl EpisodeSetup {
    pub fn new(seed: u32, generation: u32) -> Self {
        Self {
            seed,
            generation,
            first_gap_center: None,
        }
    }

    pub fn with_first_gap(mut self, center: i32) -> Self {
        self.first_gap_center = Some(center);
        self
    }
}

/// Agent state, decision function and fitness of one member, kept together.
struct AgentRecord<C> {
    slot: usize,
    id: MemberId,
    agent: Agent,
    controller: C,
    fitness: f64,
    eliminated: Option<EliminationCause>,
}

impl<C> AgentRecord<C> {
    #[inline]
    fn is_live(&self) -> bool {
        self.eliminated.is_none()
    }

    fn result(&self, tick: u32, cause: EliminationCause) -> AgentResult {
        AgentResult {
            id: self.id,
            fitness: self.fitness,
            ticks_survived: tick,
            cause,
        }
    }
}

pub struct Episode<C> {
    config: SimConfig,
    setup: EpisodeSetup,
    phase: EpisodePhase,
    tick: u32,
    score: u32,
    records: Vec<AgentRecord<C>>,
    /// Indexed by population slot; filled as members leave the episode.
    results: Vec<Option<AgentResult>>,
    stream: ObstacleStream,
    ground: ScrollingGround,
    silhouettes: SilhouetteSet,
}

impl<C: Controller> Episode<C> {
    pub fn new(
        config: SimConfig,
        setup: EpisodeSetup,
        members: impl IntoIterator<Item = PopulationMember<C>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let obstacles = config.obstacles;
        let stream = match setup.first_gap_center {
            Some(center) => {
                if center < obstacles.gap_center_min || center >= obstacles.gap_center_max_exclusive
                {
                    return Err(ConfigError::FirstGapOutOfRange {
                        center,
                        min: obstacles.gap_center_min,
                        max_exclusive: obstacles.gap_center_max_exclusive,
                    });
                }
                ObstacleStream::with_first_gap(obstacles, config.spawn_x(), setup.seed, center)
            }
            None => ObstacleStream::new(obstacles, config.spawn_x(), setup.seed),
        };

        let start_x = config.playfield.agent_start_x;
        let start_y = config.playfield.agent_start_y;
        let records: Vec<AgentRecord<C>> = members
            .into_iter()
            .enumerate()
            .map(|(slot, member)| AgentRecord {
                slot,
                id: member.id,
                agent: Agent::new(start_x, start_y),
                controller: member.controller,
                fitness: 0.0,
                eliminated: None,
            })
            .collect();

        let phase = if records.is_empty() {
            EpisodePhase::Terminated(TerminationReason::AllEliminated)
        } else {
            EpisodePhase::Initializing
        };

        Ok(Self {
            results: vec![None; records.len()],
            records,
            phase,
            tick: 0,
            score: 0,
            stream,
            ground: ScrollingGround::new(config.playfield.ground_y),
            silhouettes: SilhouetteSet::new(),
            config,
            setup,
        })
    }

    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn population_size(&self) -> usize {
        self.results.len()
    }

    #[inline]
    pub fn setup(&self) -> &EpisodeSetup {
        &self.setup
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.stream.obstacles()
    }

    /// Runs ticks until every agent is gone or the tick limit is reached.
    pub fn run(&mut self) -> Result<EpisodeOutcome, EpisodeError> {
        loop {
            if let EpisodePhase::Terminated(reason) = self.phase {
                return Ok(self.build_outcome(reason));
            }
            self.step()?;
        }
    }

    /// Final results once terminated; `None` while the episode is still going.
    pub fn outcome(&self) -> Option<EpisodeOutcome> {
        match self.phase {
            EpisodePhase::Terminated(reason) => Some(self.build_outcome(reason)),
            _ => None,
        }
    }

    pub fn step(&mut self) -> Result<TickReport, EpisodeError> {
        if let EpisodePhase::Terminated(_) = self.phase {
            return Err(EpisodeError::Finished { tick: self.tick });
        }
        self.phase = EpisodePhase::Running;
        self.tick += 1;

        let mut eliminations = Vec::new();

        self.update_agents();
        self.handle_collisions();
        self.prune_eliminated(&mut eliminations);

        let cleared = self
            .stream
            .tick(self.config.playfield.agent_start_x)
            .cleared;
        if cleared > 0 {
            let bonus = self.config.rewards.clear_bonus * f64::from(cleared);
            for record in &mut self.records {
                record.fitness += bonus;
            }
            self.score += cleared;
        }

        self.ground.advance(self.config.obstacles.scroll_velocity);
        self.handle_boundaries();
        self.prune_eliminated(&mut eliminations);

        if self.records.is_empty() {
            self.terminate(TerminationReason::AllEliminated, &mut eliminations);
        } else if self.config.max_ticks.is_some_and(|limit| self.tick >= limit) {
            self.terminate(TerminationReason::TickLimit, &mut eliminations);
        }

        self.validate_invariants()
            .map_err(|code| EpisodeError::InvariantViolation {
                tick: self.tick,
                code,
            })?;

        Ok(TickReport {
            tick: self.tick,
            eliminations,
            cleared,
            live: self.records.len(),
            score: self.score,
            phase: self.phase,
        })
    }

    fn update_agents(&mut self) {
        let index = self
            .stream
            .next_relevant_index(self.config.playfield.agent_start_x);
        let relevant = self.stream.obstacles().get(index);
        let physics = &self.config.physics;

        for record in &mut self.records {
            record.agent.advance(physics);
            let observation = Observation::new(&record.agent, relevant, &self.config);
            match record.controller.decide(&observation) {
                Ok(decision) => {
                    record.fitness += self.config.rewards.survival_reward;
                    if decision > self.config.jump_threshold {
                        record.agent.jump(physics);
                    }
                }
                Err(error) => {
                    tracing::trace!(
                        member = %record.id,
                        tick = self.tick,
                        %error,
                        "decision fault"
                    );
                    record.eliminated = Some(EliminationCause::DecisionFault);
                }
            }
        }
    }

    fn handle_collisions(&mut self) {
        let penalty = self.config.rewards.collision_penalty;
        let obstacles = self.stream.obstacles();

        for record in self.records.iter_mut().filter(|record| record.is_live()) {
            let (posed, barriers) = self.silhouettes.pose(record.agent.tilt_deg);
            let origin = agent_origin(&record.agent, posed);
            let hit = obstacles
                .iter()
                .any(|obstacle| obstacle.overlaps_posed(posed, origin, barriers));
            if hit {
                record.fitness -= penalty;
                record.eliminated = Some(EliminationCause::Collision);
            }
        }
    }

    fn handle_boundaries(&mut self) {
        let lower = self.ground.y;
        let upper = self.config.playfield.ceiling_y;
        for record in &mut self.records {
            if record.agent.is_out_of_bounds(lower, upper) {
                record.eliminated = Some(EliminationCause::OutOfBounds);
            }
        }
    }

    fn prune_eliminated(&mut self, eliminations: &mut Vec<AgentResult>) {
        let tick = self.tick;
        let results = &mut self.results;
        self.records.retain(|record| match record.eliminated {
            None => true,
            Some(cause) => {
                let result = record.result(tick, cause);
                tracing::trace!(
                    member = %record.id,
                    tick,
                    ?cause,
                    fitness = record.fitness,
                    "agent eliminated"
                );
                results[record.slot] = Some(result);
                eliminations.push(result);
                false
            }
        });
    }

    fn terminate(&mut self, reason: TerminationReason, eliminations: &mut Vec<AgentResult>) {
        if reason == TerminationReason::TickLimit {
            for record in &mut self.records {
                record.eliminated = Some(EliminationCause::TickLimit);
            }
            self.prune_eliminated(eliminations);
        }
        self.phase = EpisodePhase::Terminated(reason);
        tracing::debug!(
            generation = self.setup.generation,
            seed = self.setup.seed,
            tick = self.tick,
            score = self.score,
            ?reason,
            "episode terminated"
        );
    }

    pub(crate) fn validate_invariants(&self) -> Result<(), InvariantCode> {
        let finished = self.results.iter().filter(|result| result.is_some()).count();
        if finished + self.records.len() != self.results.len() {
            return Err(InvariantCode::PopulationAccounting);
        }
        debug_assert!(self.records.iter().all(AgentRecord::is_live));

        let physics = &self.config.physics;
        for record in &self.records {
            if self.results[record.slot].is_some() {
                return Err(InvariantCode::PopulationAccounting);
            }
            let agent = &record.agent;
            if !(agent.x.is_finite() && agent.y.is_finite() && agent.velocity.is_finite()) {
                return Err(InvariantCode::AgentNotFinite);
            }
            if agent.tilt_deg < physics.min_tilt_deg || agent.tilt_deg > physics.max_tilt_deg {
                return Err(InvariantCode::AgentTiltRange);
            }
            if !record.fitness.is_finite() {
                return Err(InvariantCode::FitnessNotFinite);
            }
        }

        if self
            .results
            .iter()
            .flatten()
            .any(|result| !result.fitness.is_finite())
        {
            return Err(InvariantCode::FitnessNotFinite);
        }

        if !self.stream.is_ordered() {
            return Err(InvariantCode::ObstacleOrder);
        }

        Ok(())
    }

    fn build_outcome(&self, reason: TerminationReason) -> EpisodeOutcome {
        EpisodeOutcome {
            generation: self.setup.generation,
            seed: self.setup.seed,
            score: self.score,
            ticks: self.tick,
            reason,
            results: self.results.iter().flatten().copied().collect(),
        }
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick,
            generation: self.setup.generation,
            score: self.score,
            live: self.records.len(),
            relevant_obstacle: self
                .stream
                .next_relevant_index(self.config.playfield.agent_start_x),
            agents: self
                .records
                .iter()
                .map(|record| AgentPose {
                    id: record.id,
                    x: record.agent.x,
                    y: record.agent.y,
                    tilt_deg: record.agent.tilt_deg,
                    fitness: record.fitness,
                })
                .collect(),
            obstacles: self
                .stream
                .obstacles()
                .iter()
                .map(ObstacleSnapshot::from)
                .collect(),
            ground: self.ground,
        }
    }
}
