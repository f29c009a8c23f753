use crate::constants::{
    AGENT_HEIGHT, AGENT_START_X, AGENT_START_Y, ASCENT_BIAS, BARRIER_HEIGHT, CEILING_Y,
    CLEAR_BONUS, COLLISION_PENALTY, GAP_CENTER_MAX_EXCLUSIVE, GAP_CENTER_MIN, GAP_SIZE, GRAVITY,
    GROUND_Y, INITIAL_OBSTACLE_X, JUMP_THRESHOLD, JUMP_VELOCITY, MAX_TILT_DEG, MIN_TILT_DEG,
    PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, SCROLL_VELOCITY, SPAWN_OFFSET, SURVIVAL_REWARD,
    TERMINAL_DISPLACEMENT, TILT_RATE_DEG, TILT_UP_MARGIN,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical velocity applied by a jump (negative is up).
    pub jump_velocity: f64,
    /// Coefficient of the quadratic term in `d = v*t + g*t^2`.
    pub gravity: f64,
    /// Largest downward displacement in a single tick.
    pub terminal_displacement: f64,
    /// Extra upward push added while displacement is negative.
    pub ascent_bias: f64,
    pub max_tilt_deg: f64,
    pub min_tilt_deg: f64,
    pub tilt_rate_deg: f64,
    /// The agent keeps its nose up until it sinks this far below its last jump height.
    pub tilt_up_margin: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            jump_velocity: JUMP_VELOCITY,
            gravity: GRAVITY,
            terminal_displacement: TERMINAL_DISPLACEMENT,
            ascent_bias: ASCENT_BIAS,
            max_tilt_deg: MAX_TILT_DEG,
            min_tilt_deg: MIN_TILT_DEG,
            tilt_rate_deg: TILT_RATE_DEG,
            tilt_up_margin: TILT_UP_MARGIN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub gap_center_min: i32,
    pub gap_center_max_exclusive: i32,
    pub gap_size: i32,
    pub scroll_velocity: f64,
    /// Distance past the right edge of the playfield where new obstacles appear.
    pub spawn_offset: f64,
    pub initial_x: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            gap_center_min: GAP_CENTER_MIN,
            gap_center_max_exclusive: GAP_CENTER_MAX_EXCLUSIVE,
            gap_size: GAP_SIZE,
            scroll_velocity: SCROLL_VELOCITY,
            spawn_offset: SPAWN_OFFSET,
            initial_x: INITIAL_OBSTACLE_X,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    pub width: f64,
    pub height: f64,
    pub ceiling_y: f64,
    pub ground_y: f64,
    pub agent_start_x: f64,
    pub agent_start_y: f64,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            ceiling_y: CEILING_Y,
            ground_y: GROUND_Y,
            agent_start_x: AGENT_START_X,
            agent_start_y: AGENT_START_Y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub survival_reward: f64,
    pub clear_bonus: f64,
    pub collision_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival_reward: SURVIVAL_REWARD,
            clear_bonus: CLEAR_BONUS,
            collision_penalty: COLLISION_PENALTY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub obstacles: ObstacleConfig,
    pub playfield: PlayfieldConfig,
    pub rewards: RewardConfig,
    /// Decisions strictly above this value trigger a jump.
    pub jump_threshold: f64,
    /// Optional cap on episode length. `None` runs until every agent is gone.
    pub max_ticks: Option<u32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            obstacles: ObstacleConfig::default(),
            playfield: PlayfieldConfig::default(),
            rewards: RewardConfig::default(),
            jump_threshold: JUMP_THRESHOLD,
            max_ticks: None,
        }
    }
}

impl SimConfig {
    pub fn spawn_x(&self) -> f64 {
        self.playfield.width + self.obstacles.spawn_offset
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        let obstacles = &self.obstacles;
        let playfield = &self.playfield;
        let rewards = &self.rewards;

        let finite = [
            ("physics.jump_velocity", physics.jump_velocity),
            ("physics.gravity", physics.gravity),
            ("physics.terminal_displacement", physics.terminal_displacement),
            ("physics.ascent_bias", physics.ascent_bias),
            ("physics.tilt_rate_deg", physics.tilt_rate_deg),
            ("physics.tilt_up_margin", physics.tilt_up_margin),
            ("obstacles.spawn_offset", obstacles.spawn_offset),
            ("obstacles.initial_x", obstacles.initial_x),
            ("playfield.width", playfield.width),
            ("playfield.height", playfield.height),
            ("rewards.survival_reward", rewards.survival_reward),
            ("rewards.clear_bonus", rewards.clear_bonus),
            ("rewards.collision_penalty", rewards.collision_penalty),
            ("jump_threshold", self.jump_threshold),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if obstacles.gap_center_min >= obstacles.gap_center_max_exclusive {
            return Err(ConfigError::GapRangeInverted {
                min: obstacles.gap_center_min,
                max_exclusive: obstacles.gap_center_max_exclusive,
            });
        }
        if obstacles.gap_size <= 0 {
            return Err(ConfigError::GapSizeNotPositive {
                gap_size: obstacles.gap_size,
            });
        }
        if !(obstacles.scroll_velocity.is_finite() && obstacles.scroll_velocity > 0.0) {
            return Err(ConfigError::ScrollVelocityNotPositive {
                velocity: obstacles.scroll_velocity,
            });
        }

        if !(physics.min_tilt_deg.is_finite()
            && physics.max_tilt_deg.is_finite()
            && physics.min_tilt_deg <= physics.max_tilt_deg)
        {
            return Err(ConfigError::TiltBoundsInverted {
                min: physics.min_tilt_deg,
                max: physics.max_tilt_deg,
            });
        }

        if !(playfield.ceiling_y.is_finite()
            && playfield.ground_y.is_finite()
            && playfield.ground_y > playfield.ceiling_y)
        {
            return Err(ConfigError::GroundAboveCeiling {
                ceiling_y: playfield.ceiling_y,
                ground_y: playfield.ground_y,
            });
        }

        // Gap edges of the extreme draws, in i64 so wide ranges cannot wrap.
        let half_gap = i64::from(obstacles.gap_size / 2);
        let highest_top = i64::from(obstacles.gap_center_min) - half_gap;
        let lowest_bottom = i64::from(obstacles.gap_center_max_exclusive) - 1 - half_gap
            + i64::from(obstacles.gap_size);
        let barrier = i64::from(BARRIER_HEIGHT);
        let edges_ok = highest_top - barrier >= i64::from(i32::MIN)
            && lowest_bottom + barrier <= i64::from(i32::MAX)
            && highest_top as f64 >= playfield.ceiling_y
            && lowest_bottom as f64 <= playfield.ground_y;
        if !edges_ok {
            return Err(ConfigError::GapOutsidePlayfield {
                min: obstacles.gap_center_min,
                max_exclusive: obstacles.gap_center_max_exclusive,
                gap_size: obstacles.gap_size,
            });
        }

        let start_ok = playfield.agent_start_x.is_finite()
            && playfield.agent_start_y.is_finite()
            && playfield.agent_start_x >= 0.0
            && playfield.agent_start_x < playfield.width
            && playfield.agent_start_y >= playfield.ceiling_y
            && playfield.agent_start_y + f64::from(AGENT_HEIGHT) < playfield.ground_y;
        if !start_ok {
            return Err(ConfigError::AgentStartOutOfBounds {
                x: playfield.agent_start_x,
                y: playfield.agent_start_y,
            });
        }

        if self.spawn_x() < playfield.agent_start_x {
            return Err(ConfigError::SpawnBehindAgent {
                spawn_x: self.spawn_x(),
                agent_start_x: playfield.agent_start_x,
            });
        }

        if self.max_ticks == Some(0) {
            return Err(ConfigError::ZeroTickLimit);
        }

        Ok(())
    }
}
