use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::constants::AGENT_HEIGHT;

/// Physics state of one controlled entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    /// Ticks since the last jump (or since spawn).
    pub ticks_since_jump: u32,
    pub tilt_deg: f64,
    /// Height at the last jump; the nose stays up until the agent sinks below it.
    pub jump_height: f64,
}

impl Agent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            ticks_since_jump: 0,
            tilt_deg: 0.0,
            jump_height: y,
        }
    }

    pub fn jump(&mut self, physics: &PhysicsConfig) {
        self.velocity = physics.jump_velocity;
        self.ticks_since_jump = 0;
        self.jump_height = self.y;
    }

    pub fn advance(&mut self, physics: &PhysicsConfig) {
        self.ticks_since_jump += 1;
        let t = f64::from(self.ticks_since_jump);

        let mut displacement = self.velocity * t + physics.gravity * t * t;
        if displacement >= physics.terminal_displacement {
            displacement = physics.terminal_displacement;
        }
        if displacement < 0.0 {
            displacement -= physics.ascent_bias;
        }

        self.y += displacement;

        if displacement < 0.0 || self.y < self.jump_height + physics.tilt_up_margin {
            self.tilt_deg = physics.max_tilt_deg;
        } else if self.tilt_deg > physics.min_tilt_deg {
            self.tilt_deg = (self.tilt_deg - physics.tilt_rate_deg).max(physics.min_tilt_deg);
        }
    }

    /// True once the sprite touches the death plane or rises above the ceiling.
    pub fn is_out_of_bounds(&self, lower_y: f64, upper_y: f64) -> bool {
        self.y + f64::from(AGENT_HEIGHT) >= lower_y || self.y < upper_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AGENT_START_X, AGENT_START_Y, CEILING_Y, GROUND_Y};

    #[test]
    fn jump_then_advance_moves_up_relative_to_falling() {
        let physics = PhysicsConfig::default();
        let mut base = Agent::new(AGENT_START_X, AGENT_START_Y);
        for _ in 0..5 {
            base.advance(&physics);
        }

        let mut falling = base;
        falling.advance(&physics);

        let mut jumping = base;
        jumping.jump(&physics);
        jumping.advance(&physics);

        assert!(jumping.y < falling.y);
        assert!(jumping.y < base.y);
        assert_eq!(jumping.tilt_deg, physics.max_tilt_deg);
    }

    #[test]
    fn falling_agent_hits_ground_within_bound() {
        let physics = PhysicsConfig::default();
        let mut agent = Agent::new(AGENT_START_X, AGENT_START_Y);
        let mut previous_y = agent.y;
        let mut tick = 0;

        while !agent.is_out_of_bounds(GROUND_Y, CEILING_Y) {
            agent.advance(&physics);
            tick += 1;
            assert!(agent.y > previous_y, "never-jumping agent must keep falling");
            previous_y = agent.y;
            assert!(tick <= 200);
        }

        assert_eq!(tick, 23);
    }

    #[test]
    fn downward_displacement_is_clamped() {
        let physics = PhysicsConfig::default();
        let mut agent = Agent::new(0.0, 0.0);
        for _ in 0..50 {
            let before = agent.y;
            agent.advance(&physics);
            assert!(agent.y - before <= physics.terminal_displacement);
        }
    }

    #[test]
    fn tilt_settles_at_lower_bound() {
        let physics = PhysicsConfig::default();
        let mut agent = Agent::new(AGENT_START_X, AGENT_START_Y);
        agent.jump(&physics);
        for _ in 0..40 {
            agent.advance(&physics);
            assert!(agent.tilt_deg <= physics.max_tilt_deg);
            assert!(agent.tilt_deg >= physics.min_tilt_deg);
        }
        assert_eq!(agent.tilt_deg, physics.min_tilt_deg);
    }

    #[test]
    fn ceiling_and_ground_bounds() {
        let mut agent = Agent::new(AGENT_START_X, -0.5);
        assert!(agent.is_out_of_bounds(GROUND_Y, CEILING_Y));
        agent.y = GROUND_Y - f64::from(AGENT_HEIGHT);
        assert!(agent.is_out_of_bounds(GROUND_Y, CEILING_Y));
        agent.y -= 0.5;
        assert!(!agent.is_out_of_bounds(GROUND_Y, CEILING_Y));
    }
}
