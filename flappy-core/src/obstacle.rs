use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::ObstacleConfig;
use crate::constants::{AGENT_HEIGHT, AGENT_WIDTH, BARRIER_HEIGHT, BARRIER_WIDTH};
use crate::rng::SeededRng;
use crate::silhouette::{Barriers, Silhouette, SilhouetteSet};

/// A top/bottom barrier pair with one vertical gap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f64,
    gap_center: i32,
    gap_top: i32,
    gap_bottom: i32,
    pub passed: bool,
    serial: u64,
}

impl Obstacle {
    pub fn new(x: f64, gap_center: i32, gap_size: i32, serial: u64) -> Self {
        let half_gap = gap_size / 2;
        Self {
            x,
            gap_center,
            gap_top: gap_center.saturating_sub(half_gap),
            gap_bottom: gap_center.saturating_sub(half_gap).saturating_add(gap_size),
            passed: false,
            serial,
        }
    }

    /// Draws the gap centre uniformly from the configured range.
    pub fn create(x: f64, config: &ObstacleConfig, rng: &mut SeededRng, serial: u64) -> Self {
        let center = rng.next_range(config.gap_center_min, config.gap_center_max_exclusive);
        Self::new(x, center, config.gap_size, serial)
    }

    #[inline]
    pub fn gap_center(&self) -> i32 {
        self.gap_center
    }

    /// Lower edge of the top barrier.
    #[inline]
    pub fn gap_top(&self) -> i32 {
        self.gap_top
    }

    /// Upper edge of the bottom barrier.
    #[inline]
    pub fn gap_bottom(&self) -> i32 {
        self.gap_bottom
    }

    /// Screen y of the top barrier sprite's upper-left corner.
    #[inline]
    pub fn top_barrier_y(&self) -> i32 {
        self.gap_top.saturating_sub(BARRIER_HEIGHT)
    }

    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    #[inline]
    pub fn right_edge(&self) -> f64 {
        self.x + f64::from(BARRIER_WIDTH)
    }

    pub fn advance(&mut self, scroll_velocity: f64) {
        self.x -= scroll_velocity;
    }

    pub fn is_offscreen(&self, left_edge: f64) -> bool {
        self.right_edge() < left_edge
    }

    pub fn overlaps(&self, agent: &Agent, silhouettes: &mut SilhouetteSet) -> bool {
        let (posed, barriers) = silhouettes.pose(agent.tilt_deg);
        self.overlaps_posed(posed, agent_origin(agent, posed), barriers)
    }

    /// Collision against an already posed agent silhouette placed at `origin`.
    pub fn overlaps_posed(
        &self,
        posed: &Silhouette,
        origin: (i32, i32),
        barriers: &Barriers,
    ) -> bool {
        let x = self.x.round() as i32;
        posed.overlaps(origin, &barriers.top, (x, self.top_barrier_y()))
            || posed.overlaps(origin, &barriers.bottom, (x, self.gap_bottom))
    }
}

/// Top-left of a posed agent silhouette, centred on the unrotated sprite.
pub fn agent_origin(agent: &Agent, posed: &Silhouette) -> (i32, i32) {
    let center_x = agent.x + f64::from(AGENT_WIDTH) / 2.0;
    let center_y = agent.y + f64::from(AGENT_HEIGHT) / 2.0;
    (
        (center_x - f64::from(posed.width()) / 2.0).round() as i32,
        (center_y - f64::from(posed.height()) / 2.0).round() as i32,
    )
}
