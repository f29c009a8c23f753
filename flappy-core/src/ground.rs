use serde::{Deserialize, Serialize};

use crate::constants::GROUND_WIDTH;

/// Two ground strips leapfrogging each other. Only `y` matters to the
/// simulation; the offsets are exposed for renderers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollingGround {
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
}

impl ScrollingGround {
    pub fn new(y: f64) -> Self {
        Self {
            y,
            x1: 0.0,
            x2: GROUND_WIDTH,
        }
    }

    pub fn advance(&mut self, scroll_velocity: f64) {
        self.x1 -= scroll_velocity;
        self.x2 -= scroll_velocity;

        if self.x1 + GROUND_WIDTH < 0.0 {
            self.x1 = self.x2 + GROUND_WIDTH;
        }
        if self.x2 + GROUND_WIDTH < 0.0 {
            self.x2 = self.x1 + GROUND_WIDTH;
        }
    }
}
