use crate::config::ObstacleConfig;
use crate::constants::BARRIER_WIDTH;
use crate::obstacle::Obstacle;
use crate::rng::SeededRng;

/// Active obstacles in creation order. New obstacles append at the tail;
/// offscreen ones are retired from anywhere in the sequence.
#[derive(Clone, Debug)]
pub struct ObstacleStream {
    obstacles: Vec<Obstacle>,
    config: ObstacleConfig,
    spawn_x: f64,
    next_serial: u64,
    rng: SeededRng,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamTick {
    pub cleared: u32,
    pub spawned: u32,
    pub retired: u32,
}

impl ObstacleStream {
    /// Starts with one obstacle at the configured initial offset.
    pub fn new(config: ObstacleConfig, spawn_x: f64, seed: u32) -> Self {
        let mut stream = Self::empty(config, spawn_x, seed);
        stream.push_random(config.initial_x);
        stream
    }

    /// Like `new`, with the first gap centre fixed instead of drawn.
    pub fn with_first_gap(
        config: ObstacleConfig,
        spawn_x: f64,
        seed: u32,
        gap_center: i32,
    ) -> Self {
        let mut stream = Self::empty(config, spawn_x, seed);
        let serial = stream.take_serial();
        stream.obstacles.push(Obstacle::new(
            config.initial_x,
            gap_center,
            config.gap_size,
            serial,
        ));
        stream
    }

    fn empty(config: ObstacleConfig, spawn_x: f64, seed: u32) -> Self {
        Self {
            obstacles: Vec::with_capacity(4),
            config,
            spawn_x,
            next_serial: 0,
            rng: SeededRng::new(seed),
        }
    }

    fn take_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    fn push_random(&mut self, x: f64) {
        let serial = self.take_serial();
        let obstacle = Obstacle::create(x, &self.config, &mut self.rng, serial);
        self.obstacles.push(obstacle);
    }

    #[inline]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Index of the obstacle whose gap the agents should be steering for.
    pub fn next_relevant_index(&self, agent_x: f64) -> usize {
        match self.obstacles.as_slice() {
            [first, _, ..] if agent_x > first.x + f64::from(BARRIER_WIDTH) => 1,
            _ => 0,
        }
    }

    pub fn tick(&mut self, agent_reference_x: f64) -> StreamTick {
        let mut result = StreamTick::default();

        for obstacle in &mut self.obstacles {
            obstacle.advance(self.config.scroll_velocity);
            if !obstacle.passed && obstacle.x < agent_reference_x {
                obstacle.passed = true;
                result.cleared += 1;
            }
        }

        let before = self.obstacles.len();
        self.obstacles.retain(|obstacle| !obstacle.is_offscreen(0.0));
        result.retired = (before - self.obstacles.len()) as u32;

        for _ in 0..result.cleared {
            self.push_random(self.spawn_x);
            result.spawned += 1;
        }

        result
    }

    /// Creation order must match screen order.
    pub fn is_ordered(&self) -> bool {
        self.obstacles
            .windows(2)
            .all(|pair| pair[0].serial() < pair[1].serial() && pair[0].x <= pair[1].x)
    }
}
