//! Fixed sprite extents and the default tuning of the simulation.
//!
//! Sprite sizes stand in for the art assets (already scaled 2x) and are not
//! configurable. Everything below the sprite block only seeds `SimConfig`.

// Sprites
pub const AGENT_WIDTH: i32 = 68;
pub const AGENT_HEIGHT: i32 = 48;
pub const BARRIER_WIDTH: i32 = 104;
pub const BARRIER_HEIGHT: i32 = 640;
pub const BARRIER_CAP_ROWS: i32 = 48;
pub const BARRIER_BODY_INSET: i32 = 4;
pub const GROUND_WIDTH: f64 = 672.0;

// Playfield
pub const PLAYFIELD_WIDTH: f64 = 500.0;
pub const PLAYFIELD_HEIGHT: f64 = 800.0;
pub const CEILING_Y: f64 = 0.0;
pub const GROUND_Y: f64 = 730.0;
pub const AGENT_START_X: f64 = 230.0;
pub const AGENT_START_Y: f64 = 350.0;

// Agent physics (per tick)
pub const JUMP_VELOCITY: f64 = -9.5;
pub const GRAVITY: f64 = 1.5;
pub const TERMINAL_DISPLACEMENT: f64 = 16.0;
pub const ASCENT_BIAS: f64 = 2.0;
pub const MAX_TILT_DEG: f64 = 25.0;
pub const MIN_TILT_DEG: f64 = -90.0;
pub const TILT_RATE_DEG: f64 = 20.0;
pub const TILT_UP_MARGIN: f64 = 50.0;

// Obstacles
pub const GAP_CENTER_MIN: i32 = 150;
pub const GAP_CENTER_MAX_EXCLUSIVE: i32 = 550;
pub const GAP_SIZE: i32 = 200;
pub const SCROLL_VELOCITY: f64 = 5.0;
pub const SPAWN_OFFSET: f64 = 100.0;
pub const INITIAL_OBSTACLE_X: f64 = 600.0;

// Fitness shaping
pub const JUMP_THRESHOLD: f64 = 0.5;
pub const SURVIVAL_REWARD: f64 = 0.1;
pub const CLEAR_BONUS: f64 = 5.0;
pub const COLLISION_PENALTY: f64 = 1.0;
