//! Scene contents other than the robot.

pub mod obstacle;

pub use obstacle::{Obstacle, ObstacleField, DEFAULT_OBSTACLE_SIZE};
