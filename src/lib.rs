pub mod constants;
pub mod geometry;
pub mod ghost;
pub mod highscores;
pub mod level;
pub mod notify;
pub mod player;
pub mod rng;
pub mod score;
pub mod types;
pub mod world;
