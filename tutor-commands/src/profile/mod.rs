pub mod avatar;
pub mod controller;
pub mod leaderboard;
pub mod picture;
pub mod ranks;
pub mod show;
pub mod upload;

pub use controller::{LeaderboardState, ProfileController, ProfilePhase};
