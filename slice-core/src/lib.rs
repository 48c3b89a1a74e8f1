pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod fruit;
pub mod gesture;
pub mod physics;
pub mod rng;
pub mod score;
pub mod session;
pub mod snapshot;
pub mod spawn;
pub mod tracker;

pub use config::{Difficulty, GameConfig};
pub use error::{ConfigError, InputAnomaly, InvariantViolation, RuleCode, SessionError};
pub use session::{simulate, FrameInput, Session};
pub use snapshot::{FrameEvent, FrameSnapshot, GamePhase};
