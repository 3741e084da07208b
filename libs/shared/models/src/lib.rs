pub mod encounter;
pub mod error;

pub use encounter::{Encounter, EncounterPatch, Party, Presence};
pub use error::AppError;
