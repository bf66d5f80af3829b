// Library surface: the game core, shared by the binary and the integration tests.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod feedback;
pub mod game;
pub mod history;
pub mod lyrics;
pub mod playback;
pub mod practice;
pub mod profile;
pub mod runtime;
pub mod scoring;
pub mod session;

pub use error::{Error, Result};
pub use game::{Game, RunResult};
pub use session::{Generation, Mode, Session};
