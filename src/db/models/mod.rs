pub mod patch;
pub mod session;

pub use patch::SessionPatch;
pub use session::{BaseTheme, CustomPalette, Theme, TimerMode, TimerSession};
