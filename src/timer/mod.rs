pub mod clock;
pub mod controller;
pub mod format;
pub mod machine;
pub mod presets;
pub mod render;
pub mod state;

pub use clock::{sample, ClockSample};
pub use controller::TimerController;
pub use format::TimeFormatter;
pub use machine::{Appearance, TimerCommand};
pub use render::RenderedFrame;
pub use state::SessionPhase;

/// Current wall-clock instant in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
