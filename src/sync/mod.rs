pub mod poller;
pub mod ticker;

pub use poller::{ControlPoller, PollState, SessionSource};
pub use ticker::DisplayTicker;
