pub mod executor;
pub mod orchestrator;
pub mod schedule;
pub mod shutdown;

pub use executor::{TradeExecutor, TradeOutcome};
pub use orchestrator::{CycleReport, LoopSummary, TraderError, TraderLoop, TraderState, next_delay};
pub use schedule::{CadenceSchedule, LoopTiming};
pub use shutdown::ShutdownHandle;
