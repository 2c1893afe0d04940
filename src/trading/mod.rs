pub mod controller;
pub mod events;
pub mod executor;
pub mod strategy;

pub use controller::{LoopController, LoopSettings, LoopState};
pub use events::{EventSink, LoopEvent, TracingSink};
pub use executor::{Executor, OrderGateway};
pub use strategy::{QuotePlan, SymmetricQuoter};
