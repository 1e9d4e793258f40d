pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod machine;
pub mod replay;
pub mod runner;
pub mod signal;
pub mod sink;

pub use config::{AckMode, EngineConfig, EntryBase};
pub use error::{ConfigError, FeedError, ReplayError, SignalError, SinkError};
pub use machine::{RiskContext, SignalStateMachine, TickInput};
pub use signal::Signal;
