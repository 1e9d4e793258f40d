pub mod cause;
pub mod state;
pub mod transition;

pub use cause::TransitionCause;
pub use state::Phase;
pub use transition::{TransitionError, transition};
