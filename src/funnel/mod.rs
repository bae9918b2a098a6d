//! The conversational funnel: static script, session record, state machine.

pub mod machine;
pub mod script;
pub mod session;

pub use machine::{FunnelMachine, FunnelResult, Transition, UserInput};
pub use script::{InputKind, StepId};
pub use session::SessionData;
