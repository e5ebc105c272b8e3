pub mod state_machine;

pub use state_machine::{OmsEvent, OmsOrder, OrderState, TransitionError};
