//! Interview session orchestration
//!
//! Contains the session state machine and its scoping:
//! - `InterviewSession` sequences the protocol calls and owns the state
//! - `InterviewState` is the single view handed to the presentation layer
//! - `SessionSlot` cancels and fences off replaced sessions

mod scope;
mod session;
mod state;


pub use scope::SessionSlot;
pub use session::InterviewSession;
pub use state::{FailedPhase, InterviewState, InterviewStep, SessionFailure};
