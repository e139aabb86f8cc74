//! Multi-step booking wizard: step catalog, draft accumulation and the
//! state machine that moves a customer from service selection to payment.

mod draft;
mod flow;
mod steps;
mod validate;

pub use draft::{BookingDraft, DraftUpdate};
pub use flow::{BookingFlow, FlowSnapshot};
pub use steps::{BookingStep, StepId};
