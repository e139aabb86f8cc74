use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Booking, CreateBookingRequest};

use super::draft::{BookingDraft, DraftUpdate};
use super::steps::{step_catalog, BookingStep, StepId};
use super::validate::step_errors;

/// One customer's pass through the booking wizard.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    id: Uuid,
    steps: Vec<BookingStep>,
    current: usize,
    draft: BookingDraft,
    submitting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub session_id: Uuid,
    pub current_step: StepId,
    pub steps: Vec<BookingStep>,
    pub draft: BookingDraft,
    pub submitting: bool,
    pub ready_to_submit: bool,
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFlow {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            steps: step_catalog(),
            current: 0,
            draft: BookingDraft::default(),
            submitting: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn steps(&self) -> &[BookingStep] {
        &self.steps
    }

    pub fn current_step(&self) -> StepId {
        self.steps[self.current].id
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn update(&mut self, update: DraftUpdate) -> AppResult<()> {
        if self.submitting {
            return Err(AppError::SubmissionInProgress);
        }
        self.draft.apply(update)
    }

    /// Completes the current step and moves to the next one. On the last step
    /// the step is marked completed and `current` stays put.
    pub fn advance(&mut self) -> AppResult<StepId> {
        if self.submitting {
            return Err(AppError::SubmissionInProgress);
        }
        let errors = step_errors(self.current_step(), &self.draft);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        self.steps[self.current].completed = true;
        if self.current + 1 < self.steps.len() {
            self.set_current(self.current + 1);
        }
        Ok(self.current_step())
    }

    /// Moves back to `step`. Completion flags and draft data are left alone.
    pub fn retreat(&mut self, step: StepId) -> AppResult<StepId> {
        if self.submitting {
            return Err(AppError::SubmissionInProgress);
        }
        let target = step.index();
        if target > self.current {
            return Err(AppError::StepLocked(step.to_string()));
        }
        self.set_current(target);
        Ok(step)
    }

    pub fn ready_to_submit(&self) -> bool {
        self.steps.iter().all(|step| step.completed)
            && self.draft.service.is_some()
            && self.draft.time_slot.is_some()
            && self.draft.customer_info.is_some()
    }

    /// Marks the flow as submitting and returns the request to send. Fails if
    /// a submission is already outstanding, a step is incomplete, or the draft
    /// was edited after completion into something a step would reject.
    pub fn begin_submit(&mut self) -> AppResult<CreateBookingRequest> {
        if self.submitting {
            return Err(AppError::SubmissionInProgress);
        }
        if let Some(step) = self.steps.iter().find(|step| !step.completed) {
            return Err(AppError::NotReady(format!("step {} is not complete", step.id)));
        }
        let errors: Vec<_> = StepId::ALL
            .into_iter()
            .flat_map(|step| step_errors(step, &self.draft))
            .collect();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let (Some(service), Some(slot), Some(_)) = (
            self.draft.service.as_ref(),
            self.draft.time_slot.as_ref(),
            self.draft.customer_info.as_ref(),
        ) else {
            return Err(AppError::NotReady(
                "service, time slot and customer details are required".to_string(),
            ));
        };

        let request = CreateBookingRequest {
            service_id: service.id.clone(),
            time_slot_id: slot.id.clone(),
            notes: self.draft.notes(),
        };
        self.submitting = true;
        Ok(request)
    }

    /// Clears the in-flight flag. The draft is untouched either way; the
    /// caller drops the flow when `result` is `Ok`.
    pub fn finish_submit(&mut self, result: AppResult<Booking>) -> AppResult<Booking> {
        self.submitting = false;
        result
    }

    /// Clears the in-flight flag when the submission never got an answer.
    pub fn cancel_submit(&mut self) {
        self.submitting = false;
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            session_id: self.id,
            current_step: self.current_step(),
            steps: self.steps.clone(),
            draft: self.draft.clone(),
            submitting: self.submitting,
            ready_to_submit: self.ready_to_submit(),
        }
    }

    fn set_current(&mut self, index: usize) {
        for (position, step) in self.steps.iter_mut().enumerate() {
            step.current = position == index;
        }
        self.current = index;
    }
}
