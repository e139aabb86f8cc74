use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FieldError;
use crate::models::{CustomerInfo, TimeSlot};

use super::draft::BookingDraft;
use super::steps::StepId;

pub const SPECIAL_REQUESTS_LIMIT: usize = 500;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s().-]+$").expect("phone pattern is valid"));

/// Field errors blocking `step`; empty when the step may be left.
pub fn step_errors(step: StepId, draft: &BookingDraft) -> Vec<FieldError> {
    match step {
        StepId::Service => {
            if draft.service.is_none() {
                vec![FieldError::new("service", "Please select a service.")]
            } else {
                Vec::new()
            }
        }
        StepId::DateTime => schedule_errors(draft),
        StepId::Staff | StepId::AddOns => Vec::new(),
        StepId::SpecialRequests => {
            if draft.special_requests.chars().count() > SPECIAL_REQUESTS_LIMIT {
                vec![too_long_error()]
            } else {
                Vec::new()
            }
        }
        StepId::CustomerInfo => match &draft.customer_info {
            Some(info) => customer_errors(info),
            None => vec![
                FieldError::new("name", "Full name is required."),
                FieldError::new("email", "Email is required."),
                FieldError::new("phone", "Phone number is required."),
            ],
        },
        StepId::Payment => {
            if draft.payment_method.is_none() {
                vec![FieldError::new("payment_method", "Please choose a payment method.")]
            } else {
                Vec::new()
            }
        }
    }
}

fn schedule_errors(draft: &BookingDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let Some(date) = draft.date else {
        errors.push(FieldError::new("date", "Please pick a date."));
        if draft.time_slot.is_none() {
            errors.push(FieldError::new("time_slot", "Please pick a time."));
        }
        return errors;
    };
    match &draft.time_slot {
        None => errors.push(FieldError::new("time_slot", "Please pick a time.")),
        Some(slot) => {
            if slot.date() != date {
                errors.push(FieldError::new(
                    "time_slot",
                    "The selected time is not on the selected date.",
                ));
            } else if !slot_is_ordered(slot) {
                errors.push(FieldError::new("time_slot", "The selected time range is invalid."));
            }
        }
    }
    errors
}

fn slot_is_ordered(slot: &TimeSlot) -> bool {
    slot.end > slot.start
}

pub fn customer_errors(info: &CustomerInfo) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if info.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Full name is required."));
    }

    let email = info.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email address."));
    }

    let phone = info.phone.trim();
    if phone.is_empty() {
        errors.push(FieldError::new("phone", "Phone number is required."));
    } else if !is_valid_phone(phone) {
        errors.push(FieldError::new("phone", "Please enter a valid phone number."));
    }
    errors
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Digits, spaces and `+().-` only, with 7 to 15 digits.
pub fn is_valid_phone(value: &str) -> bool {
    if !PHONE_RE.is_match(value) {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

pub fn too_long_error() -> FieldError {
    FieldError::new(
        "special_requests",
        format!("Special requests are limited to {SPECIAL_REQUESTS_LIMIT} characters."),
    )
}
