use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wizard steps in the order a customer walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Service,
    DateTime,
    Staff,
    AddOns,
    SpecialRequests,
    CustomerInfo,
    Payment,
}

impl StepId {
    pub const ALL: [StepId; 7] = [
        StepId::Service,
        StepId::DateTime,
        StepId::Staff,
        StepId::AddOns,
        StepId::SpecialRequests,
        StepId::CustomerInfo,
        StepId::Payment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Service => "service",
            StepId::DateTime => "date_time",
            StepId::Staff => "staff",
            StepId::AddOns => "add_ons",
            StepId::SpecialRequests => "special_requests",
            StepId::CustomerInfo => "customer_info",
            StepId::Payment => "payment",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    fn title(self) -> &'static str {
        match self {
            StepId::Service => "Choose a service",
            StepId::DateTime => "Pick a date & time",
            StepId::Staff => "Choose your specialist",
            StepId::AddOns => "Add extras",
            StepId::SpecialRequests => "Special requests",
            StepId::CustomerInfo => "Your details",
            StepId::Payment => "Payment",
        }
    }

    fn description(self) -> &'static str {
        match self {
            StepId::Service => "Select the service you'd like to book.",
            StepId::DateTime => "Find a time that works for you.",
            StepId::Staff => "Pick a team member or let us assign anyone available.",
            StepId::AddOns => "Enhance your appointment with optional extras.",
            StepId::SpecialRequests => "Tell us anything we should know beforehand.",
            StepId::CustomerInfo => "How we can reach you about this booking.",
            StepId::Payment => "Choose how you'd like to pay.",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == value)
            .ok_or_else(|| format!("unknown booking step '{value}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingStep {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// Fresh catalog with the first step current and nothing completed.
pub fn step_catalog() -> Vec<BookingStep> {
    StepId::ALL
        .into_iter()
        .enumerate()
        .map(|(index, id)| BookingStep {
            id,
            title: id.title(),
            description: id.description(),
            completed: false,
            current: index == 0,
        })
        .collect()
}
