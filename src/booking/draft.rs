use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    AddOn, CustomerInfo, PaymentMethod, PromoQuote, ServiceOption, StaffChoice, TimeSlot,
};

use super::validate::{too_long_error, SPECIAL_REQUESTS_LIMIT};

/// Booking accumulated across wizard steps. Totals are kept in sync by
/// [`BookingDraft::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingDraft {
    pub service: Option<ServiceOption>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub staff: Option<StaffChoice>,
    pub add_ons: Vec<AddOn>,
    pub special_requests: String,
    pub customer_info: Option<CustomerInfo>,
    pub payment_method: Option<PaymentMethod>,
    pub promo: Option<PromoQuote>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// A change to one step's slice of the draft.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "snake_case")]
pub enum DraftUpdate {
    Service(ServiceOption),
    Schedule {
        date: NaiveDate,
        #[serde(default)]
        time_slot: Option<TimeSlot>,
    },
    Staff(StaffChoice),
    AddOns(Vec<AddOn>),
    ToggleAddOn(AddOn),
    SpecialRequests(String),
    AppendRequest(String),
    CustomerInfo(CustomerInfo),
    Payment { method: PaymentMethod },
    Promo(Option<PromoQuote>),
}

impl BookingDraft {
    /// Applies `update`, touching only the fields it names. A rejected update
    /// leaves the draft exactly as it was.
    pub fn apply(&mut self, update: DraftUpdate) -> AppResult<()> {
        match update {
            DraftUpdate::Service(service) => self.service = Some(service),
            DraftUpdate::Schedule { date, time_slot } => {
                self.date = Some(date);
                self.time_slot = time_slot;
            }
            DraftUpdate::Staff(choice) => self.staff = Some(choice),
            DraftUpdate::AddOns(add_ons) => self.add_ons = dedupe_add_ons(add_ons),
            DraftUpdate::ToggleAddOn(add_on) => {
                match self.add_ons.iter().position(|existing| existing.id == add_on.id) {
                    Some(index) => {
                        self.add_ons.remove(index);
                    }
                    None => self.add_ons.push(add_on),
                }
            }
            DraftUpdate::SpecialRequests(text) => {
                if text.chars().count() > SPECIAL_REQUESTS_LIMIT {
                    return Err(AppError::Validation(vec![too_long_error()]));
                }
                self.special_requests = text;
            }
            DraftUpdate::AppendRequest(phrase) => {
                let appended = append_phrase(&self.special_requests, &phrase);
                if appended.chars().count() > SPECIAL_REQUESTS_LIMIT {
                    return Err(AppError::Validation(vec![too_long_error()]));
                }
                self.special_requests = appended;
            }
            DraftUpdate::CustomerInfo(info) => self.customer_info = Some(info),
            DraftUpdate::Payment { method } => self.payment_method = Some(method),
            DraftUpdate::Promo(quote) => self.promo = quote,
        }
        self.recompute_totals();
        Ok(())
    }

    pub fn recompute_totals(&mut self) {
        let service_price = self
            .service
            .as_ref()
            .map(|service| service.price)
            .unwrap_or_default();
        let add_on_total: Decimal = self.add_ons.iter().map(|add_on| add_on.price).sum();
        self.subtotal = service_price + add_on_total;

        let requested = self
            .promo
            .as_ref()
            .map(|quote| quote.discount.max(Decimal::ZERO))
            .unwrap_or_default();
        self.discount = requested.min(self.subtotal);
        self.total = self.subtotal - self.discount;
    }

    pub fn notes(&self) -> Option<String> {
        let trimmed = self.special_requests.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn dedupe_add_ons(add_ons: Vec<AddOn>) -> Vec<AddOn> {
    let mut unique: Vec<AddOn> = Vec::with_capacity(add_ons.len());
    for add_on in add_ons {
        if !unique.iter().any(|existing| existing.id == add_on.id) {
            unique.push(add_on);
        }
    }
    unique
}

fn append_phrase(current: &str, phrase: &str) -> String {
    let phrase = phrase.trim();
    if current.trim().is_empty() {
        phrase.to_string()
    } else {
        format!("{}, {}", current.trim_end(), phrase)
    }
}
