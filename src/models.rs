use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl TimeSlot {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Staff selection; `Any` is a complete answer, not a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaffChoice {
    Any,
    Member(StaffMember),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub accessibility_needs: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    PayAtVenue,
    Wallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoQuote {
    pub code: String,
    pub discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub time_slot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContact {
    pub name: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    pub time_slot_id: String,
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub service: Option<ServiceOption>,
    #[serde(default)]
    pub time_slot: Option<TimeSlot>,
    #[serde(default)]
    pub provider: Option<ProviderContact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindows {
    pub today: bool,
    pub tomorrow: bool,
    pub this_week: bool,
    pub next_week: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    pub name: String,
    pub business_name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub starting_price: f64,
    pub distance: String,
    pub location: ProviderLocation,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub availability: AvailabilityWindows,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Raw `providers` row; availability flags are stored as integers.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: String,
    pub name: String,
    pub business_name: String,
    pub category: String,
    pub description: String,
    pub rating: f64,
    pub review_count: i64,
    pub starting_price: f64,
    pub distance: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub available_today: i64,
    pub available_tomorrow: i64,
    pub available_this_week: i64,
    pub available_next_week: i64,
}

impl From<ProviderRow> for ServiceProvider {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            business_name: row.business_name,
            category: row.category,
            description: row.description,
            rating: row.rating,
            review_count: u32::try_from(row.review_count).unwrap_or(0),
            starting_price: row.starting_price,
            distance: row.distance,
            location: ProviderLocation {
                address: row.address,
                city: row.city,
                state: row.state,
                zip: row.zip,
            },
            phone: row.phone,
            email: row.email,
            availability: AvailabilityWindows {
                today: row.available_today != 0,
                tomorrow: row.available_tomorrow != 0,
                this_week: row.available_this_week != 0,
                next_week: row.available_next_week != 0,
            },
            is_favorite: false,
        }
    }
}
