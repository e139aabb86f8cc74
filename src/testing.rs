//! Fakes and fixtures shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::{
    api::{AuthApi, BookingApi},
    config::AppConfig,
    db::{run_migrations, seed_providers, SqliteProviderSource},
    error::{AppError, AppResult},
    models::{
        AuthUser, Booking, CreateBookingRequest, CustomerInfo, Page, Pagination, PromoQuote,
        ServiceOption, TimeSlot, STATUS_PENDING,
    },
    state::AppState,
};

pub const TEST_TOKEN: &str = "token-ada";

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    seed_providers(&pool).await.expect("seed");
    pool
}

pub fn service() -> ServiceOption {
    ServiceOption {
        id: "svc-cut".to_string(),
        name: "Signature Cut".to_string(),
        description: "Precision cut and styling.".to_string(),
        price: Decimal::new(45, 0),
        duration_minutes: 45,
    }
}

pub fn slot_on(date: NaiveDate) -> TimeSlot {
    let start = NaiveDateTime::new(date, chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    TimeSlot {
        id: "slot-10".to_string(),
        start,
        end: start + chrono::Duration::minutes(45),
        available: true,
    }
}

pub fn booking_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-010-2030".to_string(),
        ..CustomerInfo::default()
    }
}

/// In-memory booking backend. `fail_bookings` turns every create into a
/// network error.
#[derive(Default)]
pub struct FakeBackend {
    pub fail_bookings: bool,
    pub create_calls: AtomicUsize,
    pub bookings: Mutex<Vec<Booking>>,
}

impl FakeBackend {
    pub fn failing() -> Self {
        Self {
            fail_bookings: true,
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookingApi for FakeBackend {
    async fn create_booking(&self, request: &CreateBookingRequest) -> AppResult<Booking> {
        let count = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_bookings {
            return Err(AppError::network("backend unavailable", "network_error"));
        }
        let booking = Booking {
            id: format!("bk-{count}"),
            service_id: request.service_id.clone(),
            time_slot_id: request.time_slot_id.clone(),
            status: STATUS_PENDING.to_string(),
            notes: request.notes.clone(),
            service: Some(service()),
            time_slot: Some(slot_on(booking_date())),
            provider: None,
        };
        self.bookings
            .lock()
            .expect("bookings lock")
            .push(booking.clone());
        Ok(booking)
    }

    async fn get_services(&self, page: u32, per_page: u32) -> AppResult<Page<ServiceOption>> {
        Ok(Page {
            items: vec![service()],
            pagination: Pagination {
                page,
                per_page,
                total: 1,
            },
        })
    }

    async fn get_service_time_slots(&self, service_id: &str) -> AppResult<Vec<TimeSlot>> {
        if service_id != "svc-cut" {
            return Err(AppError::NotFound(format!("service {service_id}")));
        }
        Ok(vec![slot_on(booking_date())])
    }

    async fn get_booking(&self, id: &str) -> AppResult<Booking> {
        self.bookings
            .lock()
            .expect("bookings lock")
            .iter()
            .find(|booking| booking.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
    }

    async fn quote_promo(&self, code: &str, _subtotal: Decimal) -> AppResult<PromoQuote> {
        match code {
            "WELCOME10" => Ok(PromoQuote {
                code: code.to_string(),
                discount: Decimal::new(10, 0),
            }),
            _ => Err(AppError::validation("promo_code", "That promo code is not valid.")),
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn current_user(&self, token: &str) -> AppResult<Option<AuthUser>> {
        Ok((token == TEST_TOKEN).then(|| AuthUser {
            id: "u-ada".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
        }))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        booking_api_url: "http://backend.invalid".to_string(),
        api_timeout: std::time::Duration::from_secs(1),
        session_idle_ttl: crate::config::DEFAULT_SESSION_IDLE_TTL,
        seed_providers: true,
        test_auth_user: None,
    }
}

pub async fn test_state(backend: Arc<FakeBackend>) -> AppState {
    let pool = memory_pool().await;
    AppState::new(
        test_config(),
        Arc::new(SqliteProviderSource::new(pool)),
        backend.clone(),
        backend,
    )
}
