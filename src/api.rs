use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{
        AuthUser, Booking, CreateBookingRequest, Page, PromoQuote, ServiceOption, ServiceProvider,
        TimeSlot,
    },
    search::FavoriteSet,
};

/// Booking backend as seen from the wizard.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn create_booking(&self, request: &CreateBookingRequest) -> AppResult<Booking>;

    async fn get_services(&self, page: u32, per_page: u32) -> AppResult<Page<ServiceOption>>;

    async fn get_service_time_slots(&self, service_id: &str) -> AppResult<Vec<TimeSlot>>;

    async fn get_booking(&self, id: &str) -> AppResult<Booking>;

    async fn quote_promo(&self, code: &str, subtotal: Decimal) -> AppResult<PromoQuote>;
}

/// Resolves a bearer token into the signed-in user. Token storage and
/// refresh stay with the caller.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn current_user(&self, token: &str) -> AppResult<Option<AuthUser>>;
}

/// Where search results and favorites come from.
#[async_trait]
pub trait ProviderSource: Send + Sync {
    async fn list_providers(&self) -> AppResult<Vec<ServiceProvider>>;

    async fn get_provider(&self, id: &str) -> AppResult<ServiceProvider>;

    async fn favorites(&self, user_id: &str) -> AppResult<FavoriteSet>;

    async fn add_favorite(&self, user_id: &str, provider_id: &str) -> AppResult<()>;

    async fn remove_favorite(&self, user_id: &str, provider_id: &str) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct PromoRequest<'a> {
    code: &'a str,
    subtotal: Decimal,
}

#[derive(Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
}

impl HttpBookingApi {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::network(err.to_string(), "client_error"))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> AppResult<T> {
        let response = request.send().await.map_err(|err| {
            log::warn!("Booking API request for {what} failed: {err}");
            AppError::network(format!("Could not reach the booking service: {err}"), "network_error")
        })?;
        decode(response, what).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| AppError::network(format!("Unexpected response for {what}: {err}"), "decode_error"));
    }

    let body = response.json::<ApiErrorBody>().await.ok();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(
            body.map(|body| body.message).unwrap_or_else(|| what.to_string()),
        ));
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthorized);
    }

    let (message, code) = match body {
        Some(body) => (
            body.message,
            body.code.unwrap_or_else(|| format!("http_{}", status.as_u16())),
        ),
        None => (
            format!("Booking service returned {status} for {what}"),
            format!("http_{}", status.as_u16()),
        ),
    };
    log::warn!("Booking API error for {what}: {code} {message}");
    Err(AppError::Network { message, code })
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn create_booking(&self, request: &CreateBookingRequest) -> AppResult<Booking> {
        let builder = self.client.post(self.url("/bookings")).json(request);
        self.send(builder, "booking creation").await
    }

    async fn get_services(&self, page: u32, per_page: u32) -> AppResult<Page<ServiceOption>> {
        let builder = self
            .client
            .get(self.url("/services"))
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(builder, "service list").await
    }

    async fn get_service_time_slots(&self, service_id: &str) -> AppResult<Vec<TimeSlot>> {
        let builder = self
            .client
            .get(self.url(&format!("/services/{service_id}/time-slots")));
        self.send(builder, "time slots").await
    }

    async fn get_booking(&self, id: &str) -> AppResult<Booking> {
        let builder = self.client.get(self.url(&format!("/bookings/{id}")));
        self.send(builder, "booking").await
    }

    async fn quote_promo(&self, code: &str, subtotal: Decimal) -> AppResult<PromoQuote> {
        let builder = self
            .client
            .post(self.url("/promotions/quote"))
            .json(&PromoRequest { code, subtotal });
        self.send(builder, "promo code").await
    }
}

#[async_trait]
impl AuthApi for HttpBookingApi {
    async fn current_user(&self, token: &str) -> AppResult<Option<AuthUser>> {
        let builder = self.client.get(self.url("/auth/me")).bearer_auth(token);
        match self.send::<AuthUser>(builder, "current user").await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Unauthorized) | Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
