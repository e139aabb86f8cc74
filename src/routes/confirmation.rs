use actix_web::{http::StatusCode, web, HttpResponse, Result};
use askama::Template;

use crate::{
    error::AppError,
    models::{Booking, STATUS_CONFIRMED},
    state::AppState,
    templates::{render, render_with_status},
};

#[derive(Template, Default)]
#[template(path = "confirmation.html")]
struct ConfirmationTemplate {
    found: bool,
    confirmed: bool,
    booking_id: String,
    status: String,
    service_name: String,
    scheduled_for: String,
    notes: String,
    has_provider: bool,
    provider_name: String,
    provider_address: String,
    provider_phone: String,
    provider_email: String,
}

impl ConfirmationTemplate {
    fn from_booking(booking: Booking) -> Self {
        let service_name = booking
            .service
            .as_ref()
            .map(|service| service.name.clone())
            .unwrap_or_else(|| booking.service_id.clone());
        let scheduled_for = booking
            .time_slot
            .as_ref()
            .map(|slot| {
                format!(
                    "{} – {}",
                    slot.start.format("%A, %B %-d %Y at %-I:%M %p"),
                    slot.end.format("%-I:%M %p")
                )
            })
            .unwrap_or_else(|| "To be confirmed".to_string());

        let mut template = Self {
            found: true,
            confirmed: booking.status == STATUS_CONFIRMED,
            booking_id: booking.id,
            status: booking.status,
            service_name,
            scheduled_for,
            notes: booking.notes.unwrap_or_default(),
            ..Self::default()
        };
        if let Some(provider) = booking.provider {
            template.has_provider = true;
            template.provider_name = if provider.business_name.is_empty() {
                provider.name
            } else {
                provider.business_name
            };
            template.provider_address = provider.address.unwrap_or_default();
            template.provider_phone = provider.phone.unwrap_or_default();
            template.provider_email = provider.email.unwrap_or_default();
        }
        template
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/bookings/{id}/confirmation").route(web::get().to(confirmation_page)),
    );
}

async fn confirmation_page(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    match state.booking_api.get_booking(&booking_id).await {
        Ok(booking) => Ok(render(ConfirmationTemplate::from_booking(booking))),
        Err(AppError::NotFound(_)) => Ok(render_with_status(
            StatusCode::NOT_FOUND,
            ConfirmationTemplate {
                booking_id,
                ..ConfirmationTemplate::default()
            },
        )),
        Err(err) => Err(err.into()),
    }
}
