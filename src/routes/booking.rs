use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{current_user, login_redirect},
    booking::{DraftUpdate, StepId},
    error::{AppError, AppResult},
    models::Booking,
    state::AppState,
};

#[derive(Deserialize)]
struct PromoForm {
    #[serde(default)]
    code: String,
}

#[derive(Serialize)]
struct SubmittedBooking {
    booking: Booking,
    confirmation_url: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/booking")
            .service(web::resource("").route(web::post().to(start_session)))
            .service(
                web::resource("/{session_id}")
                    .route(web::get().to(show_session))
                    .route(web::patch().to(update_draft))
                    .route(web::delete().to(abandon_session)),
            )
            .service(web::resource("/{session_id}/promo").route(web::post().to(apply_promo)))
            .service(web::resource("/{session_id}/advance").route(web::post().to(advance)))
            .service(
                web::resource("/{session_id}/retreat/{step}").route(web::post().to(retreat)),
            )
            .service(web::resource("/{session_id}/submit").route(web::post().to(submit))),
    );
}

async fn start_session(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.sessions.start().await;
    HttpResponse::Created().json(snapshot)
}

async fn show_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let snapshot = state
        .sessions
        .with_flow(path.into_inner(), |flow| Ok(flow.snapshot()))
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn update_draft(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    update: web::Json<DraftUpdate>,
) -> AppResult<HttpResponse> {
    let update = update.into_inner();
    let snapshot = state
        .sessions
        .with_flow(path.into_inner(), |flow| {
            flow.update(update)?;
            Ok(flow.snapshot())
        })
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn apply_promo(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Json<PromoForm>,
) -> AppResult<HttpResponse> {
    let session_id = path.into_inner();
    let code = form.into_inner().code.trim().to_uppercase();

    let quote = if code.is_empty() {
        None
    } else {
        let subtotal = state
            .sessions
            .with_flow(session_id, |flow| Ok(flow.draft().subtotal))
            .await?;
        Some(state.booking_api.quote_promo(&code, subtotal).await?)
    };

    let snapshot = state
        .sessions
        .with_flow(session_id, |flow| {
            flow.update(DraftUpdate::Promo(quote))?;
            Ok(flow.snapshot())
        })
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn advance(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let snapshot = state
        .sessions
        .with_flow(path.into_inner(), |flow| {
            flow.advance()?;
            Ok(flow.snapshot())
        })
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn retreat(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
) -> AppResult<HttpResponse> {
    let (session_id, step) = path.into_inner();
    let step: StepId = step
        .parse()
        .map_err(|message: String| AppError::validation("step", message))?;
    let snapshot = state
        .sessions
        .with_flow(session_id, |flow| {
            flow.retreat(step)?;
            Ok(flow.snapshot())
        })
        .await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Signed-out customers are sent to login with their selection attached.
async fn submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let session_id = path.into_inner();

    if current_user(&state, &req).await?.is_none() {
        let location = state
            .sessions
            .with_flow(session_id, |flow| Ok(login_redirect(flow.draft())))
            .await?;
        return Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, location))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish());
    }

    let booking = state
        .sessions
        .submit(session_id, state.booking_api.as_ref())
        .await?;
    let confirmation_url = format!("/bookings/{}/confirmation", booking.id);
    Ok(HttpResponse::Created()
        .append_header((header::LOCATION, confirmation_url.clone()))
        .json(SubmittedBooking {
            booking,
            confirmation_url,
        }))
}

async fn abandon_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let session_id = path.into_inner();
    if state.sessions.abandon(session_id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!("booking session {session_id}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::testing::{booking_date, customer, service, slot_on, test_state, FakeBackend, TEST_TOKEN};

    fn session_id(body: Value) -> String {
        body["session_id"].as_str().unwrap().to_string()
    }

    fn start_req() -> test::TestRequest {
        test::TestRequest::post().uri("/api/booking")
    }

    fn patch_req(session: &str, update: Value) -> test::TestRequest {
        test::TestRequest::patch()
            .uri(&format!("/api/booking/{session}"))
            .set_json(update)
    }

    fn post_req(uri: &str, signed_in: bool) -> test::TestRequest {
        let req = test::TestRequest::post().uri(uri);
        if signed_in {
            req.insert_header(("Authorization", format!("Bearer {TEST_TOKEN}")))
        } else {
            req
        }
    }

    fn wizard_updates() -> Vec<Option<Value>> {
        vec![
            Some(json!({ "step": "service", "data": service() })),
            Some(json!({
                "step": "schedule",
                "data": { "date": booking_date(), "time_slot": slot_on(booking_date()) }
            })),
            Some(json!({ "step": "staff", "data": { "kind": "any" } })),
            None,
            Some(json!({ "step": "append_request", "data": "Extra towels" })),
            Some(json!({ "step": "customer_info", "data": customer() })),
            Some(json!({ "step": "payment", "data": { "method": "card" } })),
        ]
    }

    #[actix_web::test]
    async fn full_wizard_submits_and_ends_session() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend.clone()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        for update in wizard_updates() {
            if let Some(update) = update {
                let resp = test::call_service(&app, patch_req(&session, update).to_request()).await;
                assert_eq!(resp.status(), StatusCode::OK);
            }
            let req = post_req(&format!("/api/booking/{session}/advance"), false);
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = post_req(&format!("/api/booking/{session}/submit"), true);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["booking"]["notes"], "Extra towels");
        assert_eq!(body["confirmation_url"], "/bookings/bk-1/confirmation");
        assert_eq!(backend.create_count(), 1);
        assert_eq!(state.sessions.active_count().await, 0);
    }

    #[actix_web::test]
    async fn details_broken_after_completion_block_submit() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend.clone()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        for update in wizard_updates() {
            if let Some(update) = update {
                test::call_service(&app, patch_req(&session, update).to_request()).await;
            }
            let req = post_req(&format!("/api/booking/{session}/advance"), false);
            test::call_service(&app, req.to_request()).await;
        }

        let broken = json!({
            "step": "customer_info",
            "data": { "name": " ", "email": "nope", "phone": "x" }
        });
        let resp = test::call_service(&app, patch_req(&session, broken).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = post_req(&format!("/api/booking/{session}/submit"), true);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "validation_error");
        assert_eq!(backend.create_count(), 0);
    }

    #[actix_web::test]
    async fn signed_out_submit_redirects_to_login() {
        let state = test_state(Arc::new(FakeBackend::default())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        let update = json!({ "step": "service", "data": service() });
        test::call_service(&app, patch_req(&session, update).to_request()).await;

        let req = post_req(&format!("/api/booking/{session}/submit"), false);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/login?next=%2Fbook&service_id=svc-cut");
    }

    #[actix_web::test]
    async fn advance_reports_field_errors() {
        let state = test_state(Arc::new(FakeBackend::default())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        let req = post_req(&format!("/api/booking/{session}/advance"), false);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["fields"][0]["field"], "service");
    }

    #[actix_web::test]
    async fn retreat_validates_step_names_and_order() {
        let state = test_state(Arc::new(FakeBackend::default())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        let req = post_req(&format!("/api/booking/{session}/retreat/checkout"), false);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = post_req(&format!("/api/booking/{session}/retreat/payment"), false);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn promo_codes_adjust_total() {
        let state = test_state(Arc::new(FakeBackend::default())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        let update = json!({ "step": "service", "data": service() });
        test::call_service(&app, patch_req(&session, update).to_request()).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/booking/{session}/promo"))
            .set_json(json!({ "code": "welcome10" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["draft"]["total"], "35");

        let req = test::TestRequest::post()
            .uri(&format!("/api/booking/{session}/promo"))
            .set_json(json!({ "code": "BOGUS" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn abandoned_sessions_are_gone() {
        let state = test_state(Arc::new(FakeBackend::default())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let session = session_id(test::call_and_read_body_json(&app, start_req().to_request()).await);
        let req = test::TestRequest::delete()
            .uri(&format!("/api/booking/{session}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/booking/{session}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
