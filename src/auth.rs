use actix_web::http::header::Header;
use actix_web::HttpRequest;
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use url::form_urlencoded;

use crate::{
    booking::BookingDraft,
    error::{AppError, AppResult},
    models::AuthUser,
    state::AppState,
};

pub const LOGIN_PATH: &str = "/login";
pub const BOOKING_PATH: &str = "/book";

/// Signed-in user for this request, if any. The test-user flag wins over
/// any token.
pub async fn current_user(state: &AppState, req: &HttpRequest) -> AppResult<Option<AuthUser>> {
    if let Some(user) = &state.config.test_auth_user {
        return Ok(Some(user.clone()));
    }
    let auth = match Authorization::<Bearer>::parse(req) {
        Ok(auth) => auth,
        Err(_) => return Ok(None),
    };
    let bearer = auth.into_scheme();
    state.auth_api.current_user(bearer.token()).await
}

/// Like [`current_user`], but an unreachable auth service counts as
/// signed out.
pub async fn optional_user(state: &AppState, req: &HttpRequest) -> Option<AuthUser> {
    match current_user(state, req).await {
        Ok(user) => user,
        Err(err) => {
            log::warn!("Could not resolve current user: {err}");
            None
        }
    }
}

pub async fn require_user(state: &AppState, req: &HttpRequest) -> AppResult<AuthUser> {
    current_user(state, req).await?.ok_or(AppError::Unauthorized)
}

/// Login URL carrying the in-progress selection so the wizard can be
/// picked up again after sign-in.
pub fn login_redirect(draft: &BookingDraft) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("next", BOOKING_PATH);
    if let Some(service) = &draft.service {
        query.append_pair("service_id", &service.id);
    }
    if let Some(slot) = &draft.time_slot {
        query.append_pair("time_slot_id", &slot.id);
    }
    if let Some(date) = draft.date {
        query.append_pair("date", &date.format("%Y-%m-%d").to_string());
    }
    if let Some(info) = &draft.customer_info {
        for (key, value) in [
            ("name", info.name.as_str()),
            ("email", info.email.as_str()),
            ("phone", info.phone.as_str()),
        ] {
            if !value.trim().is_empty() {
                query.append_pair(key, value.trim());
            }
        }
    }
    if let Some(notes) = draft.notes() {
        query.append_pair("special_requests", &notes);
    }
    format!("{LOGIN_PATH}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test::TestRequest;

    use super::*;
    use crate::booking::DraftUpdate;
    use crate::config::parse_test_user;
    use crate::testing::{
        booking_date, customer, service, slot_on, test_state, FakeBackend, TEST_TOKEN,
    };

    #[test]
    fn redirect_carries_selection() {
        let mut draft = BookingDraft::default();
        draft.apply(DraftUpdate::Service(service())).unwrap();
        draft
            .apply(DraftUpdate::Schedule {
                date: booking_date(),
                time_slot: Some(slot_on(booking_date())),
            })
            .unwrap();
        draft.apply(DraftUpdate::CustomerInfo(customer())).unwrap();
        draft
            .apply(DraftUpdate::SpecialRequests("Step-free access & quiet".to_string()))
            .unwrap();

        let url = login_redirect(&draft);
        assert!(url.starts_with("/login?next=%2Fbook&service_id=svc-cut&time_slot_id=slot-10"));
        assert!(url.contains("date=2026-11-03"));
        assert!(url.contains("name=Ada+Lovelace"));
        assert!(url.contains("email=ada%40example.com"));
        assert!(url.contains("special_requests=Step-free+access+%26+quiet"));
    }

    #[test]
    fn empty_draft_redirects_with_next_only() {
        assert_eq!(login_redirect(&BookingDraft::default()), "/login?next=%2Fbook");
    }

    #[actix_web::test]
    async fn bearer_token_resolves_through_auth_api() {
        let state = test_state(Arc::new(FakeBackend::default())).await;

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {TEST_TOKEN}")))
            .to_http_request();
        let user = current_user(&state, &req).await.unwrap().unwrap();
        assert_eq!(user.id, "u-ada");

        let anonymous = TestRequest::default().to_http_request();
        assert!(current_user(&state, &anonymous).await.unwrap().is_none());
        assert!(matches!(
            require_user(&state, &anonymous).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_web::test]
    async fn test_user_flag_bypasses_tokens() {
        let mut state = test_state(Arc::new(FakeBackend::default())).await;
        let mut config = (*state.config).clone();
        config.test_auth_user = parse_test_user("u-test:QA");
        state.config = Arc::new(config);

        let req = TestRequest::default().to_http_request();
        assert_eq!(require_user(&state, &req).await.unwrap().id, "u-test");
    }
}
