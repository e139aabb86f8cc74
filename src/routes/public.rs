use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{optional_user, require_user},
    error::AppResult,
    models::{Pagination, ServiceProvider},
    search::{apply_favorites, calculate_search_stats, filter_providers, SearchParams, SearchStats},
    state::AppState,
};

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<ServiceProvider>,
    stats: SearchStats,
}

#[derive(Deserialize)]
struct ServicesQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/providers").route(web::get().to(search_providers)))
        .service(web::resource("/api/providers/{id}").route(web::get().to(show_provider)))
        .service(
            web::resource("/api/favorites/{provider_id}")
                .route(web::post().to(add_favorite))
                .route(web::delete().to(remove_favorite)),
        )
        .service(web::resource("/api/services").route(web::get().to(list_services)))
        .service(web::resource("/api/services/{id}/slots").route(web::get().to(list_time_slots)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn search_providers(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SearchParams>,
) -> AppResult<HttpResponse> {
    let params = query.into_inner();
    let filters = params.to_filters();

    let mut providers = state.providers.list_providers().await?;
    if let Some(user) = optional_user(&state, &req).await {
        let favorites = state.providers.favorites(&user.id).await?;
        apply_favorites(&mut providers, &favorites);
    }

    let results = filter_providers(&providers, params.query(), &filters);
    let stats = calculate_search_stats(&results, params.query(), &filters);
    Ok(HttpResponse::Ok().json(SearchResponse { results, stats }))
}

async fn show_provider(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let mut provider = state.providers.get_provider(&path.into_inner()).await?;
    if let Some(user) = optional_user(&state, &req).await {
        let favorites = state.providers.favorites(&user.id).await?;
        provider.is_favorite = favorites.contains(&provider.id);
    }
    Ok(HttpResponse::Ok().json(provider))
}

async fn add_favorite(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = require_user(&state, &req).await?;
    state
        .providers
        .add_favorite(&user.id, &path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn remove_favorite(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = require_user(&state, &req).await?;
    state
        .providers
        .remove_favorite(&user.id, &path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_services(
    state: web::Data<AppState>,
    query: web::Query<ServicesQuery>,
) -> AppResult<HttpResponse> {
    let defaults = Pagination::default();
    let page = query.page.unwrap_or(defaults.page).max(1);
    let per_page = query.per_page.unwrap_or(defaults.per_page).clamp(1, 100);
    let services = state.booking_api.get_services(page, per_page).await?;
    Ok(HttpResponse::Ok().json(services))
}

async fn list_time_slots(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slots = state
        .booking_api
        .get_service_time_slots(&path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(slots))
}
