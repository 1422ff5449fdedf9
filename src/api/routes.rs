use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;
use crate::auth;
use crate::config::Config;
use crate::services::upload_service::UploadKind;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let organization_routes = Router::new()
        .route(
            "/",
            get(handlers::organizations::list_organizations)
                .post(handlers::organizations::create_organization),
        )
        .route("/{slug}", get(handlers::organizations::get_organization))
        .route(
            "/{slug}/invitations",
            post(handlers::organizations::invite_member),
        );

    let board_routes = Router::new()
        .route("/", post(handlers::boards::create_board))
        .route(
            "/{id}",
            get(handlers::boards::get_board)
                .patch(handlers::boards::update_board)
                .delete(handlers::boards::delete_board),
        )
        .route("/{id}/lists", post(handlers::boards::create_list))
        .route("/{id}/lists/reorder", patch(handlers::boards::reorder_lists))
        .route("/{id}/events", get(handlers::events::board_events));

    let list_routes = Router::new()
        .route(
            "/{id}",
            patch(handlers::lists::update_list).delete(handlers::lists::delete_list),
        )
        .route("/{id}/cards", post(handlers::lists::create_card));

    let card_routes = Router::new()
        .route("/reorder", patch(handlers::cards::reorder_cards))
        .route(
            "/{id}",
            get(handlers::cards::get_card)
                .patch(handlers::cards::update_card)
                .delete(handlers::cards::delete_card),
        )
        .route("/{id}/move", patch(handlers::cards::move_card));

    let file_routes = Router::new().route(
        "/{id}",
        get(handlers::files::download_file).delete(handlers::files::delete_file),
    );

    let upload_routes = Router::new()
        .route(
            "/api/auth/avatar",
            post(auth::handlers::upload_avatar).delete(auth::handlers::delete_avatar),
        )
        .route("/api/boards/{id}/cover", post(handlers::boards::upload_cover))
        .route(
            "/api/cards/{id}/attachments",
            post(handlers::cards::upload_attachments).get(handlers::cards::list_attachments),
        )
        .layer(DefaultBodyLimit::max(
            UploadKind::CardAttachment.max_request_bytes(),
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::liveness))
        .route("/api/auth/register", post(auth::handlers::register))
        .route("/api/auth/login", post(auth::handlers::login))
        .route("/api/auth/refresh", post(auth::handlers::refresh))
        .route("/api/auth/logout", post(auth::handlers::logout));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::handlers::me))
        .route(
            "/api/invitations/{token}/accept",
            post(handlers::organizations::accept_invitation),
        )
        .nest("/api/organizations", organization_routes)
        .nest("/api/boards", board_routes)
        .nest("/api/lists", list_routes)
        .nest("/api/cards", card_routes)
        .nest("/api/files", file_routes)
        .merge(upload_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::auth_middleware,
        ));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let index = format!("{}/index.html", config.frontend_dir.trim_end_matches('/'));
    let serve_dir = ServeDir::new(&config.frontend_dir).not_found_service(ServeFile::new(index));

    api_routes.fallback_service(serve_dir)
}
