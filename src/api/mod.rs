// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{auth_gate, AuthenticatedPrincipal, TokenKind},
    models::{
        CreateTaskRequest, LoginRequest, LoginResponse, RegisterRequest, ResponseStatus, Task,
        UpdateTaskRequest, UserAccount, VerifyResponse,
    },
    state::{ConsumerState, IssuerState},
};

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

/// Routes of the issuing service.
pub fn issuer_router(state: IssuerState) -> Router {
    let origins = state.gate.allowed_origins().to_vec();

    let router = Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/register", post(auth::register))
        .route("/api/admin/register", post(auth::admin_register))
        .route("/api/verify", post(auth::verify))
        .route("/api/users/me", get(users::current_user))
        .route("/api/users/{username}", get(users::get_user))
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", IssuerApiDoc::openapi()))
        .layer(from_fn_with_state(state.gate.clone(), auth_gate))
        .with_state(state);

    with_http_layers(router, &origins)
}

/// Routes of the consuming service.
pub fn consumer_router(state: ConsumerState) -> Router {
    let origins = state.gate.allowed_origins().to_vec();

    let router = Router::new()
        .route("/api/tasks/create", post(tasks::create_task))
        .route("/api/tasks/getAll", get(tasks::list_my_tasks))
        .route("/api/tasks/admin/getAll", get(tasks::list_all_tasks))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/api/users/me", get(users::current_user))
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ConsumerApiDoc::openapi()))
        .layer(from_fn_with_state(state.gate.clone(), auth_gate))
        .with_state(state);

    with_http_layers(router, &origins)
}

/// CORS, tracing and request IDs, shared by both services.
///
/// The CORS layer sits outside the authentication gate so rejections carry
/// CORS headers too.
fn with_http_layers(router: Router, origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::register,
        auth::admin_register,
        auth::verify,
        users::current_user,
        users::get_user,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            UserAccount,
            VerifyResponse,
            ResponseStatus,
            TokenKind,
            AuthenticatedPrincipal,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Login, registration and token verification"),
        (name = "Users", description = "User lookup"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct IssuerApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        tasks::create_task,
        tasks::list_my_tasks,
        tasks::list_all_tasks,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        users::current_user,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Task,
            CreateTaskRequest,
            UpdateTaskRequest,
            ResponseStatus,
            AuthenticatedPrincipal,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Tasks", description = "Owned task resources"),
        (name = "Users", description = "Current principal"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ConsumerApiDoc;
