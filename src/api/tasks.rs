// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task endpoints of the consuming service.
//!
//! | Route | Who may call |
//! |-------|--------------|
//! | `POST /api/tasks/create` | any authenticated user |
//! | `GET /api/tasks/getAll` | any authenticated user (own tasks) |
//! | `GET /api/tasks/admin/getAll` | admin |
//! | `GET /api/tasks/{id}` | owner or admin |
//! | `PUT /api/tasks/{id}` | owner |
//! | `DELETE /api/tasks/{id}` | owner or admin |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{policy, AdminOnly, Auth, AuthenticatedPrincipal},
    error::ApiError,
    models::{ApiResponse, CreateTaskRequest, ResourceId, Task, UpdateTaskRequest},
    state::ConsumerState,
    store::TaskStore,
};

#[utoipa::path(
    post,
    path = "/api/tasks/create",
    request_body = CreateTaskRequest,
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Task created for the caller", body = Task),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_task(
    Auth(principal): Auth,
    State(state): State<ConsumerState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Task title is required"));
    }

    let mut store = state.tasks.write().await;
    let task = store.create(principal.user_id, request);
    tracing::info!(task_id = task.id, owner_id = task.owner_id, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Task created", task)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/tasks/getAll",
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Tasks owned by the caller", body = [Task]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_tasks(
    Auth(principal): Auth,
    State(state): State<ConsumerState>,
) -> Json<ApiResponse<Vec<Task>>> {
    let store = state.tasks.read().await;
    Json(ApiResponse::success(
        "Tasks retrieved",
        store.list_by_owner(principal.user_id),
    ))
}

#[utoipa::path(
    get,
    path = "/api/tasks/admin/getAll",
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Every task", body = [Task]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_all_tasks(
    AdminOnly(_admin): AdminOnly,
    State(state): State<ConsumerState>,
) -> Json<ApiResponse<Vec<Task>>> {
    let store = state.tasks.read().await;
    Json(ApiResponse::success("All tasks retrieved", store.list_all()))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task identifier")),
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Task", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    Auth(principal): Auth,
    Path(id): Path<ResourceId>,
    State(state): State<ConsumerState>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let store = state.tasks.read().await;
    let task = authorize(&principal, id, &store, true)?;
    Ok(Json(ApiResponse::success("Task retrieved", task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task identifier")),
    request_body = UpdateTaskRequest,
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the owner"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    Auth(principal): Auth,
    Path(id): Path<ResourceId>,
    State(state): State<ConsumerState>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let mut store = state.tasks.write().await;
    authorize(&principal, id, &store, false)?;

    let task = store
        .update(id, request)
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    Ok(Json(ApiResponse::success("Task updated", task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task identifier")),
    tag = "Tasks",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    Auth(principal): Auth,
    Path(id): Path<ResourceId>,
    State(state): State<ConsumerState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.tasks.write().await;
    authorize(&principal, id, &store, true)?;

    store.delete(id);
    tracing::info!(task_id = id, username = %principal.username, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 404 for unknown tasks, 403 for tasks the principal may not touch.
fn authorize(
    principal: &AuthenticatedPrincipal,
    id: ResourceId,
    store: &TaskStore,
    admin_bypasses: bool,
) -> Result<Task, ApiError> {
    let task = store
        .get(id)
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    policy::require_owner(principal, id, store, admin_bypasses)?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{codec, consumer_state};
    use crate::auth::TokenValidator;

    fn principal(user_id: i64, roles: &[&str]) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            username: format!("user{user_id}"),
            user_id,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    async fn state_with_task(owner: i64) -> (ConsumerState, Task) {
        let state = consumer_state(TokenValidator::Local(codec()));
        let task = state.tasks.write().await.create(
            owner,
            CreateTaskRequest {
                title: "owned".into(),
                description: Some("by someone".into()),
            },
        );
        (state, task)
    }

    #[tokio::test]
    async fn create_assigns_caller_as_owner() {
        let state = consumer_state(TokenValidator::Local(codec()));
        let (status, Json(body)) = create_task(
            Auth(principal(5, &["USER"])),
            State(state.clone()),
            Json(CreateTaskRequest {
                title: "mine".into(),
                description: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.data.unwrap().owner_id, 5);
        assert_eq!(state.tasks.read().await.list_by_owner(5).len(), 1);
    }

    #[tokio::test]
    async fn create_requires_title() {
        let state = consumer_state(TokenValidator::Local(codec()));
        let error = create_task(
            Auth(principal(5, &["USER"])),
            State(state),
            Json(CreateTaskRequest {
                title: " ".into(),
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn owner_and_admin_can_read() {
        let (state, task) = state_with_task(5).await;

        let owner = get_task(Auth(principal(5, &["USER"])), Path(task.id), State(state.clone())).await;
        assert!(owner.is_ok());

        let admin = get_task(Auth(principal(6, &["ADMIN"])), Path(task.id), State(state.clone())).await;
        assert!(admin.is_ok());

        let other = get_task(Auth(principal(6, &["USER"])), Path(task.id), State(state))
            .await
            .unwrap_err();
        assert_eq!(other.status, StatusCode::FORBIDDEN);
        assert_eq!(other.error_code, Some("not_owner"));
    }

    #[tokio::test]
    async fn missing_task_is_404_even_for_admin() {
        let (state, _) = state_with_task(5).await;
        let error = get_task(Auth(principal(6, &["ADMIN"])), Path(99), State(state))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_owner_can_update() {
        let (state, task) = state_with_task(5).await;
        let change = || UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        };

        let admin = update_task(
            Auth(principal(6, &["ADMIN"])),
            Path(task.id),
            State(state.clone()),
            Json(change()),
        )
        .await
        .unwrap_err();
        assert_eq!(admin.status, StatusCode::FORBIDDEN);

        let Json(body) = update_task(
            Auth(principal(5, &["USER"])),
            Path(task.id),
            State(state),
            Json(change()),
        )
        .await
        .unwrap();
        assert!(body.data.unwrap().completed);
    }

    #[tokio::test]
    async fn admin_can_delete_foreign_task() {
        let (state, task) = state_with_task(5).await;

        let other = delete_task(Auth(principal(7, &["USER"])), Path(task.id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(other.status, StatusCode::FORBIDDEN);

        let status = delete_task(Auth(principal(6, &["admin"])), Path(task.id), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.tasks.read().await.get(task.id).is_none());
    }

    #[tokio::test]
    async fn listings_respect_ownership() {
        let (state, _) = state_with_task(5).await;
        state.tasks.write().await.create(
            6,
            CreateTaskRequest {
                title: "other".into(),
                description: None,
            },
        );

        let Json(mine) = list_my_tasks(Auth(principal(5, &["USER"])), State(state.clone())).await;
        assert_eq!(mine.data.unwrap().len(), 1);

        let Json(all) = list_all_tasks(AdminOnly(principal(1, &["ADMIN"])), State(state)).await;
        assert_eq!(all.data.unwrap().len(), 2);
    }
}
