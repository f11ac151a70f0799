use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{first_date_param, parse_date_param};
use crate::db::repository;
use crate::error::AppError;
use crate::identity::CurrentPrincipal;
use crate::models::*;
use crate::services::{
    ActionType, LessonScope, RelatedData, ResultActions, ScheduleEntry, ScheduleOwner,
    SqliteLookups, SqliteResultActions, Table, prefetch, schedule_for,
};
use crate::state::AppState;

const ANNOUNCEMENT_LIMIT: i64 = 3;

#[derive(Debug, Serialize)]
struct FormView {
    table: Table,
    #[serde(rename = "type")]
    action: ActionType,
    #[serde(rename = "relatedData")]
    related_data: RelatedData,
}

#[derive(Debug, Serialize)]
struct StudentPageView {
    class: Option<ClassOption>,
    schedule: Vec<ScheduleEntry>,
    announcements: Vec<Announcement>,
}

#[derive(Debug, Serialize)]
struct TeacherPageView {
    schedule: Vec<ScheduleEntry>,
    announcements: Vec<Announcement>,
}

#[derive(Debug, Serialize)]
struct EventsView {
    date: NaiveDate,
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct ScheduleParams {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    #[serde(default)]
    date: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forms/{table}/{action}", get(form_container))
        .route("/results", post(create_result))
        .route("/results/{id}", put(update_result))
        .route("/events", get(events_on_date))
        .route("/schedule", get(schedule))
        .route("/student", get(student_page))
        .route("/teacher", get(teacher_page))
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn require_staff(principal: &Principal) -> Result<(), AppError> {
    match principal.role {
        Some(Role::Admin) | Some(Role::Teacher) => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn form_container(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    path: Result<Path<(Table, ActionType)>, PathRejection>,
) -> Result<Json<FormView>, AppError> {
    let Path((table, action)) = path?;
    let scope = LessonScope::for_principal(&principal);
    let lookups = SqliteLookups::new(state.db.clone());
    let related_data = prefetch(&lookups, table, action, &scope).await?;

    Ok(Json(FormView {
        table,
        action,
        related_data,
    }))
}

async fn create_result(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    body: Result<Json<ResultInput>, JsonRejection>,
) -> Result<Json<ActionState>, AppError> {
    require_staff(&principal)?;
    let Json(input) = body?;
    let payload = input.validate(false).map_err(AppError::Validation)?;

    info!("{} creating result for student {}", principal.id, payload.student_id);
    let actions = SqliteResultActions::new(state.db.clone());
    Ok(Json(actions.create(payload).await))
}

async fn update_result(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ResultInput>, JsonRejection>,
) -> Result<Json<ActionState>, AppError> {
    require_staff(&principal)?;
    let Path(id) = path?;
    let Json(mut input) = body?;
    match input.id {
        Some(body_id) if body_id != id => {
            return Err(AppError::BadRequest(format!(
                "body id {} does not match path id {}",
                body_id, id
            )));
        }
        _ => input.id = Some(id),
    }
    let payload = input.validate(true).map_err(AppError::Validation)?;

    info!("{} updating result {}", principal.id, id);
    let actions = SqliteResultActions::new(state.db.clone());
    Ok(Json(actions.update(payload).await))
}

async fn events_on_date(
    State(state): State<AppState>,
    _principal: CurrentPrincipal,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<EventsView>, AppError> {
    let Query(pairs) = query?;
    let date = parse_date_param(first_date_param(&pairs), today())?;
    let events = repository::fetch_events_on(&state.db, date).await?;
    Ok(Json(EventsView { date, events }))
}

async fn schedule(
    State(state): State<AppState>,
    _principal: CurrentPrincipal,
    query: Result<Query<ScheduleParams>, QueryRejection>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let Query(params) = query?;
    let owner = ScheduleOwner::from_params(&params.kind, &params.id)?;
    let reference = parse_date_param(params.date.as_deref(), today())?;
    Ok(Json(schedule_for(&state.db, &owner, reference).await?))
}

async fn student_page(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
) -> Result<Json<StudentPageView>, AppError> {
    let class = match principal.email.as_deref() {
        Some(email) => repository::find_class_by_student_email(&state.db, email).await?,
        None => None,
    };

    let class_id = class.as_ref().map(|c| c.id);
    let (schedule, announcements) = tokio::try_join!(
        async {
            match class_id {
                Some(id) => schedule_for(&state.db, &ScheduleOwner::Class(id), today()).await,
                None => Ok(Vec::new()),
            }
        },
        async {
            repository::fetch_latest_announcements(&state.db, class_id, ANNOUNCEMENT_LIMIT)
                .await
                .map_err(AppError::from)
        },
    )?;

    Ok(Json(StudentPageView {
        class,
        schedule,
        announcements,
    }))
}

async fn teacher_page(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
) -> Result<Json<TeacherPageView>, AppError> {
    let owner = ScheduleOwner::Teacher(principal.id.clone());
    let (schedule, announcements) = tokio::try_join!(
        schedule_for(&state.db, &owner, today()),
        async {
            repository::fetch_latest_announcements(&state.db, None, ANNOUNCEMENT_LIMIT)
                .await
                .map_err(AppError::from)
        },
    )?;

    Ok(Json(TeacherPageView {
        schedule,
        announcements,
    }))
}
