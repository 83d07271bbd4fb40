/*
 *     Copyright (C) 2023  Fritz Ochsmann
 *
 *     This program is free software: you can redistribute it and/or modify
 *     it under the terms of the GNU Affero General Public License as published
 *     by the Free Software Foundation, either version 3 of the License, or
 *     (at your option) any later version.
 *
 *     This program is distributed in the hope that it will be useful,
 *     but WITHOUT ANY WARRANTY; without even the implied warranty of
 *     MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *     GNU Affero General Public License for more details.
 *
 *     You should have received a copy of the GNU Affero General Public License
 *     along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use crate::database::definitions::account::Account;
use crate::database::definitions::project::Project;
use crate::database::definitions::task::{
    can_edit_task, EditTask, Task, TaskPriority, WriteTask, Weekday,
};
use crate::prelude::*;
use crate::require_session;
use aide::axum::routing::{delete_with, get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use chrono::NaiveDate;

pub fn router(state: ApplicationState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/",
            post_with(create_task, create_task_docs).layer(require_session!(state)),
        )
        .api_route(
            "/:id",
            put_with(put_task, put_task_docs).layer(require_session!(state)),
        )
        .api_route(
            "/:id",
            delete_with(delete_task, delete_task_docs).layer(require_session!(state)),
        )
        .api_route(
            "/of/:project",
            get_with(get_project_tasks, get_project_tasks_docs).layer(require_session!(state)),
        )
        .with_state(state)
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WriteTaskRequest {
    project: String,
    name: String,
    description: Option<String>,
    priority: Option<TaskPriority>,
    due: Option<NaiveDate>,
    estimated_minutes: Option<u32>,
    recurring: Option<bool>,
    recurring_days: Option<Vec<Weekday>>,
}

async fn create_task(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Json(data): Json<WriteTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let project_id = Id::try_from(("project", data.project.as_str()))?;
    let project = Project::fetch(&project_id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))?;

    if !project.can_edit(account.id()) {
        return Err(ApplicationError::Forbidden(
            "missing edit access to the project".to_owned(),
        ));
    }

    let task = WriteTask::from(state.connection())
        .set_name(Some(data.name))
        .set_description(data.description)
        .set_priority(data.priority)
        .set_due(data.due)
        .set_estimated_minutes(data.estimated_minutes)
        .set_recurring(data.recurring)
        .set_recurring_days(data.recurring_days)
        .set_project(Some(project_id))
        .set_author(Some(account.id().clone()))
        .to_owned()
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

fn create_task_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Create a new task within a project the account may edit")
        .summary("Create a task")
        .response::<201, Json<Task>>()
}

async fn put_task(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
    Json(data): Json<EditTask>,
) -> Result<Json<Task>> {
    let id = Id::try_from(("task", id.as_str()))?;
    let task = Task::fetch(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("task".to_owned()))?;
    let project = Project::fetch(task.project(), state.connection()).await?;

    if !can_edit_task(account.id(), &task, project.as_ref()) {
        return Err(ApplicationError::Forbidden(
            "missing edit access to the task".to_owned(),
        ));
    }

    let task = data
        .to_writer(state.connection())
        .set_target(Some(&task))
        .to_owned()
        .await?;

    Ok(Json(task))
}

fn put_task_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description(
            "Edit a task. Completion and recurrence bookkeeping is maintained on status changes",
        )
        .summary("Edit a task")
        .response::<200, Json<Task>>()
}

async fn delete_task(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let id = Id::try_from(("task", id.as_str()))?;
    let task = Task::fetch(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("task".to_owned()))?;
    let project = Project::fetch(task.project(), state.connection()).await?;

    if !can_edit_task(account.id(), &task, project.as_ref()) {
        return Err(ApplicationError::Forbidden(
            "missing edit access to the task".to_owned(),
        ));
    }

    let deleted: Option<Task> = sql_span!(state.connection().delete(&id).await?);

    deleted
        .map(Json)
        .ok_or_else(|| ApplicationError::NotFound("task".to_owned()))
}

fn delete_task_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Delete a task")
        .summary("Delete a task")
        .response::<200, Json<Task>>()
}

async fn get_project_tasks(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<Task>>> {
    let project_id = Id::try_from(("project", project.as_str()))?;
    let project = Project::fetch(&project_id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))?;

    if !project.is_member(account.id()) {
        return Err(ApplicationError::Forbidden(
            "missing access to the project".to_owned(),
        ));
    }

    let tasks = sql_span!(state
        .connection()
        .query("SELECT * FROM task WHERE project = $project")
        .bind(("project", &project_id))
        .await?
        .take::<Vec<Task>>(0)?);

    Ok(Json(tasks))
}

fn get_project_tasks_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Obtain all tasks of a project the account is a member of")
        .summary("List the tasks of a project")
        .response::<200, Json<Vec<Task>>>()
}
