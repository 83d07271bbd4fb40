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
use crate::database::definitions::project::{
    AccessibleProjects, CollaboratorRole, Project, WriteProject,
};
use crate::prelude::*;
use crate::require_session;
use aide::axum::routing::{delete_with, get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;

pub fn router(state: ApplicationState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(get_projects, get_projects_docs).layer(require_session!(state)),
        )
        .api_route(
            "/",
            post_with(create_project, create_project_docs).layer(require_session!(state)),
        )
        .api_route(
            "/:id",
            put_with(put_project, put_project_docs).layer(require_session!(state)),
        )
        .api_route(
            "/:id",
            delete_with(delete_project, delete_project_docs).layer(require_session!(state)),
        )
        .api_route(
            "/:id/collaborator",
            post_with(add_collaborator, add_collaborator_docs).layer(require_session!(state)),
        )
        .with_state(state)
}

async fn get_projects(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
) -> Result<Json<AccessibleProjects>> {
    let access = AccessibleProjects::resolve(account.id(), state.connection()).await?;

    Ok(Json(access))
}

fn get_projects_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Obtain every non-archived project the account may act on")
        .summary("List accessible projects")
        .response::<200, Json<AccessibleProjects>>()
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WriteProjectRequest {
    name: String,
    #[serde(default)]
    is_priority: bool,
}

async fn create_project(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Json(data): Json<WriteProjectRequest>,
) -> Result<(StatusCode, Json<Project>)> {
    let project = WriteProject::from(state.connection())
        .set_name(Some(data.name))
        .set_is_priority(Some(data.is_priority))
        .set_owner(Some(account.id().clone()))
        .to_owned()
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

fn create_project_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Create a new project owned by the acting account")
        .summary("Create a project")
        .response::<201, Json<Project>>()
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EditProjectRequest {
    name: Option<String>,
    is_archived: Option<bool>,
    is_priority: Option<bool>,
}

async fn put_project(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
    Json(data): Json<EditProjectRequest>,
) -> Result<Json<Project>> {
    let id = Id::try_from(("project", id.as_str()))?;
    let project = Project::fetch(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))?;

    // flags and names are owner/admin territory
    if !project.is_owner(account.id())
        && !matches!(project.role_of(account.id()), Some(CollaboratorRole::Admin))
    {
        return Err(ApplicationError::Forbidden(
            "only the owner or an admin may change a project".to_owned(),
        ));
    }

    let project = WriteProject::from(state.connection())
        .set_target(Some(&project))
        .set_name(data.name)
        .set_is_archived(data.is_archived)
        .set_is_priority(data.is_priority)
        .to_owned()
        .await?;

    Ok(Json(project))
}

fn put_project_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Rename, archive or (un)flag a project as priority")
        .summary("Edit a project")
        .response::<200, Json<Project>>()
}

async fn delete_project(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<Project>> {
    let id = Id::try_from(("project", id.as_str()))?;
    let project = Project::fetch(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))?;

    if !project.is_owner(account.id()) {
        return Err(ApplicationError::Forbidden(
            "only the owner may delete a project".to_owned(),
        ));
    }

    project.delete(state.connection()).await?;

    Ok(Json(project))
}

fn delete_project_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Delete a project and every task within it")
        .summary("Delete a project")
        .response::<200, Json<Project>>()
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddCollaboratorRequest {
    account: String,
    role: CollaboratorRole,
}

async fn add_collaborator(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
    Json(data): Json<AddCollaboratorRequest>,
) -> Result<Json<Project>> {
    let id = Id::try_from(("project", id.as_str()))?;
    let collaborator = Id::try_from(("account", data.account.as_str()))?;

    let project = Project::fetch(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))?;

    if !project.is_owner(account.id())
        && !matches!(project.role_of(account.id()), Some(CollaboratorRole::Admin))
    {
        return Err(ApplicationError::Forbidden(
            "only the owner or an admin may invite collaborators".to_owned(),
        ));
    }

    let project = project
        .add_collaborator(&collaborator, data.role, state.connection())
        .await?;

    Ok(Json(project))
}

fn add_collaborator_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Add a collaborator to the project or change their role")
        .summary("Add a collaborator")
        .response::<200, Json<Project>>()
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::project::Project;
    use crate::database::definitions::task::Task;
    use crate::tests::TestSuite;
    use axum::http::StatusCode;
    use axum::BoxError;

    #[tokio::test]
    async fn test_create_and_list() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        suite.authorize_default().await;

        let response = suite
            .client()
            .post("/project")
            .json(&json!({ "name": "focus", "isPriority": true }))
            .send()
            .await;
        assert_eq!(StatusCode::CREATED, response.status());
        let project = response.json::<Project>().await;
        assert!(project.is_priority());

        let response = suite.client().get("/project").send().await;
        assert_eq!(StatusCode::OK, response.status());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        suite.authorize_default().await;

        let project = suite.create_project(suite.account(), "doomed").await?;
        let task = suite.create_task(suite.account(), &project, "going down").await?;

        let response = suite
            .client()
            .delete(format!("/project/{}", project.id()).as_str())
            .send()
            .await;
        assert_eq!(StatusCode::OK, response.status());

        assert!(Task::fetch(task.id(), suite.connection()).await?.is_none());
        assert!(Project::fetch(project.id(), suite.connection())
            .await?
            .is_none());

        Ok(())
    }
}
