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
use crate::database::definitions::project::{AccessibleProjects, Project};
use crate::database::definitions::task::Task;
use crate::prelude::*;
use crate::today::MAX_DAILY_TASKS;

/// The requested today-set, validated at the boundary: more than six ids is
/// a contract violation, an empty request clears the selection.
#[derive(Debug, Clone)]
pub struct SelectionRequest(Vec<String>);

impl SelectionRequest {
    pub fn new(task_ids: Vec<String>) -> Result<Self> {
        if task_ids.len() > MAX_DAILY_TASKS {
            return Err(ApplicationError::BadRequest("too many tasks".to_owned()));
        }

        Ok(Self(task_ids))
    }
}

/// the task's author, the project owner and collaborators of any role may put
/// a task on their daily list
fn can_select(account: &Id, task: &Task, project: Option<&Project>) -> bool {
    task.author().eq(account) || project.is_some_and(|project| project.is_member(account))
}

/// Replaces the account's today-selection.
///
/// The previous selection (own tasks only) is cleared first; every requested
/// id is then looked up and authorized individually. Ids that do not resolve
/// or are not selectable are skipped without failing the call, so a partially
/// authorized request yields a partial selection. Each flag update is its own
/// document write; concurrent calls resolve to last-writer-wins.
#[instrument(skip(account, request, connection), fields(account = %account.id()))]
pub async fn apply(
    account: &Account,
    request: SelectionRequest,
    connection: &DatabaseConnection,
) -> Result<Vec<Task>> {
    // drop the current selection of the acting account
    sql_span!(connection
        .query("UPDATE task SET selected_for_today = false WHERE author = $account AND selected_for_today = true")
        .bind(("account", account.id()))
        .await?
        .check()?);

    for raw in request.0 {
        let id = match Id::try_from(("task", raw.as_str())) {
            Ok(id) => id,
            Err(_) => {
                debug!("Skipping malformed task id {:?}", raw);
                continue;
            }
        };

        let Some(task) = Task::fetch(&id, connection).await? else {
            debug!("Skipping unknown task {}", id);
            continue;
        };
        let project = Project::fetch(task.project(), connection).await?;

        if !can_select(account.id(), &task, project.as_ref()) {
            debug!("Skipping unauthorized task {}", id);
            continue;
        }

        let _: Option<Task> = sql_span!(connection
            .update(id.to_thing())
            .merge(&json!({ "selected_for_today": true }))
            .await?);
    }

    today_set(account, connection).await
}

/// Every selected task visible to the account (its own tasks plus tasks in
/// accessible projects), ordered by [`TaskPriority`](crate::database::definitions::task::TaskPriority)
/// with the task id as tiebreak.
#[instrument(skip_all, fields(account = %account.id()))]
pub async fn today_set(account: &Account, connection: &DatabaseConnection) -> Result<Vec<Task>> {
    let access = AccessibleProjects::resolve(account.id(), connection).await?;

    let mut tasks = sql_span!(connection
        .query("SELECT * FROM task WHERE selected_for_today = true AND (author = $account OR project INSIDE $projects)")
        .bind(("account", account.id()))
        .bind(("projects", access.ids()))
        .await?
        .take::<Vec<Task>>(0)?);

    tasks.sort_by(|a, b| {
        a.priority()
            .cmp(b.priority())
            .then_with(|| a.id().to_string().cmp(&b.id().to_string()))
    });

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::project::CollaboratorRole;
    use crate::database::definitions::task::{Task, TaskPriority, WriteTask};
    use crate::tests::TestSuite;
    use crate::today::selection::{apply, SelectionRequest};
    use axum::BoxError;

    #[test]
    fn request_is_bounded() {
        let ids: Vec<String> = (0..7).map(|index| format!("task:{index}")).collect();
        assert!(SelectionRequest::new(ids).is_err());
        assert!(SelectionRequest::new(Vec::new()).is_ok());
    }

    #[tokio::test]
    async fn selection_is_capped_and_unchanged_on_violation() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let project = suite.create_project(suite.account(), "focus").await?;

        let mut ids = Vec::new();
        for index in 0..7 {
            let task = suite
                .create_task(suite.account(), &project, format!("task {index}").as_str())
                .await?;
            ids.push(task.id().to_string());
        }

        // a valid selection first
        let selected = apply(
            suite.account(),
            SelectionRequest::new(ids[..2].to_vec())?,
            suite.connection(),
        )
        .await?;
        assert_eq!(2, selected.len());

        // seven ids violate the contract before anything is touched
        assert!(SelectionRequest::new(ids.clone()).is_err());
        let still_selected =
            crate::today::selection::today_set(suite.account(), suite.connection()).await?;
        assert_eq!(2, still_selected.len());

        Ok(())
    }

    #[tokio::test]
    async fn selection_is_idempotent_and_clearable() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let project = suite.create_project(suite.account(), "focus").await?;
        let task = suite.create_task(suite.account(), &project, "breathe").await?;

        let request = vec![task.id().to_string()];
        let first = apply(
            suite.account(),
            SelectionRequest::new(request.clone())?,
            suite.connection(),
        )
        .await?;
        let second = apply(
            suite.account(),
            SelectionRequest::new(request)?,
            suite.connection(),
        )
        .await?;
        assert_eq!(first, second);
        assert_eq!(1, second.len());

        // an empty request clears the selection
        let cleared = apply(
            suite.account(),
            SelectionRequest::new(Vec::new())?,
            suite.connection(),
        )
        .await?;
        assert!(cleared.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_and_unknown_ids_are_skipped() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let stranger = suite.create_account("stranger@test.de").await?;

        let own_project = suite.create_project(suite.account(), "mine").await?;
        let own_task = suite
            .create_task(suite.account(), &own_project, "authorized")
            .await?;

        // a task in a project the acting account has no relationship to
        let foreign_project = suite.create_project(&stranger, "theirs").await?;
        let foreign_task = suite
            .create_task(&stranger, &foreign_project, "off limits")
            .await?;

        let selected = apply(
            suite.account(),
            SelectionRequest::new(vec![
                own_task.id().to_string(),
                foreign_task.id().to_string(),
                "task:doesnotexist".to_owned(),
                "garbage".to_owned(),
            ])?,
            suite.connection(),
        )
        .await?;

        assert_eq!(1, selected.len());
        assert_eq!(own_task.id(), selected[0].id());

        // the foreign task was left untouched
        let foreign_task = Task::fetch(foreign_task.id(), suite.connection())
            .await?
            .unwrap();
        assert!(!foreign_task.selected_for_today());

        Ok(())
    }

    #[tokio::test]
    async fn collaborators_may_select_shared_tasks() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let owner = suite.create_account("owner@test.de").await?;

        let shared = suite.create_project(&owner, "shared").await?;
        let shared = shared
            .add_collaborator(
                suite.account().id(),
                CollaboratorRole::Viewer,
                suite.connection(),
            )
            .await?;
        let task = suite.create_task(&owner, &shared, "pair review").await?;

        let selected = apply(
            suite.account(),
            SelectionRequest::new(vec![task.id().to_string()])?,
            suite.connection(),
        )
        .await?;
        assert_eq!(1, selected.len());

        Ok(())
    }

    #[tokio::test]
    async fn today_set_is_priority_ordered() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let project = suite.create_project(suite.account(), "focus").await?;

        let mut ids = Vec::new();
        for priority in [TaskPriority::Low, TaskPriority::High, TaskPriority::Medium] {
            let task = WriteTask::from(suite.connection())
                .set_name(Some(format!("{priority:?}")))
                .set_project(Some(project.id().clone()))
                .set_author(Some(suite.account().id().clone()))
                .set_priority(Some(priority))
                .to_owned()
                .await?;
            ids.push(task.id().to_string());
        }

        let selected = apply(
            suite.account(),
            SelectionRequest::new(ids)?,
            suite.connection(),
        )
        .await?;

        let priorities: Vec<TaskPriority> =
            selected.iter().map(|task| *task.priority()).collect();
        assert_eq!(
            vec![TaskPriority::High, TaskPriority::Medium, TaskPriority::Low],
            priorities
        );

        Ok(())
    }
}
