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
use crate::database::definitions::project::AccessibleProjects;
use crate::database::definitions::task::{Task, TaskStatus};
use crate::prelude::*;

/// All tasks the account could pick for today: non-done tasks within the
/// eligible project scope (see [`AccessibleProjects::eligible_scope`] for the
/// priority fallback). Pure read, no ordering guarantee.
#[instrument(skip_all, fields(account = %account.id()))]
pub async fn eligible_tasks(account: &Account, connection: &DatabaseConnection) -> Result<Vec<Task>> {
    let access = AccessibleProjects::resolve(account.id(), connection).await?;

    eligible_in_scope(&access.eligible_scope(), connection).await
}

pub(crate) async fn eligible_in_scope(
    projects: &[Id],
    connection: &DatabaseConnection,
) -> Result<Vec<Task>> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let tasks = sql_span!(connection
        .query("SELECT * FROM task WHERE project INSIDE $projects AND status != $done")
        .bind(("projects", projects))
        .bind(("done", TaskStatus::Done))
        .await?
        .take::<Vec<Task>>(0)?);

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::task::{TaskStatus, WriteTask};
    use crate::tests::TestSuite;
    use axum::BoxError;

    #[tokio::test]
    async fn fallback_when_no_priority_projects() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        // two plain projects, no priority flag anywhere
        let first = suite.create_project(suite.account(), "house").await?;
        let second = suite.create_project(suite.account(), "garden").await?;
        suite.create_task(suite.account(), &first, "fix the door").await?;
        suite.create_task(suite.account(), &second, "rake leaves").await?;

        let tasks =
            crate::today::eligibility::eligible_tasks(suite.account(), suite.connection()).await?;
        assert_eq!(2, tasks.len());

        Ok(())
    }

    #[tokio::test]
    async fn priority_projects_narrow_the_scope() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        let plain = suite.create_project(suite.account(), "someday").await?;
        let priority = suite
            .create_priority_project(suite.account(), "launch")
            .await?;
        suite.create_task(suite.account(), &plain, "tidy up").await?;
        let wanted = suite
            .create_task(suite.account(), &priority, "ship the release")
            .await?;

        let tasks =
            crate::today::eligibility::eligible_tasks(suite.account(), suite.connection()).await?;
        assert_eq!(1, tasks.len());
        assert_eq!(wanted.id(), tasks[0].id());

        Ok(())
    }

    #[tokio::test]
    async fn done_and_archived_are_excluded() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        let project = suite.create_project(suite.account(), "house").await?;
        let done = suite.create_task(suite.account(), &project, "done already").await?;
        WriteTask::from(suite.connection())
            .set_target(Some(&done))
            .set_status(Some(TaskStatus::Done))
            .to_owned()
            .await?;
        suite.create_task(suite.account(), &project, "still open").await?;

        let archived = suite.create_project(suite.account(), "old").await?;
        suite
            .create_task(suite.account(), &archived, "forgotten")
            .await?;
        crate::database::definitions::project::WriteProject::from(suite.connection())
            .set_target(Some(&archived))
            .set_is_archived(Some(true))
            .to_owned()
            .await?;

        let tasks =
            crate::today::eligibility::eligible_tasks(suite.account(), suite.connection()).await?;
        assert_eq!(1, tasks.len());
        assert_eq!("still open", tasks[0].name());

        Ok(())
    }
}
