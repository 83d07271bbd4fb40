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

use crate::database::definitions::task::{Task, TaskStatus};
use crate::prelude::*;
use chrono::NaiveDate;

/// Brings completed recurring tasks back to todo on the days their schedule
/// names.
///
/// Only tasks completed strictly before `as_of` qualify, so a task finished
/// today stays done until tomorrow and a second run on the same day finds
/// nothing left to reset. `last_completed` is never touched here; it keeps
/// recording the most recent real completion.
#[instrument(skip(connection))]
pub async fn reset_recurring_tasks(as_of: NaiveDate, connection: &DatabaseConnection) -> Result<()> {
    let due = sql_span!(connection
        .query("SELECT * FROM task WHERE recurring = true AND status = $done AND last_completed != NONE AND last_completed < $day")
        .bind(("done", TaskStatus::Done))
        .bind(("day", as_of))
        .await?
        .take::<Vec<Task>>(0)?);

    for task in due {
        // a schedule that excludes today leaves the task done until a
        // qualifying day comes around
        if !task.recurs_on(as_of) {
            continue;
        }

        match reset(&task, connection).await {
            Ok(()) => {}
            Err(error) => {
                // one broken task must not stall the sweep
                error!("Error while resetting task {}: {}", task.id(), error);
            }
        }
    }

    Ok(())
}

async fn reset(task: &Task, connection: &DatabaseConnection) -> Result<()> {
    sql_span!(connection
        .query("UPDATE $task SET status = $todo, completed_at = NONE")
        .bind(("task", task.id().to_thing()))
        .bind(("todo", TaskStatus::Todo))
        .await?
        .check()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::task::{Task, TaskStatus, Weekday, WriteTask};
    use crate::tests::TestSuite;
    use crate::today::recurrence::reset_recurring_tasks;
    use axum::BoxError;
    use chrono::{Datelike, Duration, Local, NaiveDate};

    async fn completed_recurring(
        suite: &TestSuite,
        days: Vec<Weekday>,
        last_completed: NaiveDate,
    ) -> Result<Task, BoxError> {
        let project = suite.create_project(suite.account(), "habits").await?;
        let task = WriteTask::from(suite.connection())
            .set_name(Some("exercise".to_owned()))
            .set_project(Some(project.id().clone()))
            .set_author(Some(suite.account().id().clone()))
            .set_recurring(Some(true))
            .set_recurring_days(Some(days))
            .set_status(Some(TaskStatus::Done))
            .to_owned()
            .await?;

        // backdate the completion
        let _: Option<Task> = suite
            .connection()
            .update(task.id().to_thing())
            .merge(&serde_json::json!({ "last_completed": last_completed }))
            .await?;

        Task::fetch(task.id(), suite.connection())
            .await?
            .ok_or_else(|| "task vanished".into())
    }

    #[tokio::test]
    async fn reset_is_idempotent() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let today = Local::now().date_naive();
        let task = completed_recurring(&suite, Vec::new(), today - Duration::days(1)).await?;

        reset_recurring_tasks(today, suite.connection()).await?;
        let reset = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(&TaskStatus::Todo, reset.status());
        assert!(reset.completed_at().is_none());
        // the completion history survives the reset
        assert_eq!(task.last_completed(), reset.last_completed());

        // the second run of the day finds nothing to do
        reset_recurring_tasks(today, suite.connection()).await?;
        let unchanged = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(reset, unchanged);

        Ok(())
    }

    #[tokio::test]
    async fn completed_today_is_not_reset() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let today = Local::now().date_naive();
        let task = completed_recurring(&suite, Vec::new(), today).await?;

        reset_recurring_tasks(today, suite.connection()).await?;
        let unchanged = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(&TaskStatus::Done, unchanged.status());

        Ok(())
    }

    #[tokio::test]
    async fn schedule_gates_the_weekday() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        // completed on a monday, scheduled for mondays only
        let monday = NaiveDate::from_ymd_opt(2023, 10, 2).unwrap();
        assert_eq!(chrono::Weekday::Mon, monday.weekday());
        let task = completed_recurring(&suite, vec![Weekday::Monday], monday).await?;

        // tuesday passes the task over
        reset_recurring_tasks(monday + Duration::days(1), suite.connection()).await?;
        let unchanged = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(&TaskStatus::Done, unchanged.status());

        // the following monday resets it
        reset_recurring_tasks(monday + Duration::days(7), suite.connection()).await?;
        let reset = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(&TaskStatus::Todo, reset.status());

        Ok(())
    }

    #[tokio::test]
    async fn non_recurring_tasks_are_left_alone() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let project = suite.create_project(suite.account(), "inbox").await?;
        let task = suite.create_task(suite.account(), &project, "one-off").await?;
        let task = WriteTask::from(suite.connection())
            .set_target(Some(&task))
            .set_status(Some(TaskStatus::Done))
            .to_owned()
            .await?;

        reset_recurring_tasks(
            Local::now().date_naive() + Duration::days(1),
            suite.connection(),
        )
        .await?;
        let unchanged = Task::fetch(task.id(), suite.connection()).await?.unwrap();
        assert_eq!(&TaskStatus::Done, unchanged.status());

        Ok(())
    }
}
