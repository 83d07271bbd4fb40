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

//! The daily focus core: which tasks are eligible for today, the bounded
//! today-selection, recurring-task resets and the per-day completion
//! statistics derived from them.

use crate::prelude::*;
use chrono::NaiveDate;

pub mod eligibility;
pub mod recurrence;
pub mod selection;
pub mod stats;
pub mod suggest;

/// a user focuses on at most six tasks per day
pub const MAX_DAILY_TASKS: usize = 6;

/// The daily rollover, run once per calendar day at local midnight.
///
/// Ordering is deliberate: the completion snapshot for the previous day has
/// to observe the selection state before any recurring task flips back to
/// todo, so the snapshot always runs first.
#[instrument(skip(connection))]
pub async fn rollover(as_of: NaiveDate, connection: &DatabaseConnection) -> Result<()> {
    stats::snapshot_yesterday(as_of, connection).await?;
    recurrence::reset_recurring_tasks(as_of, connection).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::daily_completion::DailyCompletion;
    use crate::database::definitions::task::{TaskStatus, WriteTask};
    use crate::tests::TestSuite;
    use axum::BoxError;
    use chrono::{Duration, Local};

    #[tokio::test]
    async fn rollover_snapshots_before_reset() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let project = suite.create_project(suite.account(), "focus").await?;

        // a recurring task, selected and completed "yesterday"
        let task = WriteTask::from(suite.connection())
            .set_name(Some("meditate".to_owned()))
            .set_project(Some(project.id().clone()))
            .set_author(Some(suite.account().id().clone()))
            .set_recurring(Some(true))
            .set_selected_for_today(Some(true))
            .set_status(Some(TaskStatus::Done))
            .to_owned()
            .await?;

        let yesterday = Local::now().date_naive() - Duration::days(1);
        let _: Option<crate::database::definitions::task::Task> = suite
            .connection()
            .update(task.id().to_thing())
            .merge(&serde_json::json!({ "last_completed": yesterday }))
            .await?;

        let today = Local::now().date_naive();
        crate::today::rollover(today, suite.connection()).await?;

        // the snapshot saw the task while it was still done...
        let records =
            DailyCompletion::for_account(suite.account().id(), suite.connection()).await?;
        assert_eq!(1, records.len());
        assert_eq!(&yesterday, records[0].day());
        assert_eq!(1, *records[0].tasks_completed());
        assert!(records[0].fully_completed());

        // ...and the reset flipped it back afterwards
        let task = crate::database::definitions::task::Task::fetch(task.id(), suite.connection())
            .await?
            .unwrap();
        assert_eq!(&TaskStatus::Todo, task.status());

        Ok(())
    }
}
