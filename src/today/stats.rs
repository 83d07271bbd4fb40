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

use crate::database::definitions::daily_completion::{DailyCompletion, WriteDailyCompletion};
use crate::database::definitions::task::{Task, TaskStatus};
use crate::prelude::*;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// selected/completed counts over a set of selected tasks
fn tally(tasks: &[Task]) -> (u64, u64) {
    let selected = tasks.len() as u64;
    let completed = tasks
        .iter()
        .filter(|task| *task.status() == TaskStatus::Done)
        .count() as u64;

    (selected, completed)
}

/// Recomputes the account's completion record for `today` from its currently
/// selected tasks and upserts it.
#[instrument(skip(connection))]
pub async fn update_today_completion(
    account: &Id,
    today: NaiveDate,
    connection: &DatabaseConnection,
) -> Result<DailyCompletion> {
    let tasks = sql_span!(connection
        .query("SELECT * FROM task WHERE author = $account AND selected_for_today = true")
        .bind(("account", account))
        .await?
        .take::<Vec<Task>>(0)?);

    let (selected, completed) = tally(&tasks);

    WriteDailyCompletion::new(account, today, selected, completed, connection).await
}

/// Stamps the current selection state of every user against yesterday's date.
///
/// This is a point-in-time approximation taken right before the recurrence
/// reset, not a historical replay. One failing account does not abort the
/// others.
#[instrument(skip(connection))]
pub async fn snapshot_yesterday(as_of: NaiveDate, connection: &DatabaseConnection) -> Result<()> {
    let yesterday = as_of - Duration::days(1);

    let tasks = sql_span!(connection
        .query("SELECT * FROM task WHERE selected_for_today = true")
        .await?
        .take::<Vec<Task>>(0)?);

    let mut per_account: HashMap<Id, Vec<Task>> = HashMap::new();
    for task in tasks {
        per_account
            .entry(task.author().clone())
            .or_default()
            .push(task);
    }

    for (account, tasks) in per_account {
        let (selected, completed) = tally(&tasks);

        match WriteDailyCompletion::new(&account, yesterday, selected, completed, connection).await
        {
            Ok(_) => {}
            Err(error) => {
                error!("Error while snapshotting completion of {}: {}", account, error);
            }
        }
    }

    Ok(())
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPoint {
    pub day: NaiveDate,
    pub tasks_selected: u64,
    pub tasks_completed: u64,
    /// rounded percentage, 0 when nothing was selected
    pub completion_percentage: u32,
}

#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total_days: u64,
    pub fully_completed_days: u64,
    pub completion_rate: f64,
    pub average_tasks_completed: f64,
    pub last_seven_days: Vec<DayPoint>,
}

impl CompletionStats {
    /// `records` in chronological order, as
    /// [`DailyCompletion::for_account`] returns them
    pub fn from_records(records: &[DailyCompletion]) -> Self {
        let total_days = records.len() as u64;
        let fully_completed_days = records
            .iter()
            .filter(|record| *record.fully_completed())
            .count() as u64;

        let (completion_rate, average_tasks_completed) = if total_days > 0 {
            let completed: u64 = records.iter().map(|record| *record.tasks_completed()).sum();
            (
                fully_completed_days as f64 / total_days as f64 * 100.0,
                completed as f64 / total_days as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let last_seven_days = records
            .iter()
            .rev()
            .take(7)
            .rev()
            .map(|record| DayPoint {
                day: *record.day(),
                tasks_selected: *record.tasks_selected(),
                tasks_completed: *record.tasks_completed(),
                completion_percentage: if *record.tasks_selected() > 0 {
                    (*record.tasks_completed() as f64 / *record.tasks_selected() as f64 * 100.0)
                        .round() as u32
                } else {
                    0
                },
            })
            .collect();

        Self {
            total_days,
            fully_completed_days,
            completion_rate,
            average_tasks_completed,
            last_seven_days,
        }
    }
}

/// historical read over all of the account's completion records
#[instrument(skip(connection))]
pub async fn completion_stats(
    account: &Id,
    connection: &DatabaseConnection,
) -> Result<CompletionStats> {
    let records = DailyCompletion::for_account(account, connection).await?;

    Ok(CompletionStats::from_records(&records))
}
