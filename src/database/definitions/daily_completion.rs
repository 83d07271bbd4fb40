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

use crate::prelude::*;
use chrono::{DateTime, NaiveDate, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;

/// per-(account, day) completion snapshot. The record id is derived from the
/// key, which makes the two writers (on-demand recompute and nightly
/// snapshot) a plain last-write-wins upsert and enforces the one-record-per-
/// day invariant without an index race.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct DailyCompletion {
    id: Id,
    account: Id,
    day: NaiveDate,
    tasks_selected: u64,
    tasks_completed: u64,
    fully_completed: bool,
    updated_at: DateTime<Utc>,
}

impl DailyCompletion {
    /// all records of the account in chronological order
    #[instrument(skip(connection))]
    pub async fn for_account(
        account: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Vec<DailyCompletion>> {
        let records = sql_span!(connection
            .query("SELECT * FROM daily_completion WHERE account = $account ORDER BY day ASC")
            .bind(("account", account))
            .await?
            .take::<Vec<DailyCompletion>>(0)?);

        Ok(records)
    }
}

#[derive(Clone, Debug)]
pub struct WriteDailyCompletion<'a> {
    account: &'a Id,
    day: NaiveDate,
    tasks_selected: u64,
    tasks_completed: u64,
    connection: &'a DatabaseConnection,
}

impl<'a> WriteDailyCompletion<'a> {
    pub fn new(
        account: &'a Id,
        day: NaiveDate,
        tasks_selected: u64,
        tasks_completed: u64,
        connection: &'a DatabaseConnection,
    ) -> Self {
        Self {
            account,
            day,
            tasks_selected,
            tasks_completed,
            connection,
        }
    }

    fn record_id(&self) -> Id {
        Id::new((
            "daily_completion",
            format!("{}_{}", self.account.id, self.day.format("%Y%m%d")).as_str(),
        ))
    }
}

impl<'a> IntoFuture for WriteDailyCompletion<'a> {
    type Output = Result<DailyCompletion>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    #[instrument(skip_all)]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let fully_completed =
                self.tasks_selected > 0 && self.tasks_selected == self.tasks_completed;

            // UPDATE on a fixed record id creates the record when missing
            let record: Option<DailyCompletion> = sql_span!(self
                .connection
                .update(self.record_id().to_thing())
                .content(&json!({
                    "account": self.account,
                    "day": self.day,
                    "tasks_selected": self.tasks_selected,
                    "tasks_completed": self.tasks_completed,
                    "fully_completed": fully_completed,
                    "updated_at": Utc::now(),
                }))
                .await?);

            record.ok_or(ApplicationError::InternalServerError)
        })
    }
}
