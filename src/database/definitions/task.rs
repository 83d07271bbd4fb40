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

use crate::database::definitions::project::Project;
use crate::prelude::*;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use strum::{AsRefStr, EnumString};

#[derive(
    Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// the declaration order is the total order of the daily selection: a
/// today-set is sorted ascending, so high-priority tasks come first
#[derive(
    Deserialize,
    Serialize,
    JsonSchema,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

#[derive(
    Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for Weekday {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Task {
    id: Id,
    name: String,
    description: String,
    project: Id,
    author: Id,
    status: TaskStatus,
    priority: TaskPriority,
    #[serde(default)]
    due: Option<NaiveDate>,
    estimated_minutes: u32,
    selected_for_today: bool,
    recurring: bool,
    /// empty means "every day"
    recurring_days: Vec<Weekday>,
    /// day of the most recent completion while recurring; survives resets as
    /// the historical record
    #[serde(default)]
    last_completed: Option<NaiveDate>,
    /// set on every transition into done, cleared when the task leaves done
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Task {
    pub async fn fetch(id: &Id, connection: &DatabaseConnection) -> Result<Option<Task>> {
        Ok(sql_span!(connection.select(id).await?))
    }

    /// whether the recurrence schedule includes the given day
    pub fn recurs_on(&self, day: NaiveDate) -> bool {
        self.recurring
            && (self.recurring_days.is_empty()
                || self.recurring_days.contains(&Weekday::from(day.weekday())))
    }
}

/// the task's author, the project owner and editor/admin collaborators may
/// change a task
pub fn can_edit_task(account: &Id, task: &Task, project: Option<&Project>) -> bool {
    task.author().eq(account) || project.is_some_and(|project| project.can_edit(account))
}

#[derive(Clone, Debug, Serialize, Getters, Setters)]
pub struct WriteTask<'a> {
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<TaskPriority>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<NaiveDate>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_minutes: Option<u32>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_for_today: Option<bool>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring: Option<bool>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring_days: Option<Vec<Weekday>>,
    // double Option so a transition out of done can persist an explicit null
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_completed: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    #[set = "pub"]
    project: Option<Id>,
    #[serde(skip)]
    #[set = "pub"]
    author: Option<Id>,
    #[serde(skip)]
    connection: &'a DatabaseConnection,
    #[serde(skip)]
    #[set = "pub"]
    target: Option<&'a Task>,
}

impl<'a> From<&'a DatabaseConnection> for WriteTask<'a> {
    fn from(connection: &'a DatabaseConnection) -> Self {
        Self {
            name: None,
            description: None,
            status: None,
            priority: None,
            due: None,
            estimated_minutes: None,
            selected_for_today: None,
            recurring: None,
            recurring_days: None,
            completed_at: None,
            last_completed: None,
            updated_at: None,
            project: None,
            author: None,
            connection,
            target: None,
        }
    }
}

impl<'a> IntoFuture for WriteTask<'a> {
    type Output = Result<Task>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    #[instrument(skip_all)]
    fn into_future(mut self) -> Self::IntoFuture {
        Box::pin(async move {
            let now = Utc::now();

            // completion bookkeeping on status transitions: completed_at tracks
            // every transition into done, last_completed only recurring ones
            if let Some(status) = self.status {
                let was_done = self
                    .target
                    .map(|task| *task.status() == TaskStatus::Done)
                    .unwrap_or(false);
                let recurring = self
                    .recurring
                    .or_else(|| self.target.map(|task| *task.recurring()))
                    .unwrap_or(false);

                if status == TaskStatus::Done && !was_done {
                    self.completed_at = Some(Some(now));
                    if recurring {
                        self.last_completed = Some(chrono::Local::now().date_naive());
                    }
                } else if status != TaskStatus::Done && was_done {
                    self.completed_at = Some(None);
                }
            }

            match self.target {
                Some(target) => {
                    self.updated_at = Some(now);
                    let task: Option<Task> = sql_span!(self
                        .connection
                        .update(target.id().to_thing())
                        .merge(&self)
                        .await?);

                    task.ok_or_else(|| ApplicationError::NotFound("task".to_owned()))
                }
                None => {
                    let content = json!({
                        "name": self.name.clone().ok_or_else(|| ApplicationError::BadRequest("a task requires a name".to_owned()))?,
                        "description": self.description.clone().unwrap_or_default(),
                        "project": self.project.clone().ok_or_else(|| ApplicationError::BadRequest("a task requires a project".to_owned()))?,
                        "author": self.author.clone().ok_or_else(|| ApplicationError::BadRequest("a task requires an author".to_owned()))?,
                        "status": self.status.unwrap_or(TaskStatus::Todo),
                        "priority": self.priority.unwrap_or(TaskPriority::Medium),
                        "due": self.due,
                        "estimated_minutes": self.estimated_minutes.unwrap_or(0),
                        "selected_for_today": self.selected_for_today.unwrap_or(false),
                        "recurring": self.recurring.unwrap_or(false),
                        "recurring_days": self.recurring_days.clone().unwrap_or_default(),
                        "last_completed": self.last_completed,
                        "completed_at": self.completed_at.flatten(),
                        "updated_at": now,
                        "created_at": now,
                    });
                    let tasks: Vec<Task> = sql_span!(self
                        .connection
                        .create("task")
                        .content(&content)
                        .await?);

                    tasks
                        .into_iter()
                        .next()
                        .ok_or(ApplicationError::InternalServerError)
                }
            }
        })
    }
}

/// task fields a client may change directly; selection and completion
/// bookkeeping fields are managed by the writer
#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EditTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due: Option<NaiveDate>,
    pub estimated_minutes: Option<u32>,
    pub recurring: Option<bool>,
    pub recurring_days: Option<Vec<Weekday>>,
}

impl EditTask {
    pub fn to_writer<'a>(self, connection: &'a DatabaseConnection) -> WriteTask<'a> {
        let mut writer = WriteTask::from(connection);
        writer
            .set_name(self.name)
            .set_description(self.description)
            .set_status(self.status)
            .set_priority(self.priority)
            .set_due(self.due)
            .set_estimated_minutes(self.estimated_minutes)
            .set_recurring(self.recurring)
            .set_recurring_days(self.recurring_days);

        writer
    }
}
