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
use crate::database::definitions::task::Task;
use crate::prelude::*;
use crate::today::MAX_DAILY_TASKS;
use chrono::NaiveDate;
use std::time::Duration;

const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The external suggestion source, best effort and free to fail. Everything
/// it returns passes through [`parse_recommendation`] before anyone gets to
/// see it.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-style chat completion endpoint as the suggestion source
pub struct HttpSuggestionSource {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpSuggestionSource {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }

    pub fn from_configuration() -> Self {
        Self::new(
            CONFIGURATION.suggestion_endpoint.clone(),
            CONFIGURATION.suggestion_api_key.clone(),
            CONFIGURATION.suggestion_model.clone(),
        )
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
    #[instrument(skip_all)]
    async fn suggest(&self, prompt: &str) -> Result<String> {
        // a timeout counts as an upstream failure like any other
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(SUGGESTION_TIMEOUT)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await
            .map_err(|error| ApplicationError::Upstream(error.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|error| ApplicationError::Upstream(error.to_string()))?;

        body.pointer("/choices/0/message/content")
            .and_then(|content| content.as_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                ApplicationError::Upstream("response carried no message content".to_owned())
            })
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub task_ids: Vec<String>,
    pub rationale: String,
}

/// never more suggestions than eligible tasks, and never more than six
pub fn recommendation_bound(eligible: usize) -> usize {
    eligible.min(MAX_DAILY_TASKS)
}

fn build_prompt(tasks: &[Task], access: &AccessibleProjects, as_of: NaiveDate) -> String {
    let lines: Vec<String> = tasks
        .iter()
        .map(|task| {
            let project = access
                .get(task.project())
                .map(|project| project.name().as_str())
                .unwrap_or("unknown");

            json!({
                "id": task.id(),
                "name": task.name(),
                "description": task.description(),
                "project": project,
                "priority": task.priority(),
                "due": task.due(),
                "estimatedMinutes": task.estimated_minutes(),
                "recurringToday": task.recurs_on(as_of),
            })
            .to_string()
        })
        .collect();

    format!(
        "Pick the tasks a user should focus on today, following the Sacred Six method. \
         Prefer urgent, high-priority and recurring work. Reply with a JSON array holding \
         at most {} of the task ids below, optionally followed by a one-line reasoning.\n\n{}",
        recommendation_bound(tasks.len()),
        lines.join("\n")
    )
}

/// Strict boundary validation of the freeform response: locate the id array,
/// parse it, enforce the bound. Anything else is an upstream failure, and the
/// caller gets that failure instead of a truncated or invented list.
pub fn parse_recommendation(text: &str, bound: usize) -> Result<Recommendation> {
    let start = text.find('[').ok_or_else(|| {
        ApplicationError::Upstream("response contained no task id array".to_owned())
    })?;
    let end = text.rfind(']').filter(|end| *end > start).ok_or_else(|| {
        ApplicationError::Upstream("response contained no task id array".to_owned())
    })?;

    let task_ids: Vec<String> = serde_json::from_str(&text[start..=end]).map_err(|error| {
        ApplicationError::Upstream(format!("response array did not parse: {error}"))
    })?;

    if task_ids.len() > bound {
        return Err(ApplicationError::Upstream(format!(
            "response suggested {} tasks where at most {bound} are allowed",
            task_ids.len()
        )));
    }

    let rationale = format!("{} {}", text[..start].trim(), text[end + 1..].trim())
        .trim()
        .to_owned();

    Ok(Recommendation {
        task_ids,
        rationale,
    })
}

/// Asks the suggestion source for a today-set over the account's eligible
/// tasks. Never mutates the selection itself; the returned ids go through the
/// regular selection path with its own authorization and cap.
#[instrument(skip_all, fields(account = %account.id()))]
pub async fn recommend(
    account: &Account,
    as_of: NaiveDate,
    source: &dyn SuggestionSource,
    connection: &DatabaseConnection,
) -> Result<Recommendation> {
    let access = AccessibleProjects::resolve(account.id(), connection).await?;
    let eligible =
        super::eligibility::eligible_in_scope(&access.eligible_scope(), connection).await?;

    if eligible.is_empty() {
        return Ok(Recommendation {
            task_ids: Vec::new(),
            rationale: "there are no eligible tasks to pick from".to_owned(),
        });
    }

    let prompt = build_prompt(&eligible, &access, as_of);
    let text = source.suggest(prompt.as_str()).await?;

    parse_recommendation(text.as_str(), recommendation_bound(eligible.len()))
}
