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
use crate::database::definitions::daily_completion::DailyCompletion;
use crate::database::definitions::task::Task;
use crate::error::ApplicationErrorResponse;
use crate::prelude::*;
use crate::require_session;
use crate::today::stats::CompletionStats;
use crate::today::suggest::Recommendation;
use crate::today::{eligibility, selection, stats, suggest};
use aide::axum::routing::{get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::Extension;
use chrono::Local;

pub fn router(state: ApplicationState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/",
            get_with(get_today, get_today_docs).layer(require_session!(state)),
        )
        .api_route(
            "/selection",
            put_with(put_selection, put_selection_docs).layer(require_session!(state)),
        )
        .api_route(
            "/recommendation",
            post_with(post_recommendation, post_recommendation_docs)
                .layer(require_session!(state)),
        )
        .api_route(
            "/completion",
            put_with(put_completion, put_completion_docs).layer(require_session!(state)),
        )
        .api_route(
            "/stats",
            get_with(get_stats, get_stats_docs).layer(require_session!(state)),
        )
        .with_state(state)
}

async fn get_today(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
) -> Result<Json<Vec<Task>>> {
    let tasks = eligibility::eligible_tasks(&account, state.connection()).await?;

    Ok(Json(tasks))
}

fn get_today_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Obtain every task eligible for today's selection")
        .summary("List eligible tasks")
        .response::<200, Json<Vec<Task>>>()
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBody {
    task_ids: Vec<String>,
}

async fn put_selection(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
    Json(data): Json<SelectionBody>,
) -> Result<Json<Vec<Task>>> {
    let request = selection::SelectionRequest::new(data.task_ids)?;
    let today_set = selection::apply(&account, request, state.connection()).await?;

    Ok(Json(today_set))
}

fn put_selection_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description(
            "Replace the daily selection. At most six tasks; unknown or unauthorized ids \
             are skipped silently",
        )
        .summary("Set the daily selection")
        .response::<200, Json<Vec<Task>>>()
        .response_with::<400, Json<ApplicationErrorResponse>, _>(|transform| {
            transform.description("More than six tasks requested")
        })
}

async fn post_recommendation(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
) -> Result<Json<Recommendation>> {
    let recommendation = suggest::recommend(
        &account,
        Local::now().date_naive(),
        state.suggestions().as_ref(),
        state.connection(),
    )
    .await?;

    Ok(Json(recommendation))
}

fn post_recommendation_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description(
            "Ask the suggestion source for a today-set over the eligible tasks. The ids \
             still pass the regular selection authorization and cap when applied",
        )
        .summary("Recommend a daily selection")
        .response::<200, Json<Recommendation>>()
        .response_with::<502, Json<ApplicationErrorResponse>, _>(|transform| {
            transform.description("The suggestion source failed or answered out of contract")
        })
}

async fn put_completion(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
) -> Result<Json<DailyCompletion>> {
    let record = stats::update_today_completion(
        account.id(),
        Local::now().date_naive(),
        state.connection(),
    )
    .await?;

    Ok(Json(record))
}

fn put_completion_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Recompute today's completion record from the current selection")
        .summary("Recompute today's completion")
        .response::<200, Json<DailyCompletion>>()
}

async fn get_stats(
    Extension(account): Extension<Account>,
    State(state): State<ApplicationState>,
) -> Result<Json<CompletionStats>> {
    let stats = stats::completion_stats(account.id(), state.connection()).await?;

    Ok(Json(stats))
}

fn get_stats_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Completion statistics over every recorded day, with a 7-day chart")
        .summary("Completion statistics")
        .response::<200, Json<CompletionStats>>()
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::task::Task;
    use crate::tests::TestSuite;
    use crate::today::suggest::Recommendation;
    use axum::http::StatusCode;
    use axum::BoxError;

    #[tokio::test]
    async fn test_selection_roundtrip() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        suite.authorize_default().await;

        let project = suite.create_project(suite.account(), "focus").await?;
        let task = suite.create_task(suite.account(), &project, "breathe").await?;

        let response = suite
            .client()
            .put("/today/selection")
            .json(&json!({ "taskIds": [task.id().to_string()] }))
            .send()
            .await;
        assert_eq!(StatusCode::OK, response.status());
        let today_set = response.json::<Vec<Task>>().await;
        assert_eq!(1, today_set.len());

        // seven ids violate the cap
        let ids: Vec<String> = (0..7).map(|index| format!("task:{index}")).collect();
        let response = suite
            .client()
            .put("/today/selection")
            .json(&json!({ "taskIds": ids }))
            .send()
            .await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        Ok(())
    }

    #[tokio::test]
    async fn test_recommendation_is_bounded() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        suite.authorize_default().await;

        let project = suite.create_project(suite.account(), "focus").await?;
        let mut ids = Vec::new();
        for index in 0..10 {
            let task = suite
                .create_task(suite.account(), &project, format!("task {index}").as_str())
                .await?;
            ids.push(task.id().to_string());
        }

        // six ids drawn from the eligible tasks pass through untouched
        let answer: Vec<String> = ids[..6].to_vec();
        suite
            .suggestions()
            .set(serde_json::to_string(&answer)?.as_str());
        let response = suite.client().post("/today/recommendation").send().await;
        assert_eq!(StatusCode::OK, response.status());
        let recommendation = response.json::<Recommendation>().await;
        assert_eq!(answer, recommendation.task_ids);

        // seven ids are an upstream contract violation, not a truncation
        suite
            .suggestions()
            .set(serde_json::to_string(&ids[..7].to_vec())?.as_str());
        let response = suite.client().post("/today/recommendation").send().await;
        assert_eq!(StatusCode::BAD_GATEWAY, response.status());

        // so is prose without an id array
        suite.suggestions().set("I cannot help with that.");
        let response = suite.client().post("/today/recommendation").send().await;
        assert_eq!(StatusCode::BAD_GATEWAY, response.status());

        Ok(())
    }

    #[tokio::test]
    async fn test_stats_route() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        suite.authorize_default().await;

        let response = suite.client().put("/today/completion").send().await;
        assert_eq!(StatusCode::OK, response.status());

        let response = suite.client().get("/today/stats").send().await;
        assert_eq!(StatusCode::OK, response.status());

        Ok(())
    }
}
