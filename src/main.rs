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

#[macro_use]
extern crate serde;
#[macro_use]
extern crate thiserror;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate tracing;
#[macro_use]
extern crate serde_json;

use crate::today::suggest::HttpSuggestionSource;
use lazy_static::lazy_static;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod auth;
mod database;
mod error;
mod routes;
mod scheduler;
mod state;
#[cfg(test)]
mod tests;
mod today;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    surrealdb_endpoint: String,
    surrealdb_username: String,
    surrealdb_password: String,
    #[serde(default = "default_suggestion_endpoint")]
    suggestion_endpoint: String,
    #[serde(default)]
    suggestion_api_key: String,
    #[serde(default = "default_suggestion_model")]
    suggestion_model: String,
}

fn default_suggestion_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_owned()
}

fn default_suggestion_model() -> String {
    "gpt-4o-mini".to_owned()
}

lazy_static! {
    pub static ref CONFIGURATION: Config = envy::from_env::<Config>().unwrap();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    lazy_static::initialize(&CONFIGURATION);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (scheduler_sender, scheduler_receiver) = kanal::unbounded_async::<()>();
    let (axum_sender, axum_receiver) = kanal::unbounded_async::<()>();

    let info = database::connect(None).await?;

    // nightly rollover: snapshot yesterday's completion state, then reset recurring tasks
    scheduler::spawn_rollover(info.connection.clone(), scheduler_receiver);

    let state = state::ApplicationState::new(
        info,
        Arc::new(HttpSuggestionSource::from_configuration()),
    );

    tokio::spawn(async move {
        let router = routes::router(state);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 8000));

        axum::Server::bind(&addr)
            .serve(router.into_make_service())
            .with_graceful_shutdown(async {
                axum_receiver.recv().await.ok();
            })
            .await
            .unwrap();

        Ok::<(), error::ApplicationError>(())
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        Err(error) => {
            error!("Unable to listen for shutdown signal: {}", error);
        }
    }

    info!("Received shutdown signal... Shutting down...");
    // shutdown
    scheduler_sender.send(()).await?;
    axum_sender.send(()).await?;

    Ok(())
}

pub mod prelude {
    pub use crate::database::id::Id;
    pub use crate::database::{ConnectionInfo, DatabaseConnection};
    pub use crate::error::*;
    pub use crate::sql_span;
    pub use crate::state::ApplicationState;
    pub use crate::CONFIGURATION;
    pub use axum::{async_trait, Json};
    pub use schemars::JsonSchema;
}
