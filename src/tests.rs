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

use crate::database::definitions::account::{Account, WriteAccount};
use crate::database::definitions::project::{Project, WriteProject};
use crate::database::definitions::task::{Task, WriteTask};
use crate::prelude::{ApplicationState, ConnectionInfo, DatabaseConnection};
use crate::routes::auth::LoginResponse;
use crate::today::suggest::SuggestionSource;
use axum::{async_trait, BoxError};
use axum_test_helper::TestClient;
use std::sync::{Arc, Mutex};

pub const TEST_MAIL: &str = "test@sixfold.dev";

/// suggestion source double answering with whatever the test sets
#[derive(Default)]
pub struct StaticSuggestionSource {
    response: Mutex<String>,
}

impl StaticSuggestionSource {
    pub fn set(&self, response: &str) {
        *self.response.lock().unwrap() = response.to_owned();
    }
}

#[async_trait]
impl SuggestionSource for StaticSuggestionSource {
    async fn suggest(&self, _prompt: &str) -> crate::error::Result<String> {
        Ok(self.response.lock().unwrap().clone())
    }
}

#[derive(Getters)]
#[get = "pub"]
pub struct TestSuite {
    client: TestClient,
    info: ConnectionInfo,
    account: Account,
    suggestions: Arc<StaticSuggestionSource>,
}

impl TestSuite {
    pub async fn init() -> Result<Self, BoxError> {
        let info = crate::database::connect(None).await?;
        let suggestions = Arc::new(StaticSuggestionSource::default());
        let state = ApplicationState::new(info.clone(), suggestions.clone());
        let client = TestClient::new(crate::routes::router(state));

        let account = WriteAccount::from(&info.connection)
            .set_first_name(Some("first"))
            .set_last_name(Some("last"))
            .set_mail(Some(TEST_MAIL))
            .set_password(Some("password".to_owned()))
            .to_owned()
            .await?;

        Ok(Self {
            client,
            info,
            account,
            suggestions,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.info.connection
    }

    pub async fn authorize_default(&self) -> LoginResponse {
        let response = self
            .client
            .post("/auth/login")
            .json(&json! ({
                "mail": TEST_MAIL,
                "password": "password"
            }))
            .send()
            .await;

        response.json::<LoginResponse>().await
    }

    pub async fn create_account(&self, mail: &str) -> Result<Account, BoxError> {
        let account = WriteAccount::from(self.connection())
            .set_first_name(Some("second"))
            .set_last_name(Some("account"))
            .set_mail(Some(mail))
            .set_password(Some("password".to_owned()))
            .to_owned()
            .await?;

        Ok(account)
    }

    pub async fn create_project(&self, owner: &Account, name: &str) -> Result<Project, BoxError> {
        let project = WriteProject::from(self.connection())
            .set_name(Some(name.to_owned()))
            .set_owner(Some(owner.id().clone()))
            .to_owned()
            .await?;

        Ok(project)
    }

    pub async fn create_priority_project(
        &self,
        owner: &Account,
        name: &str,
    ) -> Result<Project, BoxError> {
        let project = WriteProject::from(self.connection())
            .set_name(Some(name.to_owned()))
            .set_owner(Some(owner.id().clone()))
            .set_is_priority(Some(true))
            .to_owned()
            .await?;

        Ok(project)
    }

    pub async fn create_task(
        &self,
        author: &Account,
        project: &Project,
        name: &str,
    ) -> Result<Task, BoxError> {
        let task = WriteTask::from(self.connection())
            .set_name(Some(name.to_owned()))
            .set_project(Some(project.id().clone()))
            .set_author(Some(author.id().clone()))
            .to_owned()
            .await?;

        Ok(task)
    }
}

pub mod prelude {
    pub use crate::tests::TestSuite;
    pub use crate::tests::TEST_MAIL;
}
