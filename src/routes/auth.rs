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

use crate::auth::session::Session;
use crate::auth::Authenticate;
use crate::database::definitions::account::{Account, WriteAccount};
use crate::error::ApplicationErrorResponse;
use crate::prelude::*;
use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

pub fn router(state: ApplicationState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/signup", post_with(signup, signup_docs))
        .api_route("/login", post_with(login, login_docs))
        .api_route(
            "/logout",
            post_with(logout, logout_docs).layer(crate::require_session!(state)),
        )
        .with_state(state)
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    first_name: String,
    last_name: String,
    mail: String,
    password: String,
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct LoginRequest {
    mail: String,
    password: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session: Session,
}

fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build("session_id", session.id.to_string())
        .path("/")
        .same_site(SameSite::Strict)
        .http_only(true)
        .finish()
}

async fn signup(
    State(state): State<ApplicationState>,
    jar: CookieJar,
    Json(data): Json<SignupRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let account = WriteAccount::from(state.connection())
        .set_first_name(Some(data.first_name.as_str()))
        .set_last_name(Some(data.last_name.as_str()))
        .set_mail(Some(data.mail.as_str()))
        .set_password(Some(data.password.clone()))
        .to_owned()
        .await?;

    let session = account.start_session(state.connection()).await?;
    let cookie = session_cookie(&session);

    Ok((jar.add(cookie), Json(LoginResponse { session })))
}

fn signup_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Create a new account and start a session for it")
        .summary("Sign up")
        .response::<200, Json<LoginResponse>>()
}

async fn login(
    State(state): State<ApplicationState>,
    jar: CookieJar,
    Json(data): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    match Account::from_mail(data.mail.as_str(), state.connection()).await? {
        Some(account) => {
            account.login(data.password.as_str())?;

            let session = account.start_session(state.connection()).await?;
            let cookie = session_cookie(&session);

            Ok((jar.add(cookie), Json(LoginResponse { session })))
        }
        None => Err(ApplicationError::Unauthorized),
    }
}

async fn logout(
    State(state): State<ApplicationState>,
    jar: CookieJar,
    axum::Extension(account): axum::Extension<Account>,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    account.logout(state.connection()).await?;

    Ok((
        jar.remove(Cookie::named("session_id")),
        Json(json!({ "ok": true })),
    ))
}

fn logout_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("End every session of the account")
        .summary("Log out")
}

fn login_docs(transform: TransformOperation) -> TransformOperation {
    transform
        .description("Start a new session in order to authenticate further requests")
        .summary("Log in")
        .response_with::<200, Json<LoginResponse>, _>(|transform| {
            transform.description("Login succeeded")
        })
        .response_with::<401, Json<ApplicationErrorResponse>, _>(|transform| {
            transform.description("Invalid credentials")
        })
}

#[cfg(test)]
mod tests {
    use crate::routes::auth::LoginResponse;
    use crate::tests::TestSuite;
    use axum::http::StatusCode;
    use axum::BoxError;

    #[tokio::test]
    async fn test_signup_and_login() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        let response = suite
            .client()
            .post("/auth/signup")
            .json(&json!({
                "firstName": "first",
                "lastName": "last",
                "mail": "signup@test.de",
                "password": "password"
            }))
            .send()
            .await;
        assert_eq!(StatusCode::OK, response.status());

        let response = suite
            .client()
            .post("/auth/login")
            .json(&json!({
                "mail": "signup@test.de",
                "password": "password"
            }))
            .send()
            .await;
        assert_eq!(StatusCode::OK, response.status());
        let login = response.json::<LoginResponse>().await;
        assert_eq!("session", login.session.id.table.as_str());

        let response = suite
            .client()
            .post("/auth/login")
            .json(&json!({
                "mail": "signup@test.de",
                "password": "wrong"
            }))
            .send()
            .await;
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());

        Ok(())
    }

    #[tokio::test]
    async fn test_routes_require_a_session() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;

        let response = suite.client().get("/today").send().await;
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());

        suite.authorize_default().await;
        let response = suite.client().get("/today").send().await;
        assert_eq!(StatusCode::OK, response.status());

        Ok(())
    }
}
