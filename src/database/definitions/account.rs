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
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct Account {
    id: Id,
    first_name: String,
    last_name: String,
    mail: String,
    password: String,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Account {
    #[instrument(skip(connection))]
    pub async fn from_mail(mail: &str, connection: &DatabaseConnection) -> Result<Option<Account>> {
        let account = sql_span!(connection
            .query("SELECT * FROM account WHERE mail = $mail")
            .bind(("mail", mail))
            .await?
            .take::<Option<Account>>(0)?);

        Ok(account)
    }

    /// compares the given password against the stored argon2 hash
    #[instrument(skip_all)]
    pub fn verify_password(&self, password: &str) -> Result<()> {
        Argon2::default()
            .verify_password(
                password.as_bytes(),
                &PasswordHash::new(self.password.as_str())?,
            )
            .map_err(|_| ApplicationError::Unauthorized)
    }
}

#[derive(Clone, Debug, Serialize, Getters, Setters)]
pub struct WriteAccount<'a> {
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    mail: Option<&'a str>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    connection: &'a DatabaseConnection,
    #[serde(skip)]
    #[set = "pub"]
    target: Option<&'a Account>,
}

impl<'a> From<&'a DatabaseConnection> for WriteAccount<'a> {
    fn from(connection: &'a DatabaseConnection) -> Self {
        Self {
            first_name: None,
            last_name: None,
            mail: None,
            password: None,
            updated_at: None,
            connection,
            target: None,
        }
    }
}

impl<'a> IntoFuture for WriteAccount<'a> {
    type Output = Result<Account>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    #[instrument(skip_all)]
    fn into_future(mut self) -> Self::IntoFuture {
        Box::pin(async move {
            // replace a raw password with its argon2 hash before anything is persisted
            if let Some(password) = self.password.take() {
                self.password = Some(
                    Argon2::default()
                        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
                        .to_string(),
                );
            }

            let now = Utc::now();

            let account: Account = match self.target {
                Some(target) => {
                    self.updated_at = Some(now);
                    sql_span!(self
                        .connection
                        .update(target.id().to_thing())
                        .merge(&self)
                        .await?)
                    .ok_or_else(|| ApplicationError::NotFound("account".to_owned()))?
                }
                None => {
                    let content = json!({
                        "first_name": self.first_name.ok_or_else(|| ApplicationError::BadRequest("an account requires a first name".to_owned()))?,
                        "last_name": self.last_name.ok_or_else(|| ApplicationError::BadRequest("an account requires a last name".to_owned()))?,
                        "mail": self.mail.ok_or_else(|| ApplicationError::BadRequest("an account requires a mail address".to_owned()))?,
                        "password": self.password.ok_or_else(|| ApplicationError::BadRequest("an account requires a password".to_owned()))?,
                        "updated_at": now,
                        "created_at": now,
                    });
                    let accounts: Vec<Account> = sql_span!(self
                        .connection
                        .create("account")
                        .content(&content)
                        .await?);

                    accounts
                        .into_iter()
                        .next()
                        .ok_or(ApplicationError::InternalServerError)?
                }
            };

            Ok(account)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::account::WriteAccount;
    use axum::BoxError;

    #[tokio::test]
    async fn test_write() -> Result<(), BoxError> {
        let connection = crate::database::connect(None).await?.connection;

        let account = WriteAccount::from(&connection)
            .set_first_name(Some("first name"))
            .set_last_name(Some("last name"))
            .set_mail(Some("test@test.de"))
            .set_password(Some("password".to_owned()))
            .to_owned()
            .await?;

        assert_eq!(account.first_name(), "first name");
        assert_eq!(account.last_name(), "last name");
        assert_eq!(account.mail(), "test@test.de");
        assert_ne!(account.password(), "password");
        assert!(account.verify_password("password").is_ok());
        assert!(account.verify_password("different").is_err());

        Ok(())
    }
}
