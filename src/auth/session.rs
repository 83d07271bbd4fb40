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
use chrono::{DateTime, Duration, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;

const ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

// 24h, a daily-focus tool is opened once a day
const SESSION_LENGTH: i64 = 86400;

#[derive(Clone, Debug, Getters, Deserialize, Serialize, JsonSchema)]
pub struct Session {
    pub id: Id,
    #[get = "pub"]
    target: Id,
    #[get = "pub"]
    iat: DateTime<Utc>,
    #[get = "pub"]
    exp: DateTime<Utc>,
}

impl Session {
    /// Check whether a session is valid or not
    #[instrument(skip(connection))]
    pub async fn validate_session(id: &str, connection: &DatabaseConnection) -> Result<Session> {
        let session: Option<Session> =
            sql_span!(connection.select(&Id::try_from(("session", id))?).await?);

        match session {
            Some(session) => {
                if session.is_valid(connection).await.is_ok() {
                    Ok(session)
                } else {
                    Err(ApplicationError::Unauthorized)
                }
            }
            None => Err(ApplicationError::Unauthorized),
        }
    }

    #[instrument(skip_all)]
    pub async fn is_valid(&self, connection: &DatabaseConnection) -> Result<()> {
        if Utc::now() >= self.exp {
            // the session is not anymore valid, so we end it.
            self.end(connection).await?;

            Err(ApplicationError::Unauthorized)
        } else {
            Ok(())
        }
    }

    /// Ends the given session
    #[instrument(skip_all)]
    pub async fn end(&self, connection: &DatabaseConnection) -> Result<()> {
        let _: Option<Session> = sql_span!(connection.delete(&self.id).await?);

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct EndSession<'a> {
    target: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> EndSession<'a> {
    pub fn new(target: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self { target, connection }
    }
}

impl<'a> IntoFuture for EndSession<'a> {
    type Output = Result<()>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            sql_span!(self
                .connection
                .query("DELETE FROM session WHERE target = $target")
                .bind(("target", self.target))
                .await?
                .check()?);

            Ok(())
        })
    }
}

#[derive(Clone, Debug)]
pub struct WriteSession<'a> {
    target: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> WriteSession<'a> {
    pub fn new(target: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self { target, connection }
    }
}

impl<'a> IntoFuture for WriteSession<'a> {
    type Output = Result<Session>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    #[instrument(skip_all)]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let iat = Utc::now();
            let exp = iat + Duration::seconds(SESSION_LENGTH);
            // generate session id
            let id = Id::new(("session", nanoid::nanoid!(64, &ALPHABET).as_str()));

            // end currently active sessions for the target
            EndSession::new(self.target, self.connection).await?;

            let session: Option<Session> = sql_span!(self
                .connection
                .create(id.to_thing())
                .content(&json!({
                    "target": self.target,
                    "iat": iat,
                    "exp": exp,
                }))
                .await?);

            session.ok_or(ApplicationError::InternalServerError)
        })
    }
}
