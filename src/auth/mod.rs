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

use crate::auth::session::{EndSession, Session, WriteSession};
use crate::database::definitions::account::Account;
use crate::prelude::*;

pub mod middleware;
pub mod session;

#[async_trait]
pub trait Authenticate {
    fn login(&self, password: &str) -> Result<()>;
    async fn logout(&self, connection: &DatabaseConnection) -> Result<()>;
    async fn start_session(&self, connection: &DatabaseConnection) -> Result<Session>;
}

#[async_trait]
impl Authenticate for Account {
    #[instrument(skip_all)]
    fn login(&self, password: &str) -> Result<()> {
        self.verify_password(password)
    }

    async fn logout(&self, connection: &DatabaseConnection) -> Result<()> {
        EndSession::new(self.id(), connection).await
    }

    async fn start_session(&self, connection: &DatabaseConnection) -> Result<Session> {
        WriteSession::new(self.id(), connection).await
    }
}
