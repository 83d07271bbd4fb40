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

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub mod definitions;
pub mod id;

pub type DatabaseConnection = Surreal<Client>;

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection: DatabaseConnection,
    pub database: String,
    pub namespace: String,
}

pub async fn connect(options: Option<(&str, &str)>) -> Result<ConnectionInfo> {
    // establish the connection
    let client: Surreal<Client> = Surreal::new::<Ws>(&CONFIGURATION.surrealdb_endpoint).await?;
    info!("Established connection to surrealdb");

    // authenticate
    client
        .signin(Root {
            username: CONFIGURATION.surrealdb_username.as_str(),
            password: CONFIGURATION.surrealdb_password.as_str(),
        })
        .await?;
    info!("Authenticated with surrealdb");

    // use namespace and database
    cfg_if::cfg_if! {
        if #[cfg(test)] {
            let (namespace, database) = if let Some(options) = options {
                (options.0.to_string(), options.1.to_string())
            } else {
                ("test".to_owned(), nanoid::nanoid!())
            };

            println!(
                "Connected with database {:?} in namespace {:?}",
                database, namespace
            );
        } else {
            let _ = options;
            let namespace = "production".to_owned();
            let database = "sixfold".to_owned();
        }
    }

    client
        .use_ns(namespace.as_str())
        .use_db(database.as_str())
        .await?;

    // execute the up queries
    client
        .query(include_str!("./up.surrealql"))
        .await?
        .check()?;
    info!("Initiated tables");

    Ok(ConnectionInfo {
        database,
        namespace,
        connection: client,
    })
}

#[macro_export]
macro_rules! sql_span {
    ($expr: expr) => {{
        let span = info_span!("Surrealdb Request");
        let _ = span.enter();
        $expr
    }};
    ($expr: expr, $title: expr) => {{
        let span = info_span!(concat!("Surrealdb Request: ", $title));
        let _ = span.enter();
        $expr
    }};
}
