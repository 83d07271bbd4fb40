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
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;

/// an owner may flag at most this many projects as priority
pub const MAX_PRIORITY_PROJECTS: u64 = 6;

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
    Admin,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Collaborator {
    account: Id,
    role: CollaboratorRole,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Project {
    id: Id,
    name: String,
    owner: Id,
    collaborators: Vec<Collaborator>,
    is_archived: bool,
    is_priority: bool,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Project {
    pub async fn fetch(id: &Id, connection: &DatabaseConnection) -> Result<Option<Project>> {
        Ok(sql_span!(connection.select(id).await?))
    }

    pub fn is_owner(&self, account: &Id) -> bool {
        self.owner.eq(account)
    }

    pub fn role_of(&self, account: &Id) -> Option<CollaboratorRole> {
        self.collaborators
            .iter()
            .find(|collaborator| collaborator.account.eq(account))
            .map(|collaborator| collaborator.role)
    }

    /// owner or collaborator of any role
    pub fn is_member(&self, account: &Id) -> bool {
        self.is_owner(account) || self.role_of(account).is_some()
    }

    /// owner or collaborator with the editor or admin role
    pub fn can_edit(&self, account: &Id) -> bool {
        self.is_owner(account)
            || matches!(
                self.role_of(account),
                Some(CollaboratorRole::Editor | CollaboratorRole::Admin)
            )
    }

    #[instrument(skip(connection))]
    pub async fn add_collaborator(
        &self,
        account: &Id,
        role: CollaboratorRole,
        connection: &DatabaseConnection,
    ) -> Result<Project> {
        // a re-added collaborator gets the new role instead of a second entry
        let mut response = sql_span!(connection
            .query("UPDATE $project SET collaborators = array::concat(collaborators[WHERE account != $account], [$collaborator]), updated_at = $now")
            .bind(("project", self.id.to_thing()))
            .bind(("account", account))
            .bind((
                "collaborator",
                json!({ "account": account, "role": role })
            ))
            .bind(("now", Utc::now()))
            .await?
            .check()?);

        response
            .take::<Vec<Project>>(0)?
            .into_iter()
            .next()
            .ok_or_else(|| ApplicationError::NotFound("project".to_owned()))
    }

    /// cascade: the project's tasks go with it
    #[instrument(skip(connection))]
    pub async fn delete(&self, connection: &DatabaseConnection) -> Result<()> {
        sql_span!(connection
            .query("DELETE task WHERE project = $project")
            .query("DELETE $id")
            .bind(("project", &self.id))
            .bind(("id", self.id.to_thing()))
            .await?
            .check()?);

        Ok(())
    }
}

/// every project the account may act on, resolved once per request.
/// archived projects are excluded here already.
#[derive(Serialize, JsonSchema, Debug, Clone, Getters)]
#[get = "pub"]
pub struct AccessibleProjects {
    owned: Vec<Project>,
    shared: Vec<Project>,
}

impl AccessibleProjects {
    #[instrument(skip(connection))]
    pub async fn resolve(account: &Id, connection: &DatabaseConnection) -> Result<Self> {
        let mut response = sql_span!(connection
            .query("SELECT * FROM project WHERE is_archived = false AND owner = $account")
            .query("SELECT * FROM project WHERE is_archived = false AND owner != $account AND $account INSIDE collaborators.account")
            .bind(("account", account))
            .await?
            .check()?);

        let owned = response.take::<Vec<Project>>(0)?;
        let shared = response.take::<Vec<Project>>(1)?;

        Ok(Self { owned, shared })
    }

    pub fn all(&self) -> impl Iterator<Item = &Project> {
        self.owned.iter().chain(self.shared.iter())
    }

    pub fn get(&self, id: &Id) -> Option<&Project> {
        self.all().find(|project| project.id().eq(id))
    }

    pub fn ids(&self) -> Vec<Id> {
        self.all().map(|project| project.id().clone()).collect()
    }

    /// the project scope tasks may be picked from: the priority subset when at
    /// least one priority project is accessible, otherwise every active
    /// accessible project. The widening is deliberate and load-bearing: a user
    /// without priority projects must still see selectable tasks.
    pub fn eligible_scope(&self) -> Vec<Id> {
        let priority: Vec<Id> = self
            .all()
            .filter(|project| *project.is_priority())
            .map(|project| project.id().clone())
            .collect();

        if priority.is_empty() {
            self.ids()
        } else {
            priority
        }
    }
}

#[derive(Clone, Debug, Serialize, Getters, Setters)]
pub struct WriteProject<'a> {
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    is_archived: Option<bool>,
    #[get = "pub"]
    #[set = "pub"]
    #[serde(skip_serializing_if = "Option::is_none")]
    is_priority: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    #[set = "pub"]
    owner: Option<Id>,
    #[serde(skip)]
    connection: &'a DatabaseConnection,
    #[serde(skip)]
    #[set = "pub"]
    target: Option<&'a Project>,
}

impl<'a> From<&'a DatabaseConnection> for WriteProject<'a> {
    fn from(connection: &'a DatabaseConnection) -> Self {
        Self {
            name: None,
            is_archived: None,
            is_priority: None,
            updated_at: None,
            owner: None,
            connection,
            target: None,
        }
    }
}

impl<'a> WriteProject<'a> {
    /// counts the owner's priority projects; flagging beyond the cap fails
    async fn assert_priority_capacity(&self, owner: &Id) -> Result<()> {
        let count = sql_span!(self
            .connection
            .query("SELECT * FROM count((SELECT id FROM project WHERE owner = $owner AND is_priority = true))")
            .bind(("owner", owner))
            .await?
            .take::<Option<u64>>(0)?)
        .unwrap_or(0);

        if count >= MAX_PRIORITY_PROJECTS {
            return Err(ApplicationError::BadRequest(
                "too many priority projects".to_owned(),
            ));
        }

        Ok(())
    }
}

impl<'a> IntoFuture for WriteProject<'a> {
    type Output = Result<Project>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + Sync + 'a>>;

    #[instrument(skip_all)]
    fn into_future(mut self) -> Self::IntoFuture {
        Box::pin(async move {
            let now = Utc::now();

            match self.target {
                Some(target) => {
                    if self.is_priority == Some(true) && !target.is_priority() {
                        self.assert_priority_capacity(target.owner()).await?;
                    }

                    self.updated_at = Some(now);
                    let project: Option<Project> = sql_span!(self
                        .connection
                        .update(target.id().to_thing())
                        .merge(&self)
                        .await?);

                    project.ok_or_else(|| ApplicationError::NotFound("project".to_owned()))
                }
                None => {
                    let owner = self.owner.clone().ok_or_else(|| {
                        ApplicationError::BadRequest("a project requires an owner".to_owned())
                    })?;

                    if self.is_priority == Some(true) {
                        self.assert_priority_capacity(&owner).await?;
                    }

                    let content = json!({
                        "name": self.name.clone().ok_or_else(|| ApplicationError::BadRequest("a project requires a name".to_owned()))?,
                        "owner": owner,
                        "collaborators": [],
                        "is_archived": self.is_archived.unwrap_or(false),
                        "is_priority": self.is_priority.unwrap_or(false),
                        "updated_at": now,
                        "created_at": now,
                    });
                    let projects: Vec<Project> = sql_span!(self
                        .connection
                        .create("project")
                        .content(&content)
                        .await?);

                    projects
                        .into_iter()
                        .next()
                        .ok_or(ApplicationError::InternalServerError)
                }
            }
        })
    }
}
