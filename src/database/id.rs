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

use crate::error::ApplicationError;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use surrealdb::opt::{IntoResource, Resource};
use surrealdb::sql::Thing;

/// record id in the `table:id` form used across the API surface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    pub table: String,
    pub id: String,
}

impl Id {
    pub fn new((table, id): (&str, &str)) -> Self {
        Self {
            table: table.to_string(),
            id: id.to_string(),
        }
    }

    pub fn to_thing(&self) -> Thing {
        Thing::from((self.table.as_str(), self.id.as_str()))
    }
}

impl From<Thing> for Id {
    fn from(thing: Thing) -> Self {
        Self {
            table: thing.tb,
            id: thing.id.to_string(),
        }
    }
}

impl TryFrom<(&str, &str)> for Id {
    type Error = ApplicationError;

    /// parses a raw `table:id` while pinning the table, as route parameters
    /// must not be able to address arbitrary tables
    fn try_from((force, raw): (&str, &str)) -> Result<Self, Self::Error> {
        let (table, id) = raw
            .split_once(':')
            .ok_or_else(|| ApplicationError::BadRequest("invalid id".to_owned()))?;
        if !table.eq(force) {
            return Err(ApplicationError::Unauthorized);
        }

        Ok(Self {
            table: table.to_string(),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", &self.table, &self.id)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value = serde_json::value::Value::deserialize(deserializer)?;

        if let Some(string) = raw_value.as_str() {
            let (table, id) = string
                .split_once(':')
                .ok_or_else(|| serde::de::Error::custom("Invalid id format"))?;

            return Ok(Self {
                table: table.to_string(),
                id: id.to_string(),
            });
        }

        if raw_value.is_object() {
            let thing =
                serde_json::from_value::<Thing>(raw_value).map_err(serde::de::Error::custom)?;
            return Ok(Self::from(thing));
        }

        Err(serde::de::Error::custom("Invalid datatype"))
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl JsonSchema for Id {
    fn schema_name() -> String {
        "Id".to_owned()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("string".to_string()),
            ..Default::default()
        }
        .into()
    }
}

impl<R> IntoResource<Option<R>> for &Id {
    fn into_resource(self) -> surrealdb::Result<Resource> {
        Ok(Resource::RecordId(self.to_thing()))
    }
}
