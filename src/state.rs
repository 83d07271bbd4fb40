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

use crate::database::ConnectionInfo;
use crate::prelude::DatabaseConnection;
use crate::today::suggest::SuggestionSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApplicationState {
    info: ConnectionInfo,
    suggestions: Arc<dyn SuggestionSource>,
}

impl ApplicationState {
    pub fn new(info: ConnectionInfo, suggestions: Arc<dyn SuggestionSource>) -> Self {
        Self { info, suggestions }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.info.connection
    }

    pub fn suggestions(&self) -> &Arc<dyn SuggestionSource> {
        &self.suggestions
    }
}
