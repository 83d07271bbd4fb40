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
use chrono::{DateTime, Local, NaiveTime};
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// A fixed local fire time with a 24h re-arm. The job bodies themselves are
/// idempotent, so a process restart near the boundary cannot do damage
/// beyond running them a second time.
#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn midnight() -> Self {
        Self { at: NaiveTime::MIN }
    }

    /// delay from `now` until the next occurrence of the fire time
    pub fn initial_delay(&self, now: DateTime<Local>) -> Duration {
        let mut fire = now.date_naive().and_time(self.at);
        if fire <= now.naive_local() {
            fire = fire + chrono::Duration::days(1);
        }

        (fire - now.naive_local()).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Spawns the singleton rollover loop. It aligns itself with the next local
/// midnight, runs the daily rollover and re-arms with a fixed 24h repeat
/// until the shutdown signal arrives.
pub fn spawn_rollover(connection: DatabaseConnection, receiver: kanal::AsyncReceiver<()>) {
    let schedule = DailySchedule::midnight();

    tokio::spawn(async move {
        let mut delay = schedule.initial_delay(Local::now());
        info!("Scheduled the daily rollover in {:?}", delay);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let today = Local::now().date_naive();
                    match crate::today::rollover(today, &connection).await {
                        Ok(()) => {},
                        Err(error) => error!("Error occurred during the daily rollover: {}", error),
                    }

                    delay = DAY;
                },
                _ = receiver.recv() => {
                    warn!("Received shutdown signal on kanal receiver");
                    break;
                }
            }
        }

        Ok::<(), ApplicationError>(())
    });
}
