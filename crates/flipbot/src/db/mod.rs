// Flipbot
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub mod entities;
pub mod flip;
pub mod guild_settings;
pub mod migration;
pub mod user_profit;

use flipbot_common::error::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{error, info};

/// Connects to the datastore and brings its schema up to date.
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::migrate(&db).await?;
    info!("datastore ready");
    Ok(db)
}

/// Checks that the datastore answers. Never fails; the detail carries the
/// error text when it does not.
pub async fn ping(db: &DatabaseConnection) -> (bool, String) {
    match db.ping().await {
        Ok(()) => (true, "OK".to_owned()),
        Err(err) => {
            error!("datastore ping failed: {err}");
            (false, err.to_string())
        }
    }
}
