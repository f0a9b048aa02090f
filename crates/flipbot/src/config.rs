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

use clap::Args;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use flipbot_common::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub const ENV_PREFIX: &str = "FLIPBOT_";
pub const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";

/// Runtime settings, layered from defaults, the TOML file, `FLIPBOT_*`
/// environment variables and finally the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub bind: String,
    pub auth: String,
    pub database_url: String,
    pub discord_token: String,
    pub application_id: Option<i64>,
    pub discord_api_url: Url,
    pub log_dir: Option<PathBuf>,
    pub leaderboard_limit: u64,
    pub sync_commands_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_owned(),
            auth: String::new(),
            database_url: "sqlite://flipbot.sqlite?mode=rwc".to_owned(),
            discord_token: String::new(),
            application_id: None,
            discord_api_url: Url::parse(DEFAULT_DISCORD_API).expect("valid default URL"),
            log_dir: None,
            leaderboard_limit: 1000,
            sync_commands_on_start: false,
        }
    }
}

#[derive(Debug, Default, Args, Serialize)]
pub struct SettingsArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// IP address and port to bind to
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// API authentication token
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    /// Database connection URL (sqlite:// or postgres://)
    #[arg(short, long = "database")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Discord bot token
    #[arg(short = 't', long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_token: Option<String>,

    /// Discord application id, needed to register commands
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<i64>,

    /// Directory for daily rotated log files
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("tech", "throneless", "flipbot")
        .map(|dirs| dirs.config_dir().join("flipbot.toml"))
}

impl Settings {
    pub fn figment(args: &SettingsArgs) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = args.config.clone().or_else(default_config_path) {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(args))
    }

    pub fn load(args: &SettingsArgs) -> Result<Self> {
        let settings: Settings = Self::figment(args).extract()?;
        if settings.auth.is_empty() {
            return Err(figment::Error::from("an API auth token is required".to_owned()).into());
        }
        Ok(settings)
    }
}
