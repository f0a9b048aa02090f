pub mod prelude;

pub mod flip;
pub mod guild_settings;
pub mod user_profit;
