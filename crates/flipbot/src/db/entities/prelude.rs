pub use super::flip::Entity as Flip;
pub use super::guild_settings::Entity as GuildSettings;
pub use super::user_profit::Entity as UserProfit;
