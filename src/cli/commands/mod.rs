mod info;
mod list;
mod search;
mod top;
mod user;

pub use info::cmd_title_info;
pub use list::cmd_list_entries;
pub use search::cmd_search;
pub use top::cmd_top;
pub use user::{cmd_user_api_key, cmd_user_create};

use crate::clients::jikan::JikanClient;
use crate::config::Config;
use crate::domain::MediaKind;
use crate::services::CatalogService;

fn catalog_from_config(config: &Config) -> anyhow::Result<CatalogService> {
    Ok(CatalogService::new(JikanClient::from_config(&config.jikan)?))
}

fn parse_kind(raw: &str) -> anyhow::Result<MediaKind> {
    Ok(raw.parse::<MediaKind>()?)
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"))
}

fn format_count(count: Option<i32>) -> String {
    count.map_or_else(|| "?".to_string(), |c| c.to_string())
}
