use crate::clients::jikan::TopParams;
use crate::config::Config;
use crate::constants::catalog::MAX_PAGE_LIMIT;
use crate::services::catalog::CatalogPage;

use super::{catalog_from_config, format_score, parse_kind};

pub async fn cmd_top(config: &Config, kind: &str, limit: u32) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    let catalog = catalog_from_config(config)?;

    let params = TopParams {
        limit: Some(limit.clamp(1, MAX_PAGE_LIMIT)),
        ..TopParams::default()
    };

    let rows: Vec<(i32, String, Option<f64>)> = match catalog.top(kind, &params).await? {
        CatalogPage::Anime(page) => page
            .data
            .into_iter()
            .map(|a| (a.mal_id, a.title, a.score))
            .collect(),
        CatalogPage::Manga(page) => page
            .data
            .into_iter()
            .map(|m| (m.mal_id, m.title, m.score))
            .collect(),
    };

    println!("Top {}", kind.slug());
    println!("{:-<60}", "");

    for (rank, (mal_id, title, score)) in rows.into_iter().enumerate() {
        println!(
            "{:>3}. {title} [{}] (ID: {mal_id})",
            rank + 1,
            format_score(score)
        );
    }

    Ok(())
}
