use crate::clients::jikan::SearchParams;
use crate::config::Config;
use crate::services::catalog::CatalogPage;

use super::{catalog_from_config, format_count, format_score, parse_kind};

pub async fn cmd_search(config: &Config, kind: &str, query: &str) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    println!("Searching {} for: {query}", kind.slug());

    let catalog = catalog_from_config(config)?;
    let params = SearchParams {
        q: Some(query.to_string()),
        limit: Some(10),
        ..SearchParams::default()
    };

    let page = catalog.search(kind, &params).await?;

    let rows: Vec<(i32, String, String, String)> = match page {
        CatalogPage::Anime(page) => page
            .data
            .into_iter()
            .map(|a| {
                (
                    a.mal_id,
                    a.title,
                    format!("{} eps", format_count(a.episodes)),
                    format_score(a.score),
                )
            })
            .collect(),
        CatalogPage::Manga(page) => page
            .data
            .into_iter()
            .map(|m| {
                (
                    m.mal_id,
                    m.title,
                    format!("{} ch", format_count(m.chapters)),
                    format_score(m.score),
                )
            })
            .collect(),
    };

    if rows.is_empty() {
        println!("No {} found matching '{query}'", kind.slug());
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for (mal_id, title, units, score) in rows {
        println!("• {title} ({units})");
        println!("  ID: {mal_id} | Score: {score}");
    }

    println!();
    println!("For details: tsundoku info {} <id>", kind.slug());

    Ok(())
}
