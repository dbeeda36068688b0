use crate::config::Config;
use crate::domain::MalId;
use crate::services::CatalogError;
use crate::services::catalog::CatalogItem;

use super::{catalog_from_config, format_count, format_score, parse_kind};

pub async fn cmd_title_info(config: &Config, kind: &str, id: i32) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    if id <= 0 {
        println!("Invalid MAL ID: {id}");
        return Ok(());
    }

    let catalog = catalog_from_config(config)?;

    let item = match catalog.lookup(kind, MalId::new(id)).await {
        Ok(item) => item,
        Err(CatalogError::NotFound { .. }) => {
            println!("No {} with ID {id} in the catalog.", kind.slug());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = item.snapshot();

    println!("{} Info", kind.slug());
    println!("{:-<60}", "");
    println!("Title:    {}", snapshot.title);

    match &item {
        CatalogItem::Anime(anime) => {
            if let Some(en) = &anime.title_english {
                println!("English:  {en}");
            }
            println!("Type:     {}", anime.anime_type.as_deref().unwrap_or("?"));
            println!("Episodes: {}", format_count(anime.episodes));
            println!("Status:   {}", anime.status.as_deref().unwrap_or("?"));
            println!("Score:    {}", format_score(anime.score));
            if let Some(year) = anime.year {
                println!("Year:     {year}");
            }
        }
        CatalogItem::Manga(manga) => {
            if let Some(en) = &manga.title_english {
                println!("English:  {en}");
            }
            println!("Chapters: {}", format_count(manga.chapters));
            println!("Volumes:  {}", format_count(manga.volumes));
            println!("Status:   {}", manga.status.as_deref().unwrap_or("?"));
            println!("Score:    {}", format_score(manga.score));
        }
    }

    if let Some(image) = snapshot.image_url {
        println!("Cover:    {image}");
    }

    println!();
    Ok(())
}
