//! List entries command handler

use crate::config::Config;
use crate::db::Store;
use crate::domain::{EntryStatus, MediaKind, UserId};

use super::parse_kind;

pub async fn cmd_list_entries(
    config: &Config,
    email: &str,
    kind: Option<&str>,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let kind = kind.map(parse_kind).transpose()?;
    let status = status
        .map(|raw| match kind {
            Some(kind) => EntryStatus::parse(kind, raw),
            None => EntryStatus::parse(MediaKind::Anime, raw)
                .or_else(|_| EntryStatus::parse(MediaKind::Manga, raw)),
        })
        .transpose()?;

    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user_by_email(&email.trim().to_lowercase()).await? else {
        println!("No account with email {email}.");
        return Ok(());
    };

    let entries = store.list_entries(UserId(user.id), kind, status).await?;

    if entries.is_empty() {
        println!("{} has no entries yet.", user.name);
        return Ok(());
    }

    println!("{}'s list ({} total)", user.name, entries.len());
    println!("{:-<70}", "");

    for entry in entries {
        let kind = entry.key.kind;
        let tracked = entry.tracked;
        let total = tracked
            .total_units
            .map_or_else(|| "?".to_string(), |t| t.to_string());
        let score = tracked
            .score
            .map_or_else(String::new, |s| format!(" | Score: {s}"));

        println!(
            "• {} [{}/{} {}]",
            entry.title,
            tracked.progress,
            total,
            kind.unit_name()
        );
        println!(
            "  {} {} | {}{}",
            kind.slug(),
            entry.key.mal_id,
            tracked.status.as_str(kind),
            score
        );
    }

    Ok(())
}
