pub mod entry;
pub mod favorite;
pub mod user;

pub use entry::{EntryKey, EntryRecord, MediaEntry};
pub use favorite::{Favorite, FavoriteAction, TitleSnapshot};
pub use user::User;
