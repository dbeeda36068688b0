pub mod entry;
pub mod favorite;
pub mod token;
pub mod user;
