pub mod prelude;

pub mod favorites;
pub mod media_entries;
pub mod password_reset_tokens;
pub mod users;
pub mod verification_tokens;
