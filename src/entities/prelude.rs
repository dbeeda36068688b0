pub use super::favorites::Entity as Favorites;
pub use super::media_entries::Entity as MediaEntries;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::users::Entity as Users;
pub use super::verification_tokens::Entity as VerificationTokens;
