pub mod catalog;
pub use catalog::{CatalogError, CatalogService};

pub mod email;
pub use email::{EmailError, Mailer, build_mailer};

pub mod locks;
pub use locks::KeyedLocks;

pub mod auth_service;
pub mod auth_service_impl;
pub mod entry_service;
pub mod entry_service_impl;
pub mod favorite_service;
pub mod favorite_service_impl;

pub use auth_service::{AuthError, AuthService, Signup};
pub use auth_service_impl::SeaOrmAuthService;
pub use entry_service::{EntryError, EntryInput, EntryService, EntryState};
pub use entry_service_impl::SeaOrmEntryService;
pub use favorite_service::{FavoriteError, FavoriteService};
pub use favorite_service_impl::SeaOrmFavoriteService;
