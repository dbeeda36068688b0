pub mod tokens {

    pub const VERIFICATION_TTL_HOURS: i64 = 24;

    pub const PASSWORD_RESET_TTL_HOURS: i64 = 1;
}

pub mod catalog {

    /// Titles shown in the featured strip of a catalog home page.
    pub const FEATURED_COUNT: usize = 5;

    pub const HOME_PAGE_LIMIT: u32 = 20;

    /// Jikan caps `limit` at 25.
    pub const MAX_PAGE_LIMIT: u32 = 25;
}

pub mod locks {

    /// Stripes in the per-entry lock table.
    pub const ENTRY_LOCK_STRIPES: usize = 64;
}

pub mod session {

    /// Session key holding the logged-in user's id.
    pub const USER_ID_KEY: &str = "user_id";
}
