use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MirrorMatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Id prefix for classifier-sourced records. These have no backing
/// document in the remote catalog and must never trigger a remote write.
pub const SYNTHETIC_ID_PREFIX: &str = "ai_";

/// KV key holding the JSON array of liked item ids.
pub const LIKED_IDS_KEY: &str = "user_liked_reviews";

/// KV key holding the most recent classifier result.
pub const LATEST_MATCHES_KEY: &str = "latest_ai_results";

/// Result cap for the home screen feed.
pub const HOME_FEED_LIMIT: usize = 10;

/// Result cap for the browse-all feed.
pub const BROWSE_FEED_LIMIT: usize = 50;

/// Upper bound for catalog over-fetches (store-backed feeds, filtered
/// hospital/doctor queries). The catalog is small; anything past this is
/// a data problem, not a paging problem.
pub const CATALOG_FETCH_LIMIT: usize = 500;

/// Bulk-fetch bound for the saved-items intersection.
pub const SAVED_FETCH_LIMIT: usize = 100;

/// Get the application data directory
/// ~/MirrorMatch/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Get the local database path (favorite set + result cache).
pub fn local_db_path() -> PathBuf {
    app_data_dir().join("mirrormatch.db")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,mirrormatch=debug"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("MirrorMatch"));
    }

    #[test]
    fn local_db_under_app_data() {
        let db = local_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("mirrormatch.db"));
    }

    #[test]
    fn feed_limits_are_sane() {
        assert!(HOME_FEED_LIMIT < BROWSE_FEED_LIMIT);
        assert!(BROWSE_FEED_LIMIT <= CATALOG_FETCH_LIMIT);
        assert!(SAVED_FETCH_LIMIT <= CATALOG_FETCH_LIMIT);
    }
}
