pub mod avatar;
pub mod kyc;
pub mod password;
pub mod personal;
pub mod preferences;
pub mod sessions;
pub mod show;
pub mod utils;

// Re-export handler functions for use in routing
pub use avatar::upload as avatar_upload;
pub use kyc::upload as kyc_upload;
pub use password::change as password_change;
pub use personal::update as personal_update;
pub use preferences::show as preferences_show;
pub use preferences::update as preferences_update;
pub use sessions::list as sessions_list;
pub use sessions::terminate as session_terminate;
pub use show::show as profile_show;
