pub mod fields;
pub mod format;

pub use fields::RequestFields;
pub use format::{ProfileView, SessionView};
