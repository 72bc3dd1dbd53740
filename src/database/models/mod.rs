pub mod audit;
pub mod kyc_document;
pub mod notification;
pub mod preferences;
pub mod session;
pub mod user;

pub use audit::{AuditAction, AuditEntry};
pub use kyc_document::{KycDocument, NewKycDocument};
pub use notification::Notification;
pub use preferences::Preferences;
pub use session::{Session, SessionIdentity};
pub use user::{KycAdvance, PersonalInfoUpdate, User};
