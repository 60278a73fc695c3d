pub mod activity_log;
pub mod booking;
pub mod lease;
pub mod notification;
pub mod property;
pub mod security_alert;
pub mod user;

pub use activity_log::{ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, RequestOrigin};
pub use booking::{Booking, BookingStatus};
pub use lease::{Lease, LeaseParty, LeaseStatus};
pub use notification::{Notification, NotificationKind};
pub use property::{Property, PropertyFilter};
pub use security_alert::{AlertKind, AlertSeverity, SecurityAlert};
pub use user::{normalize_email, IdentProvider, PublicProfile, User, UserResponse, UserRole};
