//! Types shared between services: enums stored in databases and carried in
//! headers, and the post event payloads published to the message bus.

pub mod enums;
pub mod events;

pub use enums::{OfficialTag, ParseEnumError, Platform, PostStatus, UserRole, UserStatus};
pub use events::{
    PostApprovedEvent, PostData, PostDeletedEvent, PostPendingAuditEvent, PostRejectedEvent,
    RejectionDetail,
};
