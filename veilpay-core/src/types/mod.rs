//! Core types shared across the Veilpay workspace.

pub mod address;
pub mod announcement;
pub mod keys;
pub mod metadata;
pub mod payment;
pub mod team;

pub use address::MetaAddress;
pub use announcement::{AnnouncementFilter, AnnouncementLog};
pub use keys::{CompressedPublicKey, StealthPrivateKey};
pub use metadata::{EncryptedMetadata, TransactionMemo};
pub use payment::{
    PaymentFilter, PaymentHistoryEntry, PaymentStats, PaymentStatus, StealthAddressResult,
    StealthPayment,
};
pub use team::{PoolStats, TeamMember, TeamRole, TeamStealthAddress};
