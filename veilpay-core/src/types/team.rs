//! Team member and pooled stealth address types.

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::types::keys::CompressedPublicKey;

// ═══════════════════════════════════════════════════════════════════════════════
// ROLES & MEMBERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Access level of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Full control, including membership changes.
    Admin,
    /// Can receive payments and manage their own pool.
    Member,
    /// Read-only access.
    Viewer,
}

/// A member of a payment team, holding their own stealth identity keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Stable identifier, unique within the pool.
    pub member_id: String,
    /// The member's wallet address, unique within the pool.
    pub member_address: Address,
    pub name: String,
    pub role: TeamRole,
    pub spending_public_key: CompressedPublicKey,
    pub viewing_public_key: CompressedPublicKey,
}

impl TeamMember {
    /// The member's stealth meta-address.
    pub fn meta_address(&self) -> crate::types::address::MetaAddress {
        crate::types::address::MetaAddress::new(self.spending_public_key, self.viewing_public_key)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POOLED ADDRESSES
// ═══════════════════════════════════════════════════════════════════════════════

/// A pre-generated stealth address held in a member's pool.
///
/// Transitions one way from unused to used; a used address is never handed
/// out again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStealthAddress {
    /// Unique id for this pool entry (uuid v4).
    pub id: String,
    pub member_id: String,
    pub stealth_address: Address,
    pub ephemeral_pub_key: CompressedPublicKey,
    pub view_tag: u8,
    /// Unix milliseconds at generation.
    pub generated_at: u64,
    pub used: bool,
    /// Transaction that consumed this address, once marked used.
    pub transaction_hash: Option<H256>,
}

/// Aggregate pool statistics across all members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_members: usize,
    pub total_addresses: usize,
    pub unused_addresses: usize,
    pub used_addresses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMPRESSED_PUBLIC_KEY_SIZE;

    fn key(fill: u8) -> CompressedPublicKey {
        let mut bytes = [fill; COMPRESSED_PUBLIC_KEY_SIZE];
        bytes[0] = 0x02;
        CompressedPublicKey::from_array(bytes)
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TeamRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<TeamRole>("\"viewer\"").unwrap(),
            TeamRole::Viewer
        );
    }

    #[test]
    fn test_member_meta_address() {
        let member = TeamMember {
            member_id: "alice".into(),
            member_address: Address::repeat_byte(0x01),
            name: "Alice".into(),
            role: TeamRole::Admin,
            spending_public_key: key(0x11),
            viewing_public_key: key(0x22),
        };
        let meta = member.meta_address();
        assert_eq!(meta.spending_pk, key(0x11));
        assert_eq!(meta.viewing_pk, key(0x22));
    }
}
