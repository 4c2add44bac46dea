//! Team stealth address pool.
//!
//! Each team member brings their own meta-address; the pool pre-generates
//! one-time stealth addresses per member so payment flows never wait on key
//! derivation. Addresses move one way from unused to used and a used
//! address is never handed out again.

use std::collections::HashMap;

use chrono::Utc;
use ethers::types::{Address, H256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use veilpay_core::constants::DEFAULT_PRE_GENERATE_COUNT;
use veilpay_core::error::{Result, VeilpayError};
use veilpay_core::types::{PoolStats, TeamMember, TeamRole, TeamStealthAddress};
use veilpay_crypto::{validate_public_key, StealthAddressGenerator};

// ═══════════════════════════════════════════════════════════════════════════════
// POOL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct PoolInner {
    /// member_id → member
    members: HashMap<String, TeamMember>,
    /// member_id → that member's addresses, generation order
    pools: HashMap<String, Vec<TeamStealthAddress>>,
}

/// Serializable snapshot of the whole pool, for backup or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolExport {
    pub members: Vec<TeamMember>,
    pub addresses: Vec<TeamStealthAddress>,
}

/// Thread-safe team registry plus per-member stealth address pools.
#[derive(Debug)]
pub struct TeamStealthAddressPool {
    generator: StealthAddressGenerator,
    pre_generate_count: usize,
    inner: RwLock<PoolInner>,
}

impl Default for TeamStealthAddressPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamStealthAddressPool {
    /// Creates an empty pool with the default pre-generation batch size.
    pub fn new() -> Self {
        Self::with_pre_generate_count(DEFAULT_PRE_GENERATE_COUNT)
    }

    /// Creates an empty pool that pre-generates `count` addresses per new
    /// member. Zero disables pre-generation; addresses are then created on
    /// demand.
    pub fn with_pre_generate_count(count: usize) -> Self {
        Self {
            generator: StealthAddressGenerator::new(),
            pre_generate_count: count,
            inner: RwLock::new(PoolInner::default()),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Membership
    // ───────────────────────────────────────────────────────────────────────────

    /// Adds a member and pre-generates their address pool.
    ///
    /// # Errors
    /// Rejects duplicate member ids or wallet addresses, and keys that fail
    /// curve validation.
    pub fn add_team_member(&self, member: TeamMember) -> Result<()> {
        validate_public_key(&member.spending_public_key)?;
        validate_public_key(&member.viewing_public_key)?;

        let mut inner = self.inner.write();
        if inner.members.contains_key(&member.member_id) {
            return Err(VeilpayError::ValidationError(format!(
                "member id '{}' already exists",
                member.member_id
            )));
        }
        if inner
            .members
            .values()
            .any(|m| m.member_address == member.member_address)
        {
            return Err(VeilpayError::ValidationError(
                "member address already registered".into(),
            ));
        }

        let mut pool = Vec::with_capacity(self.pre_generate_count);
        for _ in 0..self.pre_generate_count {
            pool.push(self.generate_for(&member)?);
        }

        info!(
            member_id = %member.member_id,
            pre_generated = pool.len(),
            "added team member"
        );
        inner.pools.insert(member.member_id.clone(), pool);
        inner.members.insert(member.member_id.clone(), member);
        Ok(())
    }

    /// Removes a member and deletes their pool.
    ///
    /// # Errors
    /// `MemberNotFound` for unknown ids; removing the last admin is
    /// rejected so the team cannot lock itself out.
    pub fn remove_team_member(&self, member_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let member = inner
            .members
            .get(member_id)
            .ok_or_else(|| VeilpayError::MemberNotFound(member_id.to_string()))?;

        if member.role == TeamRole::Admin && Self::admin_count(&inner) == 1 {
            return Err(VeilpayError::ValidationError(
                "cannot remove the last admin".into(),
            ));
        }

        inner.members.remove(member_id);
        inner.pools.remove(member_id);
        info!(member_id, "removed team member");
        Ok(())
    }

    /// Changes a member's role, with the same last-admin protection as
    /// removal.
    pub fn update_member_role(&self, member_id: &str, role: TeamRole) -> Result<()> {
        let mut inner = self.inner.write();
        let current = inner
            .members
            .get(member_id)
            .ok_or_else(|| VeilpayError::MemberNotFound(member_id.to_string()))?
            .role;

        if current == TeamRole::Admin && role != TeamRole::Admin && Self::admin_count(&inner) == 1 {
            return Err(VeilpayError::ValidationError(
                "cannot demote the last admin".into(),
            ));
        }

        if let Some(member) = inner.members.get_mut(member_id) {
            member.role = role;
        }
        Ok(())
    }

    /// Looks up a member by id.
    pub fn get_member(&self, member_id: &str) -> Option<TeamMember> {
        self.inner.read().members.get(member_id).cloned()
    }

    /// Returns all members.
    pub fn get_members(&self) -> Vec<TeamMember> {
        self.inner.read().members.values().cloned().collect()
    }

    fn admin_count(inner: &PoolInner) -> usize {
        inner
            .members
            .values()
            .filter(|m| m.role == TeamRole::Admin)
            .count()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Address pool
    // ───────────────────────────────────────────────────────────────────────────

    /// Generates one fresh stealth address for a member and adds it to
    /// their pool.
    ///
    /// # Errors
    /// `MemberNotFound` for unknown ids.
    pub fn generate_stealth_address(&self, member_id: &str) -> Result<TeamStealthAddress> {
        let mut inner = self.inner.write();
        let member = inner
            .members
            .get(member_id)
            .ok_or_else(|| VeilpayError::MemberNotFound(member_id.to_string()))?
            .clone();

        let address = self.generate_for(&member)?;
        inner
            .pools
            .entry(member_id.to_string())
            .or_default()
            .push(address.clone());
        Ok(address)
    }

    /// Returns the oldest unused address for a member, generating a new one
    /// when the pool is exhausted.
    pub fn get_unused_address(&self, member_id: &str) -> Result<TeamStealthAddress> {
        {
            let inner = self.inner.read();
            if !inner.members.contains_key(member_id) {
                return Err(VeilpayError::MemberNotFound(member_id.to_string()));
            }
            if let Some(address) = inner
                .pools
                .get(member_id)
                .and_then(|pool| pool.iter().find(|a| !a.used))
            {
                return Ok(address.clone());
            }
        }

        debug!(member_id, "pool exhausted, generating on demand");
        self.generate_stealth_address(member_id)
    }

    /// Marks an address used, recording the consuming transaction.
    ///
    /// The id is searched across all member pools. Returns false for
    /// unknown ids; marking an already-used address again is a no-op that
    /// returns true.
    pub fn mark_address_as_used(&self, address_id: &str, tx_hash: Option<H256>) -> bool {
        let mut inner = self.inner.write();
        for pool in inner.pools.values_mut() {
            if let Some(address) = pool.iter_mut().find(|a| a.id == address_id) {
                if !address.used {
                    address.used = true;
                    address.transaction_hash = tx_hash;
                }
                return true;
            }
        }
        false
    }

    /// Returns all addresses in a member's pool, generation order.
    pub fn get_addresses_for_member(&self, member_id: &str) -> Vec<TeamStealthAddress> {
        self.inner
            .read()
            .pools
            .get(member_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Finds a pool entry by its on-chain stealth address.
    pub fn find_by_stealth_address(&self, address: Address) -> Option<TeamStealthAddress> {
        self.inner
            .read()
            .pools
            .values()
            .flatten()
            .find(|a| a.stealth_address == address)
            .cloned()
    }

    /// Aggregate counts across all pools.
    pub fn get_pool_stats(&self) -> PoolStats {
        let inner = self.inner.read();
        let mut stats = PoolStats {
            total_members: inner.members.len(),
            total_addresses: 0,
            unused_addresses: 0,
            used_addresses: 0,
        };
        for address in inner.pools.values().flatten() {
            stats.total_addresses += 1;
            if address.used {
                stats.used_addresses += 1;
            } else {
                stats.unused_addresses += 1;
            }
        }
        stats
    }

    /// Empties one member's pool, keeping the membership.
    pub fn clear_pool_for_member(&self, member_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.members.contains_key(member_id) {
            return Err(VeilpayError::MemberNotFound(member_id.to_string()));
        }
        inner.pools.insert(member_id.to_string(), Vec::new());
        Ok(())
    }

    /// Empties every pool, keeping memberships.
    pub fn clear_all_pools(&self) {
        let mut inner = self.inner.write();
        for pool in inner.pools.values_mut() {
            pool.clear();
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Persistence hooks
    // ───────────────────────────────────────────────────────────────────────────

    /// Snapshots members and addresses.
    pub fn export_pool(&self) -> PoolExport {
        let inner = self.inner.read();
        PoolExport {
            members: inner.members.values().cloned().collect(),
            addresses: inner.pools.values().flatten().cloned().collect(),
        }
    }

    /// Restores a snapshot, replacing current state. Addresses whose member
    /// is not part of the snapshot are dropped.
    pub fn import_pool(&self, export: PoolExport) -> Result<usize> {
        for member in &export.members {
            validate_public_key(&member.spending_public_key)?;
            validate_public_key(&member.viewing_public_key)?;
        }

        let mut inner = self.inner.write();
        inner.members.clear();
        inner.pools.clear();
        for member in export.members {
            inner.pools.insert(member.member_id.clone(), Vec::new());
            inner.members.insert(member.member_id.clone(), member);
        }
        let mut imported = 0;
        for address in export.addresses {
            if let Some(pool) = inner.pools.get_mut(&address.member_id) {
                pool.push(address);
                imported += 1;
            }
        }
        debug!(imported, "imported pool snapshot");
        Ok(imported)
    }

    fn generate_for(&self, member: &TeamMember) -> Result<TeamStealthAddress> {
        let result = self.generator.generate(&member.meta_address())?;
        Ok(TeamStealthAddress {
            id: Uuid::new_v4().to_string(),
            member_id: member.member_id.clone(),
            stealth_address: result.stealth_address,
            ephemeral_pub_key: result.ephemeral_pub_key,
            view_tag: result.view_tag,
            generated_at: Utc::now().timestamp_millis() as u64,
            used: false,
            transaction_hash: None,
        })
    }
}
