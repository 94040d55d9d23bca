//! Account consolidation policy.
//!
//! The original store format allowed several stored accounts that are the
//! same wallet under the newer model: the address string was free-form
//! (mixed case, optional `0x` prefix), so one public key could be imported
//! more than once. This policy collapses them during the
//! `accounts_v1 -> accounts_v2` step:
//!
//! - decode each address into its binary public-key identity; the first
//!   record per identity wins, later ones are dropped
//! - assign each emitted record a gap-free `order` in encounter order
//! - fold the legacy settings into the record: the per-account asset order
//!   and whether this was the selected account
//!
//! The legacy settings keys it consumed are deleted only after the entire
//! chain has succeeded, never mid-chain: an aborted migration must leave
//! them intact for the retry.

use super::{MigrationPolicy, PolicyContext, PolicyOutcome, SkipReason};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use strongbox_core::{FieldValue, Record};
use strongbox_storage::SettingsExt;
use tracing::{debug, warn};

/// Name mappings use to attach this policy.
pub const POLICY_NAME: &str = "account_consolidation";

/// Legacy settings key: map of address to ordered asset identifiers.
pub const ASSET_ORDER_KEY: &str = "legacy.asset_order";

/// Legacy settings key: address of the account selected in the old UI.
pub const SELECTED_ACCOUNT_KEY: &str = "legacy.selected_account";

const ADDRESS_FIELD: &str = "address";
const PUBLIC_KEY_FIELD: &str = "public_key";
const ORDER_FIELD: &str = "order";
const IS_SELECTED_FIELD: &str = "is_selected";
const ASSET_ORDER_FIELD: &str = "asset_order";

/// Decode an address string into its canonical binary identity.
///
/// Accepts mixed case and an optional `0x`/`0X` prefix; two spellings of the
/// same key decode to the same identity.
pub fn decode_identity(address: &str) -> Option<Vec<u8>> {
    let trimmed = address.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    hex::decode(digits).ok()
}

/// Per-step state of the consolidation policy.
#[derive(Debug, Default)]
pub struct AccountConsolidationPolicy {
    seen: BTreeSet<Vec<u8>>,
    next_order: i64,
    asset_order: BTreeMap<String, Vec<String>>,
    selected: Option<String>,
}

impl AccountConsolidationPolicy {
    /// Create a fresh policy for one step.
    pub fn new() -> Self {
        AccountConsolidationPolicy::default()
    }
}

/// Registry constructor.
pub(super) fn build() -> Box<dyn MigrationPolicy> {
    Box::new(AccountConsolidationPolicy::new())
}

/// End-of-chain cleanup: drop the legacy settings this policy consumed.
///
/// Runs only after the final atomic replace; failures are logged and
/// swallowed because the store itself has already been promoted.
pub(super) fn finish_chain(ctx: &PolicyContext) {
    for key in [ASSET_ORDER_KEY, SELECTED_ACCOUNT_KEY] {
        if let Err(err) = ctx.settings().remove(key) {
            warn!(key, %err, "legacy settings cleanup failed");
        }
    }
}

impl MigrationPolicy for AccountConsolidationPolicy {
    fn begin_step(&mut self, ctx: &PolicyContext) -> Result<()> {
        // Read once, before the first record; the settings store is not
        // consulted again during the step.
        self.asset_order = ctx.settings().get_as(ASSET_ORDER_KEY).unwrap_or_default();
        self.selected = ctx.settings().get_as(SELECTED_ACCOUNT_KEY);
        debug!(
            asset_order_entries = self.asset_order.len(),
            has_selected = self.selected.is_some(),
            "loaded legacy settings for account consolidation"
        );
        Ok(())
    }

    fn transform(
        &mut self,
        _ctx: &PolicyContext,
        source: &Record,
        mut draft: Record,
    ) -> Result<PolicyOutcome> {
        let address = match source.get(ADDRESS_FIELD).and_then(FieldValue::as_str) {
            Some(address) => address.to_string(),
            None => {
                warn!("account record without an address field, leaving it behind");
                return Ok(PolicyOutcome::Skip(SkipReason::Anomaly));
            }
        };

        let identity = match decode_identity(&address) {
            Some(identity) => identity,
            None => {
                warn!(address = %address, "undecodable account address, leaving it behind");
                return Ok(PolicyOutcome::Skip(SkipReason::Anomaly));
            }
        };

        if !self.seen.insert(identity.clone()) {
            debug!(address = %address, "duplicate account identity, consolidating");
            return Ok(PolicyOutcome::Skip(SkipReason::Duplicate));
        }

        let assets = self.asset_order.get(&address).cloned().unwrap_or_default();
        let selected = self.selected.as_deref() == Some(address.as_str());

        draft.set(PUBLIC_KEY_FIELD, FieldValue::Bytes(identity));
        draft.set(ORDER_FIELD, FieldValue::Int(self.next_order));
        draft.set(IS_SELECTED_FIELD, FieldValue::Bool(selected));
        draft.set(ASSET_ORDER_FIELD, FieldValue::StrList(assets));
        self.next_order += 1;

        Ok(PolicyOutcome::Emit(draft))
    }
}
