//! Reconciliation with the stored list
//!
//! Persists a verified token array only when it differs from what storage
//! holds. A write re-reads the stored list first, bumps the minor version,
//! stamps `updatedAt` and writes tokens sorted by name.

use chrono::NaiveDate;
use eyre::{eyre, Result};
use icu_collator::{Collator, CollatorOptions, Strength};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::address::normalize_address;
use crate::store::TokenListStore;
use crate::types::{LineaTokenList, Token, Version};

/// Next version list: first entry with `minor + 1`
pub fn bump_versions(versions: &[Version]) -> Result<Vec<Version>> {
    let current = versions
        .first()
        .ok_or_else(|| eyre!("Token list has no version entry to bump"))?;

    Ok(vec![Version {
        minor: current.minor + 1,
        ..*current
    }])
}

/// Root-locale collator at tertiary strength: accented letters sort with
/// their base letter and lowercase precedes uppercase on otherwise equal names
fn name_collator() -> Result<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    Collator::try_new(&Default::default(), options)
        .map_err(|e| eyre!("Failed to build name collator: {e}"))
}

/// Sort by name in collation order. Equal names keep their relative order.
pub fn sort_alphabetically(mut tokens: Vec<Token>) -> Result<Vec<Token>> {
    let collator = name_collator()?;
    tokens.sort_by(|a, b| collator.compare(&a.name, &b.name));
    Ok(tokens)
}

// ============================================================================
// Diff
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChange {
    pub address: String,
    pub name: String,
    pub fields: Vec<&'static str>,
}

/// Structural difference between two token arrays, keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenListDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<TokenChange>,
}

impl TokenListDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

fn address_key(token: &Token) -> String {
    normalize_address(&token.address)
        .map(|a| a.to_checksum(None))
        .unwrap_or_else(|_| token.address.clone())
}

fn changed_fields(old: &Token, new: &Token) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if old.chain_id != new.chain_id {
        fields.push("chainId");
    }
    if old.chain_uri != new.chain_uri {
        fields.push("chainURI");
    }
    if old.token_id != new.token_id {
        fields.push("tokenId");
    }
    if old.token_type != new.token_type {
        fields.push("tokenType");
    }
    if old.address != new.address {
        fields.push("address");
    }
    if old.name != new.name {
        fields.push("name");
    }
    if old.symbol != new.symbol {
        fields.push("symbol");
    }
    if old.decimals != new.decimals {
        fields.push("decimals");
    }
    if old.created_at != new.created_at {
        fields.push("createdAt");
    }
    if old.updated_at != new.updated_at {
        fields.push("updatedAt");
    }
    if old.logo_uri != new.logo_uri {
        fields.push("logoURI");
    }
    if old.extension != new.extension {
        fields.push("extension");
    }
    fields
}

pub fn diff_token_lists(old: &[Token], new: &[Token]) -> TokenListDiff {
    let old_by_address: HashMap<String, &Token> =
        old.iter().map(|t| (address_key(t), t)).collect();
    let new_by_address: HashMap<String, &Token> =
        new.iter().map(|t| (address_key(t), t)).collect();

    let mut diff = TokenListDiff::default();

    for token in new {
        let key = address_key(token);
        match old_by_address.get(&key) {
            None => diff.added.push(key),
            Some(previous) => {
                let fields = changed_fields(previous, token);
                if !fields.is_empty() {
                    diff.changed.push(TokenChange {
                        address: key,
                        name: token.name.clone(),
                        fields,
                    });
                }
            }
        }
    }

    for token in old {
        let key = address_key(token);
        if !new_by_address.contains_key(&key) {
            diff.removed.push(key);
        }
    }

    diff
}

// ============================================================================
// Reconciler
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged,
    Written {
        version: Version,
        diff: TokenListDiff,
    },
}

pub struct Reconciler<'a> {
    store: &'a dyn TokenListStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn TokenListStore) -> Self {
        Self { store }
    }

    /// Persist `tokens` if they differ from `previous.tokens`
    pub async fn reconcile(
        &self,
        previous: &LineaTokenList,
        tokens: Vec<Token>,
        today: NaiveDate,
    ) -> Result<ReconcileOutcome> {
        let tokens = sort_alphabetically(tokens)?;

        if tokens == previous.tokens {
            info!(store = %self.store.describe(), "No changes to token list");
            return Ok(ReconcileOutcome::Unchanged);
        }

        let fresh = self.store.read().await?;
        let diff = diff_token_lists(&fresh.tokens, &tokens);
        for change in &diff.changed {
            debug!(
                token = %change.name,
                address = %change.address,
                fields = ?change.fields,
                "Token changed"
            );
        }

        let versions = bump_versions(&fresh.versions)?;
        let version = versions[0];
        let previous_count = fresh.tokens.len();

        let updated = LineaTokenList {
            updated_at: today,
            versions,
            tokens,
            ..fresh
        };
        self.store.write(&updated).await?;

        info!(
            store = %self.store.describe(),
            version = %version,
            previous_tokens = previous_count,
            tokens = updated.tokens.len(),
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            "Token list updated"
        );

        Ok(ReconcileOutcome::Written { version, diff })
    }
}
