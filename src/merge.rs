//! Shortlist merge
//!
//! Folds a curated shortlist into the working list. Entries are matched by
//! address (checksum-equal, so case differences do not create duplicates);
//! a match that differs is replaced in place, a miss is appended. Nothing is
//! ever removed and relative order is preserved. A shortlist entry without a
//! `logoURI` keeps the logo already stored for that address.

use tracing::{debug, warn};

use crate::address::normalize_address;
use crate::types::Token;

/// What a merge did, by index into the merged list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub appended: Vec<usize>,
    pub replaced: Vec<usize>,
    pub unchanged: usize,
}

impl MergeSummary {
    pub fn is_noop(&self) -> bool {
        self.appended.is_empty() && self.replaced.is_empty()
    }
}

fn same_entry(existing: &Token, address: &str) -> bool {
    match (normalize_address(&existing.address), normalize_address(address)) {
        (Ok(a), Ok(b)) => a == b,
        _ => existing.address == address,
    }
}

/// Upsert every shortlist entry into `tokens`
pub fn merge_shortlist(tokens: &mut Vec<Token>, shortlist: &[Token]) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for entry in shortlist {
        if normalize_address(&entry.address).is_err() {
            warn!(
                token = %entry.name,
                address = %entry.address,
                "Shortlist entry has an unparsable address, matching verbatim"
            );
        }

        match tokens.iter().position(|t| same_entry(t, &entry.address)) {
            Some(index) => {
                let mut incoming = entry.clone();
                if incoming.logo_uri.is_none() {
                    incoming.logo_uri = tokens[index].logo_uri.clone();
                }

                if tokens[index] == incoming {
                    summary.unchanged += 1;
                } else {
                    debug!(token = %entry.name, index = index, "Replacing token from shortlist");
                    tokens[index] = incoming;
                    summary.replaced.push(index);
                }
            }
            None => {
                debug!(token = %entry.name, "Appending token from shortlist");
                tokens.push(entry.clone());
                summary.appended.push(tokens.len() - 1);
            }
        }
    }

    summary
}
