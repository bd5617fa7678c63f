//! End-to-end flows behind the CLI subcommands

use chrono::NaiveDate;
use eyre::Result;
use tracing::{debug, info};

use crate::logo::LogoResolver;
use crate::merge::merge_shortlist;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::store::TokenListStore;
use crate::types::Token;
use crate::verifier::BatchVerifier;

/// Read the stored list, verify every token, persist on change.
///
/// Any fatal verification error returns before the store is touched again.
pub async fn verify_token_list(
    store: &dyn TokenListStore,
    verifier: &BatchVerifier,
    today: NaiveDate,
) -> Result<ReconcileOutcome> {
    let list = store.read().await?;
    info!(
        store = %store.describe(),
        tokens = list.tokens.len(),
        batch_size = verifier.batch_size(),
        "Verifying token list"
    );

    let verified = verifier.verify_list(&list.tokens).await?;
    Reconciler::new(store).reconcile(&list, verified, today).await
}

/// First logo any resolver knows, in resolver order
pub async fn resolve_logo(
    resolvers: &[Box<dyn LogoResolver>],
    token: &Token,
) -> Result<Option<String>> {
    for resolver in resolvers {
        if let Some(logo) = resolver.fetch_logo_uri(token).await? {
            debug!(token = %token.name, service = resolver.name(), "Logo resolved");
            return Ok(Some(logo));
        }
    }
    Ok(None)
}

/// Fold the shortlist into the full list, fill in logos for appended
/// entries that lack one, then persist on change.
pub async fn sync_full_list(
    full: &dyn TokenListStore,
    short: &dyn TokenListStore,
    resolvers: &[Box<dyn LogoResolver>],
    today: NaiveDate,
) -> Result<ReconcileOutcome> {
    let full_list = full.read().await?;
    let short_list = short.read().await?;

    let mut tokens = full_list.tokens.clone();
    let summary = merge_shortlist(&mut tokens, &short_list.tokens);
    info!(
        appended = summary.appended.len(),
        replaced = summary.replaced.len(),
        unchanged = summary.unchanged,
        "Shortlist merged"
    );

    for &index in &summary.appended {
        if tokens[index].logo_uri.is_some() {
            continue;
        }
        if let Some(logo) = resolve_logo(resolvers, &tokens[index]).await? {
            tokens[index].logo_uri = Some(logo);
        }
    }

    Reconciler::new(full).reconcile(&full_list, tokens, today).await
}
