// SPDX-License-Identifier: GPL-3.0-or-later

//! Lookups over more values than one API call accepts.

use crate::app_store::parse_same_country;
use crate::chunk::chunk;
use crate::client::ItunesClient;
use crate::error::{ItunesError, NotFoundError, Result};
use crate::models::{LookupOutcome, LookupRequest, LookupSelector};
use crate::query::MAX_LOOKUP_BATCH_SIZE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Split a selector into same-family selectors of at most `size` values each.
pub fn split_selector(selector: &LookupSelector, size: usize) -> Vec<LookupSelector> {
    match selector {
        LookupSelector::Ids(v) => chunk(v, size).into_iter().map(LookupSelector::Ids).collect(),
        LookupSelector::AmgArtistIds(v) => chunk(v, size)
            .into_iter()
            .map(LookupSelector::AmgArtistIds)
            .collect(),
        LookupSelector::AmgAlbumIds(v) => chunk(v, size)
            .into_iter()
            .map(LookupSelector::AmgAlbumIds)
            .collect(),
        LookupSelector::AmgVideoIds(v) => chunk(v, size)
            .into_iter()
            .map(LookupSelector::AmgVideoIds)
            .collect(),
        LookupSelector::Upcs(v) => chunk(v, size).into_iter().map(LookupSelector::Upcs).collect(),
        LookupSelector::Isbns(v) => chunk(v, size).into_iter().map(LookupSelector::Isbns).collect(),
        LookupSelector::BundleIds(v) => chunk(v, size)
            .into_iter()
            .map(LookupSelector::BundleIds)
            .collect(),
    }
}

impl ItunesClient {
    /// Look up any number of values, 200 per call, one call after another.
    ///
    /// Results from every batch are kept, including batches that reported
    /// missing track IDs. Missing IDs across all batches are collected into a
    /// single [`NotFoundError`] on the returned outcome. Only track ID lookups
    /// are reconciled; the other selector families cannot tell a miss from an
    /// empty answer. Transport, HTTP and decode errors abort the whole lookup.
    ///
    /// When `limit` is unset, track ID batches ask for as many results as the
    /// batch has IDs.
    pub async fn lookup_all(
        &self,
        cancel: &CancellationToken,
        request: &LookupRequest,
    ) -> Result<LookupOutcome> {
        if request.selector.is_empty() {
            return Err(ItunesError::InvalidInput(
                "lookup requires at least one selector".to_string(),
            ));
        }

        let batches = split_selector(&request.selector, MAX_LOOKUP_BATCH_SIZE);
        let total = batches.len();
        let mut results = Vec::new();
        let mut missing_ids = Vec::new();

        for (index, selector) in batches.into_iter().enumerate() {
            let mut batch = request.with_selector(selector);
            if batch.limit.is_none() && batch.selector.is_reconcilable() {
                batch.limit = Some(batch.selector.len() as i64);
            }

            debug!(
                target: "itunes",
                batch = index + 1,
                total,
                key = batch.selector.key(),
                size = batch.selector.len(),
                "dispatching lookup batch"
            );

            let outcome = self.lookup(cancel, &batch).await?;
            results.extend(outcome.results);
            if let Some(not_found) = outcome.not_found {
                missing_ids.extend(not_found.missing_ids);
            }
        }

        let not_found = if missing_ids.is_empty() {
            None
        } else {
            info!(target: "itunes", missing = missing_ids.len(), "some track IDs were not found");
            Some(NotFoundError {
                missing_ids,
                missing_urls: Vec::new(),
            })
        };

        Ok(LookupOutcome { results, not_found })
    }

    /// Look up apps by App Store URL.
    ///
    /// All URLs must come from the same storefront; that country replaces the
    /// one on `base`, and the selector of `base` is replaced by the parsed
    /// track IDs. Both checks happen before anything is sent. Track IDs that
    /// come back missing are reported with their originating URLs.
    pub async fn lookup_app_store_urls(
        &self,
        cancel: &CancellationToken,
        urls: &[String],
        base: &LookupRequest,
    ) -> Result<LookupOutcome> {
        let (parsed, country) = parse_same_country(urls)?;

        let mut request =
            base.with_selector(LookupSelector::Ids(parsed.iter().map(|p| p.track_id).collect()));
        request.country = Some(country);

        let mut outcome = self.lookup_all(cancel, &request).await?;
        if let Some(not_found) = outcome.not_found.as_mut() {
            not_found.missing_urls = parsed
                .iter()
                .filter(|p| not_found.missing_ids.contains(&p.track_id))
                .map(|p| p.url.clone())
                .collect();
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_selector_keeps_family_and_order() {
        let ids: Vec<i64> = (1..=450).collect();
        let batches = split_selector(&LookupSelector::Ids(ids.clone()), 200);

        assert_eq!(batches.len(), 3);
        let mut rejoined = Vec::new();
        for batch in batches {
            match batch {
                LookupSelector::Ids(v) => rejoined.extend(v),
                other => panic!("unexpected selector {other:?}"),
            }
        }
        assert_eq!(rejoined, ids);
    }

    #[test]
    fn test_split_string_selector() {
        let upcs: Vec<String> = (0..3).map(|i| format!("00000000000{i}")).collect();
        let batches = split_selector(&LookupSelector::Upcs(upcs), 2);
        assert_eq!(
            batches,
            vec![
                LookupSelector::Upcs(vec!["000000000000".into(), "000000000001".into()]),
                LookupSelector::Upcs(vec!["000000000002".into()]),
            ]
        );
    }

    #[test]
    fn test_split_empty_selector() {
        assert!(split_selector(&LookupSelector::BundleIds(Vec::new()), 200).is_empty());
    }
}
