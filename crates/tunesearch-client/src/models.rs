// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ItunesError, NotFoundError};
use serde::{Deserialize, Serialize};

/// Response envelope returned by both `/search` and `/lookup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    #[serde(default)]
    pub result_count: u32,
    pub results: Vec<ContentResult>,
}

/// A single content item (app, song, album, book, ...) as returned by the API.
///
/// Fields not present for a given `kind` are left at their default value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentResult {
    pub track_name: String,
    pub bundle_id: String,
    pub track_id: i64,
    pub seller_name: String,
    pub kind: String,
    pub description: String,
    pub release_date: String,
    pub price: f64,
    pub formatted_price: String,
    pub currency: String,
    pub version: String,
    #[serde(rename = "primaryGenreName")]
    pub primary_genre: String,
    pub minimum_os_version: String,
    pub file_size_bytes: String,
    pub artist_view_url: String,
    #[serde(rename = "artworkUrl512")]
    pub artwork_url: String,
    pub track_view_url: String,
    pub supported_devices: Vec<String>,
    pub genres: Vec<String>,
    #[serde(rename = "languageCodesISO2A")]
    pub languages: Vec<String>,
    #[serde(rename = "averageUserRating")]
    pub average_rating: f64,
    #[serde(rename = "userRatingCount")]
    pub rating_count: i64,
}

/// Search query parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Search term (required, must not be empty).
    pub term: String,
    /// Media type, sent as `all` when unset.
    pub media: Option<String>,
    pub entity: Option<String>,
    /// ISO 3166-1 alpha-2 store country.
    pub country: Option<String>,
    pub attribute: Option<String>,
    /// Maximum number of results; ignored unless positive.
    pub limit: Option<i64>,
    pub lang: Option<String>,
    /// Result key version; ignored unless positive.
    pub version: Option<i64>,
    pub explicit: Option<bool>,
    pub offset: Option<i64>,
    /// JSONP callback name. The response body is unwrapped before decoding.
    pub callback: Option<String>,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = Some(explicit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }
}

/// The one identifier family a lookup call selects by.
///
/// The default is an empty track ID list, which is rejected on dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupSelector {
    Ids(Vec<i64>),
    AmgArtistIds(Vec<i64>),
    AmgAlbumIds(Vec<i64>),
    AmgVideoIds(Vec<i64>),
    Upcs(Vec<String>),
    Isbns(Vec<String>),
    BundleIds(Vec<String>),
}

impl Default for LookupSelector {
    fn default() -> Self {
        Self::Ids(Vec::new())
    }
}

impl LookupSelector {
    /// Query string key for this selector family.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ids(_) => "id",
            Self::AmgArtistIds(_) => "amgArtistId",
            Self::AmgAlbumIds(_) => "amgAlbumId",
            Self::AmgVideoIds(_) => "amgVideoId",
            Self::Upcs(_) => "upc",
            Self::Isbns(_) => "isbn",
            Self::BundleIds(_) => "bundleId",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Ids(v) | Self::AmgArtistIds(v) | Self::AmgAlbumIds(v) | Self::AmgVideoIds(v) => {
                v.len()
            }
            Self::Upcs(v) | Self::Isbns(v) | Self::BundleIds(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Comma-joined selector values.
    pub fn joined(&self) -> String {
        fn join_ints(values: &[i64]) -> String {
            values
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        }

        match self {
            Self::Ids(v) | Self::AmgArtistIds(v) | Self::AmgAlbumIds(v) | Self::AmgVideoIds(v) => {
                join_ints(v)
            }
            Self::Upcs(v) | Self::Isbns(v) | Self::BundleIds(v) => v.join(","),
        }
    }

    /// Whether returned results can be reconciled against the requested values.
    ///
    /// Only track IDs are echoed back in a way that tells found from missing.
    pub fn is_reconcilable(&self) -> bool {
        matches!(self, Self::Ids(_))
    }
}

/// Lookup query parameters. Exactly one selector family per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub selector: LookupSelector,
    pub entity: Option<String>,
    pub country: Option<String>,
    /// Maximum number of results; capped at 200 on the wire.
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

impl LookupRequest {
    pub fn new(selector: LookupSelector) -> Self {
        Self {
            selector,
            entity: None,
            country: None,
            limit: None,
            sort: None,
        }
    }

    pub fn ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self::new(LookupSelector::Ids(ids.into_iter().collect()))
    }

    pub fn bundle_ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self::new(LookupSelector::BundleIds(
            ids.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn upcs<S: Into<String>>(upcs: impl IntoIterator<Item = S>) -> Self {
        Self::new(LookupSelector::Upcs(upcs.into_iter().map(Into::into).collect()))
    }

    pub fn isbns<S: Into<String>>(isbns: impl IntoIterator<Item = S>) -> Self {
        Self::new(LookupSelector::Isbns(
            isbns.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Same filters, different selector.
    pub(crate) fn with_selector(&self, selector: LookupSelector) -> Self {
        Self {
            selector,
            entity: self.entity.clone(),
            country: self.country.clone(),
            limit: self.limit,
            sort: self.sort.clone(),
        }
    }
}

/// Result of a lookup: every item found plus, optionally, what was not.
///
/// A populated `not_found` does not invalidate `results`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupOutcome {
    pub results: Vec<ContentResult>,
    pub not_found: Option<NotFoundError>,
}

/// A lookup that found some, but not all, of what was asked for.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct PartialLookup {
    pub results: Vec<ContentResult>,
    pub error: NotFoundError,
}

impl LookupOutcome {
    pub fn is_complete(&self) -> bool {
        self.not_found.is_none()
    }

    /// All-or-error view that still hands back the partial data on failure.
    pub fn into_result(self) -> std::result::Result<Vec<ContentResult>, PartialLookup> {
        match self.not_found {
            None => Ok(self.results),
            Some(error) => Err(PartialLookup {
                results: self.results,
                error,
            }),
        }
    }
}

impl From<PartialLookup> for ItunesError {
    /// Discards the partial results.
    fn from(partial: PartialLookup) -> Self {
        ItunesError::NotFound(partial.error)
    }
}
