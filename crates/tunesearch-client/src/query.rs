// SPDX-License-Identifier: GPL-3.0-or-later

//! Query string builders for the `/search` and `/lookup` endpoints.

use crate::error::{ItunesError, Result};
use crate::models::{LookupRequest, SearchRequest};

/// Most items the lookup endpoint accepts or returns per call.
pub const MAX_LOOKUP_BATCH_SIZE: usize = 200;

pub type QueryPairs = Vec<(&'static str, String)>;

fn push_opt(query: &mut QueryPairs, key: &'static str, value: Option<&String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        query.push((key, value.clone()));
    }
}

fn push_positive(query: &mut QueryPairs, key: &'static str, value: Option<i64>) {
    if let Some(value) = value.filter(|v| *v > 0) {
        query.push((key, value.to_string()));
    }
}

/// The API never returns more than 200 items per call.
fn capped(limit: Option<i64>) -> Option<i64> {
    limit.map(|l| l.min(MAX_LOOKUP_BATCH_SIZE as i64))
}

pub fn search_query(req: &SearchRequest) -> Result<QueryPairs> {
    if req.term.trim().is_empty() {
        return Err(ItunesError::InvalidInput(
            "search requires a non-empty term".to_string(),
        ));
    }

    let mut query = vec![("term", req.term.clone())];
    let media = req
        .media
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or("all");
    query.push(("media", media.to_string()));

    push_opt(&mut query, "entity", req.entity.as_ref());
    push_opt(&mut query, "country", req.country.as_ref());
    push_positive(&mut query, "limit", capped(req.limit));
    push_opt(&mut query, "attribute", req.attribute.as_ref());
    push_opt(&mut query, "lang", req.lang.as_ref());
    push_positive(&mut query, "version", req.version);

    if let Some(explicit) = req.explicit {
        query.push(("explicit", if explicit { "Yes" } else { "No" }.to_string()));
    }
    if let Some(offset) = req.offset {
        query.push(("offset", offset.to_string()));
    }
    push_opt(&mut query, "callback", req.callback.as_ref());

    Ok(query)
}

pub fn lookup_query(req: &LookupRequest) -> Result<QueryPairs> {
    if req.selector.is_empty() {
        return Err(ItunesError::InvalidInput(
            "lookup requires at least one selector".to_string(),
        ));
    }

    let mut query = vec![(req.selector.key(), req.selector.joined())];
    push_opt(&mut query, "entity", req.entity.as_ref());
    push_opt(&mut query, "country", req.country.as_ref());
    push_positive(&mut query, "limit", capped(req.limit));
    push_opt(&mut query, "sort", req.sort.as_ref());

    Ok(query)
}
