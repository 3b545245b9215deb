// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tunesearch_client::{LookupRequest, LookupSelector, SearchRequest};

#[derive(Debug, Parser)]
#[command(name = "tunesearch", version, about = "Query the iTunes Search API")]
pub struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, short, env = "TUNESEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the catalogue by term.
    Search(SearchArgs),
    /// Look up items by identifier or App Store URL.
    Lookup(LookupArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub term: String,
    #[arg(long)]
    pub media: Option<String>,
    #[arg(long)]
    pub entity: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub attribute: Option<String>,
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub version: Option<i64>,
    #[arg(long)]
    pub explicit: Option<bool>,
    #[arg(long)]
    pub offset: Option<i64>,
    #[arg(long)]
    pub callback: Option<String>,
}

impl From<SearchArgs> for SearchRequest {
    fn from(args: SearchArgs) -> Self {
        SearchRequest {
            term: args.term,
            media: args.media,
            entity: args.entity,
            country: args.country,
            attribute: args.attribute,
            limit: args.limit,
            lang: args.lang,
            version: args.version,
            explicit: args.explicit,
            offset: args.offset,
            callback: args.callback,
        }
    }
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("selector")
        .required(true)
        .args([
            "ids",
            "amg_artist_ids",
            "amg_album_ids",
            "amg_video_ids",
            "upcs",
            "isbns",
            "bundle_ids",
            "urls",
        ])
))]
pub struct LookupArgs {
    #[arg(long = "id", value_delimiter = ',', num_args = 1..)]
    pub ids: Vec<i64>,
    #[arg(long = "amg-artist-id", value_delimiter = ',', num_args = 1..)]
    pub amg_artist_ids: Vec<i64>,
    #[arg(long = "amg-album-id", value_delimiter = ',', num_args = 1..)]
    pub amg_album_ids: Vec<i64>,
    #[arg(long = "amg-video-id", value_delimiter = ',', num_args = 1..)]
    pub amg_video_ids: Vec<i64>,
    #[arg(long = "upc", value_delimiter = ',', num_args = 1..)]
    pub upcs: Vec<String>,
    #[arg(long = "isbn", value_delimiter = ',', num_args = 1..)]
    pub isbns: Vec<String>,
    #[arg(long = "bundle-id", value_delimiter = ',', num_args = 1..)]
    pub bundle_ids: Vec<String>,
    /// App Store URLs, all from the same storefront.
    #[arg(long = "url", num_args = 1..)]
    pub urls: Vec<String>,
    #[arg(long)]
    pub entity: Option<String>,
    /// Ignored for URL lookups, where the storefront comes from the URLs.
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub sort: Option<String>,
}

/// What a `lookup` invocation resolves to.
#[derive(Debug, PartialEq)]
pub enum LookupTarget {
    Selector(LookupRequest),
    Urls(Vec<String>, LookupRequest),
}

impl LookupArgs {
    pub fn into_target(self) -> LookupTarget {
        let selector = if !self.ids.is_empty() {
            Some(LookupSelector::Ids(self.ids))
        } else if !self.amg_artist_ids.is_empty() {
            Some(LookupSelector::AmgArtistIds(self.amg_artist_ids))
        } else if !self.amg_album_ids.is_empty() {
            Some(LookupSelector::AmgAlbumIds(self.amg_album_ids))
        } else if !self.amg_video_ids.is_empty() {
            Some(LookupSelector::AmgVideoIds(self.amg_video_ids))
        } else if !self.upcs.is_empty() {
            Some(LookupSelector::Upcs(self.upcs))
        } else if !self.isbns.is_empty() {
            Some(LookupSelector::Isbns(self.isbns))
        } else if !self.bundle_ids.is_empty() {
            Some(LookupSelector::BundleIds(self.bundle_ids))
        } else {
            None
        };

        let request = LookupRequest {
            selector: selector.clone().unwrap_or_default(),
            entity: self.entity,
            country: self.country,
            limit: self.limit,
            sort: self.sort,
        };

        match selector {
            Some(_) => LookupTarget::Selector(request),
            None => LookupTarget::Urls(self.urls, request),
        }
    }
}
