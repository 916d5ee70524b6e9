//! # Awful News Triage
//!
//! Scrapes vertical news homepages, pulls a title, snippet and publish date
//! out of each article, keeps what is recent and unique, and asks an
//! OpenAI-compatible gateway to summarize and rank it.
//!
//! ## Architecture
//!
//! 1. **Indexing** ([`scrapers::links`]): same-host article links from each homepage
//! 2. **Fetching** ([`scrapers::article`], [`scrapers::dates`]): title, snippet, publish date
//! 3. **Filtering** ([`filter`]): time window and URL dedup
//! 4. **Gating** ([`relevance`]): vendor and keyword hits, optionally required
//! 5. **Classifying** ([`classifier`], [`api`]): paced gateway calls with layered parsing
//! 6. **Assembly** ([`pipeline`]): ranked [`models::OutputRecord`]s plus [`models::RunStats`]
//!
//! The ES, CX-AI and CCaaS feeds are presets of one [`config::PipelineConfig`].
//! Network access sits behind [`scrapers::PageFetcher`] and [`api::ChatGateway`].

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod relevance;
pub mod scrapers;
pub mod utils;
