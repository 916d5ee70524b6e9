//! Feed persistence.
//!
//! - [`json`]: Writes a [`FeedReport`](crate::models::FeedReport) per pipeline per day
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── es.json
//!     ├── cx-ai.json
//!     └── ccaas.json
//! ```

pub mod json;
