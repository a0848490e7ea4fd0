//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SiteStatus`: persisted lifecycle of a site (crawling, indexed, failed)
//! - `JobState`: in-process state machine of a site crawl job

mod job_state;
mod site_status;

pub use job_state::JobState;
pub use site_status::SiteStatus;
