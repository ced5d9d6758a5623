// Copyright 2026 Edools Harvest Contributors
// SPDX-License-Identifier: MIT

//! Log in to an Edools school and harvest the lesson list of a course.
//!
//! The two flows share only the session store file:
//!
//! - [`auth::login`] signs in through the web form and saves the cookies.
//! - [`harvest::scrape_course`] loads them, reads the course page, and
//!   falls back to a headless browser when the lesson list is rendered
//!   client-side.

pub mod acquisition;
pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extraction;
pub mod harvest;
pub mod output;
pub mod renderer;
pub mod session;
pub mod timestamp;

pub use config::HarvestConfig;
pub use error::{HarvestError, HarvestResult};
pub use extraction::LessonRecord;
pub use session::{Session, SessionStore};
