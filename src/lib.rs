//! Grammar-correction assistant for LangCorrect correction pages.
//!
//! Pipeline: page → [`extract`] → [`prompt`] → [`provider`] →
//! [`reconcile`] → [`apply`], driven one cycle at a time by [`pipeline`].

pub mod apply;
pub mod config;
pub mod error;
pub mod extract;
pub mod page;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod reconcile;
pub mod site;
