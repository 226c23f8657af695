//! pipguard - Python dependency compatibility checker library
//!
//! This library provides:
//! - A compatibility check of one release against the installed packages
//! - A newest-first search for the best compatible release
//! - PyPI JSON API and pip integration behind swappable traits

pub mod checker;
pub mod cli;
pub mod domain;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod registry;
pub mod selector;
pub mod version;
