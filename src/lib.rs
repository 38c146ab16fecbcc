// File: src/lib.rs
pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod debounce;
pub mod favourites;
pub mod matching;
pub mod model;
pub mod paths;
pub mod planner;
pub mod search;
pub mod selection;
pub mod storage;
pub mod store;
pub mod validation;

// --- ANDROID SUPPORT ---
#[cfg(target_os = "android")]
pub mod mobile;

#[cfg(target_os = "android")]
uniffi::setup_scaffolding!();
