//! wallstash - wallpaper cache and download index
//!
//! The photo caching and local-file synchronization layer of a wallpaper
//! browser: a bounded in-memory cache of full photos, an index of the files
//! in the download directory, and a downloader that never fetches or saves
//! the same photo twice at once.
//!
//! # Architecture
//!
//! - [`cache`]: [`cache::BoundedCache`] and the shared [`cache::PhotoCache`]
//! - [`local`]: [`local::LocalPhotoIndex`] over a [`local::PhotoStorage`]
//! - [`remote`]: the [`remote::RemotePhotoGateway`] collaborator and listing queues
//! - [`download`]: [`download::DownloadCoordinator`]
//! - [`dispatch`]: worker pools and the caller-side [`dispatch::MainLoop`]
//! - [`model`]: photo records and query vocabulary

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod local;
pub mod logging;
pub mod model;
pub mod progress;
pub mod remote;

pub use app::run_app;
