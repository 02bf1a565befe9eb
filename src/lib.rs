#![forbid(unsafe_code)]

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod html;
pub mod logging;
pub mod pipeline;
pub mod pool;
pub mod post;
pub mod rewrite;
pub mod store;
pub mod summary;
