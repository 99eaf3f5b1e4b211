/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 3/9/24
******************************************************************************/

//! Collects a user's post history from the platform's private API, derives
//! engagement metrics per post and mines the hashtags used by the people who
//! engage with those posts.
//!
//! The usual flow is:
//!
//! 1. build a [`config::Config`] and a [`session::session::Session`],
//! 2. wrap the session in an [`application::services::platform_client::InstagramClient`],
//! 3. run [`application::services::feed_service::FeedService::collect_user_posts`]
//!    to get a [`application::models::record::CollectionContext`],
//! 4. hand that context to the analyzer, the photo downloader or the word cloud renderer.

pub mod config;

pub mod constants;

pub mod error;

pub mod application;

pub mod presentation;

pub mod session;

pub mod storage;

pub mod transport;

pub mod utils;
