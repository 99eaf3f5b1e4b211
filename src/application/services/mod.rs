pub mod analyzer_service;

pub mod download_service;

pub mod feed_service;

pub mod platform_client;
