pub mod engagement;

pub mod hashtags;

pub mod logger;

pub mod time;
