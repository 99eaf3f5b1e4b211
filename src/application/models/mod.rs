pub mod post;

pub mod record;
