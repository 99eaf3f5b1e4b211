pub mod serialization;

pub mod word_cloud;
