pub mod relevance;
pub mod tags;
