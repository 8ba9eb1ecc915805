//! Result reporting: console progress and summaries, JSON summary files

pub mod json;
pub mod text;
