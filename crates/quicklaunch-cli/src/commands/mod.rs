pub mod classify;
pub mod selectors;
