pub mod git;
pub mod token;
