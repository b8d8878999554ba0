pub mod object;
pub mod retry;
