pub mod baseline;
pub mod check;
