pub mod numbers;

pub use numbers::{amount_or_zero, parse_float, parse_int, score_or_zero};
