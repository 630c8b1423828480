pub mod sma;

pub use sma::{simple_mean, trailing_sma};
