//! Pure, stateless technical indicators over price/candle vectors. Every
//! function here allocates only its output vector and is safe to call
//! re-entrantly with overlapping input slices.

pub mod atr;
pub mod boll;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::atr;
pub use boll::{boll, BollOutput};
pub use ema::ema;
pub use macd::{macd, MacdOutput};
pub use rsi::{is_overbought, is_oversold, rsi};
pub use sma::sma;
