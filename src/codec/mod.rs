//! Format front ends for the simfile family.

pub mod formats;
mod traits;

pub use formats::sm::{SmDecoder, SmEncoder};
pub use formats::ssc::{SscDecoder, SscEncoder};
pub use traits::{Decoder, Encoder};
