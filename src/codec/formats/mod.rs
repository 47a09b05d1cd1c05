//! Format converters for the simfile variants.
//!
//! Each format has its own submodule with a `decoder` and an `encoder`.
//! Both feed the shared MSD/property pipeline; the differences are the
//! chart framing (one six-parameter `NOTES` value per chart versus
//! `NOTEDATA` blocks) and the tag order on output.

pub mod sm;
pub mod ssc;
