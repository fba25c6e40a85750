//! Media type sniffing and allow-list validation.
//!
//! # Architecture
//!
//! - `media.rs` - The [`MediaType`] value type
//! - `detect.rs` - Signature tables (specialized first, then generic)
//! - `validate.rs` - The [`Validator`] seam and the [`AllowList`] policy
//!
//! Nothing here performs I/O beyond the bytes (or reader) handed in.

pub use detect::{SNIFF_LEN, detect_from_reader, sniff};
pub use error::{Error, Result};
pub use media::MediaType;
pub use validate::{AllowList, Validator};

mod detect;
mod error;
mod media;
mod validate;
