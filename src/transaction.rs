//! FAT-0 and FAT-1 transaction construction, serialization, and
//! signature validation.
//!
//! [`fat0`] and [`fat1`] hold the standard-specific public API; [`core`]
//! holds the signing, ext-id and content logic they share, and
//! [`builder`] holds the shared two-phase builder state machine.

mod builder;
mod core;
mod fat0;
mod fat1;

pub use core::{AmountLike, Input, Output, TokenMetadataEntry};
pub use fat0::{Fat0Builder, Fat0Input, Fat0Output, Fat0SignatureBuilder, Fat0Transaction};
pub use fat1::{Fat1Builder, Fat1Input, Fat1Output, Fat1SignatureBuilder, Fat1Transaction};
