//! Reference material for TripCover.
//!
//! Policy documents become [`CorpusEntry`] text, the destination spreadsheet
//! becomes a [`DestinationTable`], and both are bundled into a read-only
//! [`ReferenceLibrary`] shared by every session.

pub mod extract;
pub mod library;
pub mod table;

pub use extract::{DocumentExtractor, StandardExtractor};
pub use library::{Corpus, CorpusEntry, ReferenceLibrary, UploadedDocument};
pub use table::{DestinationRow, DestinationTable};
