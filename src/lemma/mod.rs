//! Language-aware word normalization
//!
//! Text is split into words of two alphabets (Latin and Cyrillic), function
//! words are dropped, and every remaining word is reduced to its root form
//! with the Snowball stemmer of its language. Root forms are what the index
//! stores as lemmas.

mod lemmatizer;
mod particles;

pub use lemmatizer::Lemmatizer;
pub(crate) use lemmatizer::is_supported_letter;
pub use particles::{particle_kind, ParticleKind};

/// Languages with a normalization backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Russian,
}
