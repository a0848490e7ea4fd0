//! Grammatical function words excluded from indexing
//!
//! Each word is tagged with the grammatical class that makes it a particle.
//! A word is only listed when every common reading of it belongs to one of
//! these classes, so "like" or "round" (also verbs/nouns) are absent.

use crate::lemma::Language;

/// Grammatical class of a function word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Article,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
}

const ENGLISH: &[(&str, ParticleKind)] = &[
    ("a", ParticleKind::Article),
    ("an", ParticleKind::Article),
    ("the", ParticleKind::Article),
    ("about", ParticleKind::Preposition),
    ("above", ParticleKind::Preposition),
    ("across", ParticleKind::Preposition),
    ("against", ParticleKind::Preposition),
    ("along", ParticleKind::Preposition),
    ("amid", ParticleKind::Preposition),
    ("among", ParticleKind::Preposition),
    ("around", ParticleKind::Preposition),
    ("at", ParticleKind::Preposition),
    ("beneath", ParticleKind::Preposition),
    ("beside", ParticleKind::Preposition),
    ("besides", ParticleKind::Preposition),
    ("between", ParticleKind::Preposition),
    ("beyond", ParticleKind::Preposition),
    ("by", ParticleKind::Preposition),
    ("despite", ParticleKind::Preposition),
    ("during", ParticleKind::Preposition),
    ("except", ParticleKind::Preposition),
    ("for", ParticleKind::Preposition),
    ("from", ParticleKind::Preposition),
    ("in", ParticleKind::Preposition),
    ("into", ParticleKind::Preposition),
    ("of", ParticleKind::Preposition),
    ("off", ParticleKind::Preposition),
    ("on", ParticleKind::Preposition),
    ("onto", ParticleKind::Preposition),
    ("per", ParticleKind::Preposition),
    ("through", ParticleKind::Preposition),
    ("throughout", ParticleKind::Preposition),
    ("to", ParticleKind::Preposition),
    ("toward", ParticleKind::Preposition),
    ("towards", ParticleKind::Preposition),
    ("upon", ParticleKind::Preposition),
    ("via", ParticleKind::Preposition),
    ("with", ParticleKind::Preposition),
    ("within", ParticleKind::Preposition),
    ("without", ParticleKind::Preposition),
    ("although", ParticleKind::Conjunction),
    ("and", ParticleKind::Conjunction),
    ("because", ParticleKind::Conjunction),
    ("but", ParticleKind::Conjunction),
    ("if", ParticleKind::Conjunction),
    ("nor", ParticleKind::Conjunction),
    ("or", ParticleKind::Conjunction),
    ("than", ParticleKind::Conjunction),
    ("though", ParticleKind::Conjunction),
    ("unless", ParticleKind::Conjunction),
    ("whereas", ParticleKind::Conjunction),
    ("whether", ParticleKind::Conjunction),
    ("while", ParticleKind::Conjunction),
    ("not", ParticleKind::Particle),
    ("ah", ParticleKind::Interjection),
    ("alas", ParticleKind::Interjection),
    ("hey", ParticleKind::Interjection),
    ("oh", ParticleKind::Interjection),
    ("oops", ParticleKind::Interjection),
    ("wow", ParticleKind::Interjection),
];

const RUSSIAN: &[(&str, ParticleKind)] = &[
    ("без", ParticleKind::Preposition),
    ("в", ParticleKind::Preposition),
    ("во", ParticleKind::Preposition),
    ("для", ParticleKind::Preposition),
    ("до", ParticleKind::Preposition),
    ("за", ParticleKind::Preposition),
    ("из", ParticleKind::Preposition),
    ("к", ParticleKind::Preposition),
    ("ко", ParticleKind::Preposition),
    ("между", ParticleKind::Preposition),
    ("на", ParticleKind::Preposition),
    ("над", ParticleKind::Preposition),
    ("о", ParticleKind::Preposition),
    ("об", ParticleKind::Preposition),
    ("обо", ParticleKind::Preposition),
    ("от", ParticleKind::Preposition),
    ("перед", ParticleKind::Preposition),
    ("по", ParticleKind::Preposition),
    ("под", ParticleKind::Preposition),
    ("при", ParticleKind::Preposition),
    ("про", ParticleKind::Preposition),
    ("с", ParticleKind::Preposition),
    ("со", ParticleKind::Preposition),
    ("у", ParticleKind::Preposition),
    ("через", ParticleKind::Preposition),
    ("а", ParticleKind::Conjunction),
    ("зато", ParticleKind::Conjunction),
    ("и", ParticleKind::Conjunction),
    ("или", ParticleKind::Conjunction),
    ("либо", ParticleKind::Conjunction),
    ("но", ParticleKind::Conjunction),
    ("однако", ParticleKind::Conjunction),
    ("чтобы", ParticleKind::Conjunction),
    ("бы", ParticleKind::Particle),
    ("ведь", ParticleKind::Particle),
    ("же", ParticleKind::Particle),
    ("ли", ParticleKind::Particle),
    ("не", ParticleKind::Particle),
    ("ни", ParticleKind::Particle),
    ("ах", ParticleKind::Interjection),
    ("ой", ParticleKind::Interjection),
    ("ох", ParticleKind::Interjection),
    ("увы", ParticleKind::Interjection),
    ("эх", ParticleKind::Interjection),
];

/// Looks up the grammatical class of a lower-cased word in the stoplist of
/// its language.
pub fn particle_kind(language: Language, word: &str) -> Option<ParticleKind> {
    let table = match language {
        Language::English => ENGLISH,
        Language::Russian => RUSSIAN,
    };

    table
        .iter()
        .find(|(particle, _)| *particle == word)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_classes() {
        assert_eq!(
            particle_kind(Language::English, "the"),
            Some(ParticleKind::Article)
        );
        assert_eq!(
            particle_kind(Language::English, "on"),
            Some(ParticleKind::Preposition)
        );
        assert_eq!(
            particle_kind(Language::English, "and"),
            Some(ParticleKind::Conjunction)
        );
        assert_eq!(particle_kind(Language::English, "cat"), None);
    }

    #[test]
    fn test_russian_classes() {
        assert_eq!(
            particle_kind(Language::Russian, "в"),
            Some(ParticleKind::Preposition)
        );
        assert_eq!(
            particle_kind(Language::Russian, "и"),
            Some(ParticleKind::Conjunction)
        );
        assert_eq!(
            particle_kind(Language::Russian, "ох"),
            Some(ParticleKind::Interjection)
        );
        assert_eq!(particle_kind(Language::Russian, "кошка"), None);
    }

    #[test]
    fn test_tables_are_language_specific() {
        assert_eq!(particle_kind(Language::Russian, "the"), None);
        assert_eq!(particle_kind(Language::English, "и"), None);
    }
}
