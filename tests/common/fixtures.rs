//! Canned vocabulary fixtures shared across harnesses.
//!
//! A small slice of a phenotype ontology:
//!
//! ```text
//! HP:0000001 All
//! └── HP:0000118 Phenotypic abnormality
//!     └── HP:0000707 Abnormality of the nervous system
//!         └── HP:0001250 Seizure
//!             ├── HP:0007359 Focal-onset seizure
//!             └── HP:0002197 Generalized-onset seizure (leaf)
//! ```
//!
//! plus one ORDO leaf, `Orphanet_558 Marfan syndrome`, for tests that need a
//! second vocabulary.

use std::time::Duration;

use super::builders::*;
use super::scripted_source::ScriptedSource;
use vq::core::{Term, Vocabulary};

pub const HP_PATH: &str = "/Vocabularies/HP";
pub const ORDO_PATH: &str = "/Vocabularies/ORDO";

/// A delay long enough to outlast any debounce used in the harnesses.
pub const SLOW: Duration = Duration::from_millis(2_000);

pub fn all() -> Term {
    TermBuilder::new("HP", "HP:0000001", "All")
        .children(&[("HP:0000118", "Phenotypic abnormality")])
        .build()
}

pub fn phenotypic_abnormality() -> Term {
    TermBuilder::new("HP", "HP:0000118", "Phenotypic abnormality")
        .parent("HP:0000001", "All")
        .children(&[("HP:0000707", "Abnormality of the nervous system")])
        .build()
}

pub fn nervous_system() -> Term {
    TermBuilder::new("HP", "HP:0000707", "Abnormality of the nervous system")
        .parent("HP:0000118", "Phenotypic abnormality")
        .children(&[("HP:0001250", "Seizure")])
        .build()
}

pub fn seizure() -> Term {
    let mut term = TermBuilder::new("HP", "HP:0001250", "Seizure")
        .definition("A seizure is an intermittent abnormality of nervous system physiology.")
        .synonym("Seizures")
        .synonym("Epileptic seizure")
        .parent("HP:0000707", "Abnormality of the nervous system")
        .children(&[
            ("HP:0007359", "Focal-onset seizure"),
            ("HP:0002197", "Generalized-onset seizure"),
        ])
        .build();
    if let Some(children) = term.children.as_mut() {
        children[1].has_children = Some(false);
    }
    term
}

pub fn focal_seizure() -> Term {
    TermBuilder::new("HP", "HP:0007359", "Focal-onset seizure")
        .parent("HP:0001250", "Seizure")
        .children(&[])
        .build()
}

pub fn marfan_syndrome() -> Term {
    TermBuilder::new("ORDO", "Orphanet_558", "Marfan syndrome")
        .definition("A systemic disease of connective tissue.")
        .leaf()
        .build()
}

/// A source that knows the whole fixture hierarchy. Info responses embed
/// each term's direct children, as the repository does.
pub fn hp_source() -> ScriptedSource {
    ScriptedSource::new()
        .term(all())
        .term(phenotypic_abnormality())
        .term(nervous_system())
        .term(seizure())
        .term(focal_seizure())
        .vocabulary(
            HP_PATH,
            vocabulary_doc("HP", "Human Phenotype Ontology", vec![all().summary()]),
        )
}

pub fn hp_vocabulary() -> Vocabulary {
    Vocabulary::new("HP", HP_PATH)
}
