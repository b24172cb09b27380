//! The static reference document the tables are seeded from.
//!
//! ```json
//! { "flies": [ { "name": "Pheasant Tail Nymph", "category": "nymph",
//!                "sizes": [14, 16, 18], "difficulty": "beginner",
//!                "target_species": ["trout"],
//!                "materials": [ { "name": "Pheasant tail", "type": "feather" } ],
//!                "tutorials": [ { "url": "https://..." } ] } ] }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::SeedError;

pub const DEFAULT_MATERIAL_TYPE: &str = "synthetic";
pub const DEFAULT_TUTORIAL_TYPE: &str = "video";

/// A parsed document. Fly records that do not fit [`FlyRecord`] are kept in
/// `invalid` so one bad entry does not hide the others.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawReference")]
pub struct FlyReference {
    pub flies: Vec<FlyRecord>,
    pub invalid: Vec<InvalidFly>,
}

#[derive(Deserialize)]
struct RawReference {
    flies: Vec<Value>,
}

/// A fly record that could not be read, with its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFly {
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

impl From<RawReference> for FlyReference {
    fn from(raw: RawReference) -> Self {
        let mut flies = Vec::with_capacity(raw.flies.len());
        let mut invalid = Vec::new();

        for (index, value) in raw.flies.into_iter().enumerate() {
            let name = value.get("name").and_then(Value::as_str).map(str::to_string);
            match serde_json::from_value::<FlyRecord>(value) {
                Ok(fly) => flies.push(fly),
                Err(e) => invalid.push(InvalidFly {
                    index,
                    name,
                    reason: e.to_string(),
                }),
            }
        }

        Self { flies, invalid }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlyRecord {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub sizes: Vec<HookSize>,
    pub difficulty: String,
    #[serde(default)]
    pub target_species: Vec<String>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub tutorials: Vec<TutorialEntry>,
}

/// Hook sizes are usually numbers (`14`) but aught sizes are written as
/// labels (`"1/0"`). Both are passed through to the store as given, so a
/// `2.5` or a `-1` reaches the database unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookSize {
    Number(Number),
    Label(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(rename = "type", default = "default_material_type")]
    pub material_type: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub substitutable: bool,
    #[serde(default)]
    pub substitute_note: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TutorialEntry {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default = "default_tutorial_type")]
    pub tutorial_type: String,
}

fn default_material_type() -> String {
    DEFAULT_MATERIAL_TYPE.to_string()
}

fn default_tutorial_type() -> String {
    DEFAULT_TUTORIAL_TYPE.to_string()
}

fn default_required() -> bool {
    true
}

impl FlyReference {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, SeedError> {
        serde_json::from_str(text).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every material entry across every fly, in document order.
    pub fn material_entries(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.flies.iter().flat_map(|fly| fly.materials.iter())
    }
}

/// Read and parse the reference document at `path`.
pub fn load_reference(path: &Path) -> Result<FlyReference, SeedError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => SeedError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SeedError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    FlyReference::from_json(path, &text)
}
