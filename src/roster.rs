use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ballot::Category;

pub const MAX_NOMINEE_NAME_LEN: usize = 128;
pub const MAX_ROSTER_SIZE: usize = 512;

/// Position a student defends in the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Favor,
    Against,
    Both,
    /// Stance text that matches none of the known spellings. Such a nominee
    /// is listed but cannot be picked in either category.
    Unknown,
}

impl Stance {
    /// Parses the stance column, ignoring case and padding.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "a favor" | "favor" | "for" => Stance::Favor,
            "en contra" | "contra" | "against" => Stance::Against,
            "ambos" | "both" => Stance::Both,
            _ => Stance::Unknown,
        }
    }

    pub fn accepts(self, category: Category) -> bool {
        matches!(
            (self, category),
            (Stance::Both, _)
                | (Stance::Favor, Category::Favor)
                | (Stance::Against, Category::Contra)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominee {
    pub name: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub stance: String,
    #[serde(default)]
    pub notes: String,
}

impl Nominee {
    pub fn stance(&self) -> Stance {
        Stance::parse(&self.stance)
    }
}

/// Snapshot of the roster as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    nominees: Vec<Nominee>,
}

impl Roster {
    pub fn new(nominees: Vec<Nominee>) -> Self {
        assert!(
            nominees.len() <= MAX_ROSTER_SIZE,
            "Roster exceeds defensive bound"
        );
        Self { nominees }
    }

    /// Builds a roster from rows read back from the store. Rows past
    /// [`MAX_ROSTER_SIZE`] are dropped with a warning.
    pub fn from_rows(mut nominees: Vec<Nominee>) -> Self {
        if nominees.len() > MAX_ROSTER_SIZE {
            warn!(
                "Roster holds more than {MAX_ROSTER_SIZE} nominees, ignoring {} of them",
                nominees.len() - MAX_ROSTER_SIZE
            );
            nominees.truncate(MAX_ROSTER_SIZE);
        }
        Self::new(nominees)
    }

    pub fn is_empty(&self) -> bool {
        self.nominees.is_empty()
    }

    pub fn nominees(&self) -> &[Nominee] {
        &self.nominees
    }

    pub fn into_nominees(self) -> Vec<Nominee> {
        self.nominees
    }

    pub fn find(&self, name: &str) -> Option<&Nominee> {
        let name = name.trim();
        self.nominees.iter().find(|nominee| nominee.name.trim() == name)
    }

    /// Nominees that may be picked in `category`, in roster order.
    pub fn eligible(&self, category: Category) -> impl Iterator<Item = &Nominee> {
        self.nominees
            .iter()
            .filter(move |nominee| nominee.stance().accepts(category))
    }
}

/// Trims and bounds-checks a roster entry before it is written to the store.
pub fn sanitize_nominee(nominee: &Nominee) -> Result<Nominee, String> {
    let name = nominee.name.trim();
    if name.is_empty() {
        return Err("Nominee name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NOMINEE_NAME_LEN {
        return Err(format!(
            "Nominee name exceeds {MAX_NOMINEE_NAME_LEN} character limit"
        ));
    }
    Ok(Nominee {
        name: name.to_string(),
        topic: nominee.topic.trim().to_string(),
        stance: nominee.stance.trim().to_string(),
        notes: nominee.notes.trim().to_string(),
    })
}
