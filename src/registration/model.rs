//! Registration record and its field types.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Interests offered by the registration form.
pub const INTEREST_OPTIONS: [&str; 6] = [
    "Productivity Analytics",
    "Team Collaboration",
    "Workflow Automation",
    "Performance Tracking",
    "AI Insights",
    "Integration Management",
];

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Whether `email` looks like `local@domain.tld`.
pub fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email.trim())
}

/// Size of the registrant's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSize {
    #[serde(rename = "1-10")]
    UpTo10,
    #[serde(rename = "11-50")]
    UpTo50,
    #[serde(rename = "51-200")]
    UpTo200,
    #[serde(rename = "201-1000")]
    UpTo1000,
    #[serde(rename = "1000+")]
    Over1000,
}

impl TeamSize {
    pub const ALL: [TeamSize; 5] = [
        Self::UpTo10,
        Self::UpTo50,
        Self::UpTo200,
        Self::UpTo1000,
        Self::Over1000,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpTo10 => "1-10",
            Self::UpTo50 => "11-50",
            Self::UpTo200 => "51-200",
            Self::UpTo1000 => "201-1000",
            Self::Over1000 => "1000+",
        }
    }
}

impl std::fmt::Display for TeamSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TeamSize {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s.trim())
            .ok_or_else(|| RegistrationError::InvalidValue {
                field: "teamSize",
                value: s.to_string(),
            })
    }
}

/// Where the registrant's team works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkMode {
    Remote,
    Hybrid,
    #[serde(rename = "Office-based")]
    OfficeBased,
    Flexible,
}

impl WorkMode {
    pub const ALL: [WorkMode; 4] = [Self::Remote, Self::Hybrid, Self::OfficeBased, Self::Flexible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "Remote",
            Self::Hybrid => "Hybrid",
            Self::OfficeBased => "Office-based",
            Self::Flexible => "Flexible",
        }
    }
}

impl std::fmt::Display for WorkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkMode {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| RegistrationError::InvalidValue {
                field: "workMode",
                value: s.to_string(),
            })
    }
}

/// Set of selected interests.
///
/// Iterates in sorted order so exports are stable regardless of the order
/// interests were picked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSet(BTreeSet<String>);

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the interest if absent, remove it if present.
    ///
    /// Returns `true` when the interest is selected afterwards.
    pub fn toggle(&mut self, interest: &str) -> Result<bool, RegistrationError> {
        let interest = interest.trim();
        if interest.is_empty() {
            return Err(RegistrationError::InvalidValue {
                field: "interests",
                value: interest.to_string(),
            });
        }
        if self.0.remove(interest) {
            Ok(false)
        } else {
            self.0.insert(interest.to_string());
            Ok(true)
        }
    }

    pub fn contains(&self, interest: &str) -> bool {
        self.0.contains(interest.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Interests joined with `", "`, as shown in exports.
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }
}

/// The data collected by the registration wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub job_title: String,
    pub location: String,
    pub team_size: Option<TeamSize>,
    pub work_mode: Option<WorkMode>,
    pub interests: InterestSet,
}

impl RegistrationRecord {
    /// Required fields of `step` that are missing, by wire name.
    ///
    /// Steps outside 1..=3 have no fields and are never satisfied.
    pub fn missing_fields(&self, step: u8) -> Vec<&'static str> {
        let blank = |s: &str| s.trim().is_empty();
        let mut missing = Vec::new();
        match step {
            1 => {
                if blank(&self.first_name) {
                    missing.push("firstName");
                }
                if blank(&self.last_name) {
                    missing.push("lastName");
                }
                if !is_email_shaped(&self.email) {
                    missing.push("email");
                }
                if blank(&self.company) {
                    missing.push("company");
                }
            }
            2 => {
                if blank(&self.job_title) {
                    missing.push("jobTitle");
                }
                if blank(&self.location) {
                    missing.push("location");
                }
                if self.team_size.is_none() {
                    missing.push("teamSize");
                }
                if self.work_mode.is_none() {
                    missing.push("workMode");
                }
            }
            3 => {
                if self.interests.is_empty() {
                    missing.push("interests");
                }
            }
            _ => missing.push("step"),
        }
        missing
    }

    pub fn is_step_valid(&self, step: u8) -> bool {
        self.missing_fields(step).is_empty()
    }

    /// All three steps are complete.
    pub fn is_complete(&self) -> bool {
        (1..=3).all(|step| self.is_step_valid(step))
    }

    /// Display name used in exports.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Apply a partial update. Nothing is changed if any value is invalid.
    pub fn apply(&mut self, patch: RecordPatch) -> Result<(), RegistrationError> {
        let team_size = parse_optional::<TeamSize>(patch.team_size.as_deref())?;
        let work_mode = parse_optional::<WorkMode>(patch.work_mode.as_deref())?;

        let mut interests = None;
        if let Some(values) = patch.interests {
            let mut set = InterestSet::new();
            for value in &values {
                if !set.contains(value) {
                    set.toggle(value)?;
                }
            }
            interests = Some(set);
        }

        let text_fields = [
            (&mut self.first_name, patch.first_name),
            (&mut self.last_name, patch.last_name),
            (&mut self.email, patch.email),
            (&mut self.company, patch.company),
            (&mut self.phone, patch.phone),
            (&mut self.job_title, patch.job_title),
            (&mut self.location, patch.location),
        ];
        for (slot, value) in text_fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(size) = team_size {
            self.team_size = size;
        }
        if let Some(mode) = work_mode {
            self.work_mode = mode;
        }
        if let Some(set) = interests {
            self.interests = set;
        }
        Ok(())
    }
}

/// Parse an optional enum value. Outer `None` means "not in the patch",
/// inner `None` means "clear the field" (empty string).
fn parse_optional<T>(raw: Option<&str>) -> Result<Option<Option<T>>, RegistrationError>
where
    T: std::str::FromStr<Err = RegistrationError>,
{
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(Some(None)),
        Some(s) => s.parse().map(|v| Some(Some(v))),
    }
}

/// A partial update to a [`RegistrationRecord`]; absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub team_size: Option<String>,
    pub work_mode: Option<String>,
    pub interests: Option<Vec<String>>,
}
