//! # Domain models for users and notes
//!
//! These types are what the rest of the workspace passes around. The ones that are
//! persisted (`UserProfile`, `Note`, `NoteDraft`) serialise with the camelCase field
//! names used in the document database, with timestamps as epoch milliseconds.
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`UserIdentity`] | Snapshot of the auth provider's identity: opaque `uid` plus email. |
//! | [`UserProfile`] | The per-user document at `users/{uid}` written once at sign-up. |
//! | [`Note`] | A stored note as read back from `users/{uid}/notes/{id}`. |
//! | [`NoteDraft`] | The fields the editor writes; storage adds the timestamps. |
//! | [`SignupForm`] | Raw sign-up input, before email normalisation and budget parsing. |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MissingField, UnknownCategory};

/// Note category. Stored as its display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    General,
    Work,
    Personal,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Work,
        Category::Personal,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Category selector of the note list: everything, or one category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Choices offered by the list view, in display order.
    pub fn choices() -> impl Iterator<Item = CategoryFilter> {
        std::iter::once(CategoryFilter::All).chain(Category::ALL.into_iter().map(CategoryFilter::Only))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
        }
    }

    pub fn admits(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// The auth provider's view of a signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: String,
}

/// Profile document stored at `users/{uid}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    /// Lower-cased at sign-up.
    pub email: String,
    #[serde(default)]
    pub monthly_budget: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Get display name, falling back to email if name is blank.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Raw input of the sign-up form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Free text; see [`parse_budget`].
    pub monthly_budget: String,
}

impl SignupForm {
    /// Every field but the budget is required. Whitespace does not count as a value.
    pub fn validate(&self) -> Result<(), MissingField> {
        if self.name.trim().is_empty() {
            return Err(MissingField::Name);
        }
        check_credentials(&self.email, &self.password)
    }
}

/// Email and password must both be filled in.
pub fn check_credentials(email: &str, password: &str) -> Result<(), MissingField> {
    if email.trim().is_empty() {
        Err(MissingField::Email)
    } else if password.is_empty() {
        Err(MissingField::Password)
    } else {
        Ok(())
    }
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parse a monthly budget, treating anything that is not a finite number as zero.
pub fn parse_budget(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// A note as read from storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Storage-assigned id, taken from the document path rather than the body.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields written by the editor on create and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub image_url: Option<String>,
}

// Older documents store a missing image as an empty string.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parse() {
        assert_eq!("Work".parse::<Category>(), Ok(Category::Work));
        assert!("work".parse::<Category>().is_err());
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "Personal".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::Personal))
        );
    }

    #[test]
    fn test_filter_choices_include_every_category() {
        let choices: Vec<&str> = CategoryFilter::choices().map(|c| c.as_str()).collect();
        assert_eq!(choices, ["all", "General", "Work", "Personal", "Other"]);
    }

    #[test]
    fn test_signup_form_requires_fields() {
        let form = SignupForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
            monthly_budget: String::new(),
        };
        assert_eq!(form.validate(), Ok(()));

        let blank_name = SignupForm {
            name: "   ".to_string(),
            ..form.clone()
        };
        assert_eq!(blank_name.validate(), Err(MissingField::Name));

        let blank_email = SignupForm {
            email: " ".to_string(),
            ..form.clone()
        };
        assert_eq!(blank_email.validate(), Err(MissingField::Email));

        let blank_password = SignupForm {
            password: String::new(),
            ..form
        };
        assert_eq!(blank_password.validate(), Err(MissingField::Password));
    }

    #[test]
    fn test_check_credentials() {
        assert_eq!(check_credentials("a@b.co", "pw"), Ok(()));
        assert_eq!(check_credentials("", "pw"), Err(MissingField::Email));
        assert_eq!(check_credentials("a@b.co", ""), Err(MissingField::Password));
        assert_eq!(MissingField::Email.user_message(), "Email is required");
    }

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("250"), 250.0);
        assert_eq!(parse_budget(" 12.5 "), 12.5);
        assert_eq!(parse_budget(""), 0.0);
        assert_eq!(parse_budget("lots"), 0.0);
        assert_eq!(parse_budget("NaN"), 0.0);
        assert_eq!(parse_budget("inf"), 0.0);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_note_reads_legacy_empty_image() {
        let note: Note = serde_json::from_value(json!({
            "title": "Groceries",
            "content": "milk",
            "category": "Personal",
            "imageUrl": "",
            "createdAt": 1_700_000_000_000i64,
        }))
        .unwrap();
        assert_eq!(note.image_url, None);
        assert_eq!(note.created_at.unwrap().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(note.updated_at, None);
    }

    #[test]
    fn test_draft_serialises_camel_case() {
        let draft = NoteDraft {
            title: "t".into(),
            content: "c".into(),
            category: Category::Other,
            image_url: Some("https://img".into()),
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["imageUrl"], "https://img");
        assert_eq!(value["category"], "Other");
    }
}
