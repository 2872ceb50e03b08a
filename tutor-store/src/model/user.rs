use serde::{Deserialize, Serialize};

use crate::model::de::{null_as_default, opt_string_or_number, string_or_number};

/// Account role as reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
    #[default]
    #[serde(other)]
    Other,
}

impl Role {
    /// Parse a stored role string (credential store, CLI input).
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Student" => Self::Student,
            "Teacher" => Self::Teacher,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Other => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(other)]
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

/// Teacher linked to a student account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRef {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Backend-owned user record. The client only ever replaces `profile_url`,
/// and only through an upload followed by a re-fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exp_points: u64,
    #[serde(rename = "StudentLesson", default, deserialize_with = "null_as_default")]
    pub student_lessons: Vec<serde_json::Value>,
    #[serde(rename = "StudentActivity", default, deserialize_with = "null_as_default")]
    pub student_activities: Vec<serde_json::Value>,
    #[serde(default)]
    pub teacher: Option<TeacherRef>,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn lessons_taken(&self) -> usize {
        self.student_lessons.len()
    }

    pub fn activities_completed(&self) -> usize {
        self.student_activities.len()
    }

    /// Stored profile image path, ignoring blank values.
    pub fn profile_image(&self) -> Option<&str> {
        self.profile_url
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}
