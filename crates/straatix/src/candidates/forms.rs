//! Free-text form models and their coercion into stored profile fields.
//!
//! Every field is edited as text. Numbers are only parsed when a form is
//! coerced for storage; blank text becomes `None`, and text that does not
//! parse as a number is also stored as `None` rather than a guessed value.

use serde::{Deserialize, Serialize};

use super::domain::{AcademicFields, CandidateProfile, PersonalFields};

/// Trim the value and map blank input to `None`.
pub fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a whole-number field such as a graduation year.
pub fn coerce_year(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Parse a decimal field such as a percentage, CGPA or salary figure.
pub fn coerce_decimal(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number_or_empty<T: ToString>(value: Option<T>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

/// Contact section as typed by the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDraft {
    pub phone: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub gender: String,
    pub address: String,
}

impl PersonalDraft {
    pub fn from_fields(fields: &PersonalFields) -> Self {
        Self {
            phone: text_or_empty(&fields.phone),
            date_of_birth: text_or_empty(&fields.date_of_birth),
            nationality: text_or_empty(&fields.nationality),
            gender: text_or_empty(&fields.gender),
            address: text_or_empty(&fields.address),
        }
    }

    pub fn to_fields(&self) -> PersonalFields {
        PersonalFields {
            phone: blank_to_none(&self.phone),
            date_of_birth: blank_to_none(&self.date_of_birth),
            nationality: blank_to_none(&self.nationality),
            gender: blank_to_none(&self.gender),
            address: blank_to_none(&self.address),
        }
    }
}

/// Academic and professional section as typed by the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicDraft {
    pub class_x_school: String,
    pub class_x_year: String,
    pub class_x_percentage: String,
    pub class_xii_school: String,
    pub class_xii_year: String,
    pub class_xii_percentage: String,
    pub degree_institution: String,
    pub degree_name: String,
    pub degree_year: String,
    pub degree_cgpa: String,
    pub current_company: String,
    pub current_ctc: String,
    pub expected_ctc: String,
}

impl AcademicDraft {
    pub fn from_fields(fields: &AcademicFields) -> Self {
        Self {
            class_x_school: text_or_empty(&fields.class_x_school),
            class_x_year: number_or_empty(fields.class_x_year),
            class_x_percentage: number_or_empty(fields.class_x_percentage),
            class_xii_school: text_or_empty(&fields.class_xii_school),
            class_xii_year: number_or_empty(fields.class_xii_year),
            class_xii_percentage: number_or_empty(fields.class_xii_percentage),
            degree_institution: text_or_empty(&fields.degree_institution),
            degree_name: text_or_empty(&fields.degree_name),
            degree_year: number_or_empty(fields.degree_year),
            degree_cgpa: number_or_empty(fields.degree_cgpa),
            current_company: text_or_empty(&fields.current_company),
            current_ctc: number_or_empty(fields.current_ctc),
            expected_ctc: number_or_empty(fields.expected_ctc),
        }
    }

    pub fn to_fields(&self) -> AcademicFields {
        AcademicFields {
            class_x_school: blank_to_none(&self.class_x_school),
            class_x_year: coerce_year(&self.class_x_year),
            class_x_percentage: coerce_decimal(&self.class_x_percentage),
            class_xii_school: blank_to_none(&self.class_xii_school),
            class_xii_year: coerce_year(&self.class_xii_year),
            class_xii_percentage: coerce_decimal(&self.class_xii_percentage),
            degree_institution: blank_to_none(&self.degree_institution),
            degree_name: blank_to_none(&self.degree_name),
            degree_year: coerce_year(&self.degree_year),
            degree_cgpa: coerce_decimal(&self.degree_cgpa),
            current_company: blank_to_none(&self.current_company),
            current_ctc: coerce_decimal(&self.current_ctc),
            expected_ctc: coerce_decimal(&self.expected_ctc),
        }
    }
}

/// Account-area personal details form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDetailsForm {
    pub full_name: String,
    #[serde(flatten)]
    pub personal: PersonalDraft,
}

impl PersonalDetailsForm {
    pub fn from_profile(profile: &CandidateProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            personal: PersonalDraft::from_fields(&profile.personal),
        }
    }
}
