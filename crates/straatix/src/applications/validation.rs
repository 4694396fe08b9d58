use serde::{Deserialize, Serialize};

use super::domain::DraftApplication;
use crate::config::ApplicationPolicyConfig;

/// Wizard steps in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PersonalInfo = 1,
    Professional = 2,
    Documents = 3,
    Review = 4,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::PersonalInfo,
        WizardStep::Professional,
        WizardStep::Documents,
        WizardStep::Review,
    ];

    pub const fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub const fn title(self) -> &'static str {
        match self {
            WizardStep::PersonalInfo => "Personal Info",
            WizardStep::Professional => "Professional",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// Draft fields that carry a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Phone,
    DateOfBirth,
    Nationality,
    Gender,
    Address,
    ClassXSchool,
    ClassXYear,
    ClassXPercentage,
    ClassXiiSchool,
    ClassXiiYear,
    ClassXiiPercentage,
    DegreeInstitution,
    DegreeName,
    DegreeYear,
    DegreeCgpa,
}

impl DraftField {
    pub const fn as_str(self) -> &'static str {
        match self {
            DraftField::Phone => "phone",
            DraftField::DateOfBirth => "date_of_birth",
            DraftField::Nationality => "nationality",
            DraftField::Gender => "gender",
            DraftField::Address => "address",
            DraftField::ClassXSchool => "class_x_school",
            DraftField::ClassXYear => "class_x_year",
            DraftField::ClassXPercentage => "class_x_percentage",
            DraftField::ClassXiiSchool => "class_xii_school",
            DraftField::ClassXiiYear => "class_xii_year",
            DraftField::ClassXiiPercentage => "class_xii_percentage",
            DraftField::DegreeInstitution => "degree_institution",
            DraftField::DegreeName => "degree_name",
            DraftField::DegreeYear => "degree_year",
            DraftField::DegreeCgpa => "degree_cgpa",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            DraftField::Phone => "Phone number",
            DraftField::DateOfBirth => "Date of birth",
            DraftField::Nationality => "Nationality",
            DraftField::Gender => "Gender",
            DraftField::Address => "Address",
            DraftField::ClassXSchool => "Class X School",
            DraftField::ClassXYear => "Class X Year",
            DraftField::ClassXPercentage => "Class X Percentage",
            DraftField::ClassXiiSchool => "Class XII School",
            DraftField::ClassXiiYear => "Class XII Year",
            DraftField::ClassXiiPercentage => "Class XII Percentage",
            DraftField::DegreeInstitution => "Degree Institution",
            DraftField::DegreeName => "Degree Name",
            DraftField::DegreeYear => "Degree Year",
            DraftField::DegreeCgpa => "Degree CGPA",
        }
    }

    fn value(self, draft: &DraftApplication) -> &str {
        let personal = &draft.personal;
        let academic = &draft.academic;
        match self {
            DraftField::Phone => &personal.phone,
            DraftField::DateOfBirth => &personal.date_of_birth,
            DraftField::Nationality => &personal.nationality,
            DraftField::Gender => &personal.gender,
            DraftField::Address => &personal.address,
            DraftField::ClassXSchool => &academic.class_x_school,
            DraftField::ClassXYear => &academic.class_x_year,
            DraftField::ClassXPercentage => &academic.class_x_percentage,
            DraftField::ClassXiiSchool => &academic.class_xii_school,
            DraftField::ClassXiiYear => &academic.class_xii_year,
            DraftField::ClassXiiPercentage => &academic.class_xii_percentage,
            DraftField::DegreeInstitution => &academic.degree_institution,
            DraftField::DegreeName => &academic.degree_name,
            DraftField::DegreeYear => &academic.degree_year,
            DraftField::DegreeCgpa => &academic.degree_cgpa,
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const PERSONAL_FIELDS: &[DraftField] = &[
    DraftField::Phone,
    DraftField::DateOfBirth,
    DraftField::Nationality,
    DraftField::Gender,
    DraftField::Address,
];

const PROFESSIONAL_FIELDS: &[DraftField] = &[
    DraftField::ClassXSchool,
    DraftField::ClassXYear,
    DraftField::ClassXPercentage,
    DraftField::ClassXiiSchool,
    DraftField::ClassXiiYear,
    DraftField::ClassXiiPercentage,
    DraftField::DegreeInstitution,
    DraftField::DegreeName,
    DraftField::DegreeYear,
    DraftField::DegreeCgpa,
];

/// Fields that must be filled before leaving `step`.
pub fn required_fields(step: WizardStep) -> &'static [DraftField] {
    match step {
        WizardStep::PersonalInfo => PERSONAL_FIELDS,
        WizardStep::Professional => PROFESSIONAL_FIELDS,
        WizardStep::Documents | WizardStep::Review => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: DraftField,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_phone_length: usize,
}

impl ValidationRules {
    pub const DEFAULT_MIN_PHONE_LENGTH: usize = 10;
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_phone_length: Self::DEFAULT_MIN_PHONE_LENGTH,
        }
    }
}

impl From<&ApplicationPolicyConfig> for ValidationRules {
    fn from(config: &ApplicationPolicyConfig) -> Self {
        Self {
            min_phone_length: config.min_phone_length,
        }
    }
}

/// Outcome of checking one step's gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepValidation {
    pub errors: Vec<FieldError>,
    pub resume_missing: bool,
}

impl StepValidation {
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && !self.resume_missing
    }
}

/// Check the gate for `step`. Only that step's fields are inspected.
pub fn validate_step(
    step: WizardStep,
    draft: &DraftApplication,
    resume_available: bool,
    rules: &ValidationRules,
) -> StepValidation {
    let errors = required_fields(step)
        .iter()
        .filter_map(|field| check_field(*field, draft, rules))
        .collect();

    StepValidation {
        errors,
        resume_missing: step == WizardStep::Documents && !resume_available,
    }
}

fn check_field(field: DraftField, draft: &DraftApplication, rules: &ValidationRules) -> Option<FieldError> {
    let value = field.value(draft).trim();

    let message = match field {
        DraftField::Phone if value.chars().count() < rules.min_phone_length => format!(
            "Phone number must be at least {} digits",
            rules.min_phone_length
        ),
        _ if value.is_empty() => format!("{} is required", field.label()),
        _ => return None,
    };

    Some(FieldError { field, message })
}
