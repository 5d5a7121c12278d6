//! Buckets form fields into semantic categories by keywords in their names.

use serde::Serialize;

use crate::forms::FormField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Organizational,
    Project,
    Financial,
    Impact,
    Other,
}

impl FieldCategory {
    /// Categories in matching order; the first whose keywords hit wins.
    pub const ALL: [FieldCategory; 5] = [
        FieldCategory::Organizational,
        FieldCategory::Project,
        FieldCategory::Financial,
        FieldCategory::Impact,
        FieldCategory::Other,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            FieldCategory::Organizational => &[
                "organization",
                "org",
                "ngo",
                "entity",
                "mission",
                "history",
                "registration",
            ],
            FieldCategory::Project => &[
                "project",
                "program",
                "initiative",
                "activity",
                "description",
                "title",
            ],
            FieldCategory::Financial => {
                &["budget", "cost", "amount", "funding", "financial", "expense"]
            }
            FieldCategory::Impact => &[
                "outcome",
                "impact",
                "result",
                "benefit",
                "target",
                "population",
                "beneficiary",
            ],
            FieldCategory::Other => &[],
        }
    }

    pub fn classify(field_name: &str) -> Self {
        let name = field_name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|k| name.contains(k)))
            .unwrap_or(FieldCategory::Other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifiedFields {
    pub organizational: Vec<FormField>,
    pub project: Vec<FormField>,
    pub financial: Vec<FormField>,
    pub impact: Vec<FormField>,
    pub other: Vec<FormField>,
}

impl ClassifiedFields {
    pub fn from_fields(fields: &[FormField]) -> Self {
        let mut classified = Self::default();
        for field in fields {
            classified
                .bucket_mut(FieldCategory::classify(&field.name))
                .push(field.clone());
        }
        classified
    }

    pub fn bucket(&self, category: FieldCategory) -> &[FormField] {
        match category {
            FieldCategory::Organizational => &self.organizational,
            FieldCategory::Project => &self.project,
            FieldCategory::Financial => &self.financial,
            FieldCategory::Impact => &self.impact,
            FieldCategory::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, category: FieldCategory) -> &mut Vec<FormField> {
        match category {
            FieldCategory::Organizational => &mut self.organizational,
            FieldCategory::Project => &mut self.project,
            FieldCategory::Financial => &mut self.financial,
            FieldCategory::Impact => &mut self.impact,
            FieldCategory::Other => &mut self.other,
        }
    }

    /// Every field with its category, category by category.
    pub fn iter(&self) -> impl Iterator<Item = (FieldCategory, &FormField)> {
        FieldCategory::ALL
            .into_iter()
            .flat_map(move |category| self.bucket(category).iter().map(move |f| (category, f)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        FieldCategory::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }
}
