//! Subject-key composition and filtering.
//!
//! Content rows are tagged with a composite `{exam}-{language}` key and the
//! listing surfaces select by exact, case-sensitive string equality.

use serde::{Deserialize, Serialize};

/// Target examination a resource is prepared for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    Tat,
    Tet,
    Upsc,
    Gpsc,
    Class3,
}

impl ExamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamCategory::Tat => "tat",
            ExamCategory::Tet => "tet",
            ExamCategory::Upsc => "upsc",
            ExamCategory::Gpsc => "gpsc",
            ExamCategory::Class3 => "class3",
        }
    }
}

/// Language a resource is written in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Gujarati,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Gujarati => "gujarati",
        }
    }
}

/// Compose the filter key for an exam/language pair, e.g. `upsc-hindi`.
///
/// No escaping is performed. Both vocabularies are closed enumerations today,
/// so the `-` separator cannot collide; a future component value containing a
/// hyphen would produce an ambiguous key and must not be introduced without
/// revisiting this scheme.
pub fn subject_key(exam: ExamCategory, language: Language) -> String {
    format!("{}-{}", exam.as_str(), language.as_str())
}

/// A record that carries a composite subject key.
pub trait SubjectKeyed {
    fn subject_key(&self) -> &str;
}

impl SubjectKeyed for super::StudyMaterial {
    fn subject_key(&self) -> &str {
        &self.subject
    }
}

impl SubjectKeyed for super::PreviousYearPaper {
    // Papers are keyed by exam name, not the free-text subject field.
    fn subject_key(&self) -> &str {
        &self.exam_name
    }
}

impl SubjectKeyed for super::DailyTestSeriesEntry {
    fn subject_key(&self) -> &str {
        &self.subject
    }
}

/// Select the records whose stored key equals `key` exactly.
///
/// Byte-equal comparison, no partial matching, input order preserved.
pub fn filter_by_subject<'a, T: SubjectKeyed>(items: &'a [T], key: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.subject_key() == key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, StudyMaterial};

    fn material(id: i64, subject: &str) -> StudyMaterial {
        StudyMaterial {
            id,
            title: format!("material {}", id),
            subject: subject.to_string(),
            content_type: ContentType::PdfBook,
            url: "#".to_string(),
        }
    }

    #[test]
    fn composes_exam_and_language() {
        assert_eq!(subject_key(ExamCategory::Upsc, Language::Hindi), "upsc-hindi");
        assert_eq!(subject_key(ExamCategory::Class3, Language::Gujarati), "class3-gujarati");
        assert_eq!(subject_key(ExamCategory::Tat, Language::English), "tat-english");
    }

    #[test]
    fn filter_matches_exactly_one_of_three() {
        let items = vec![
            material(1, "upsc-hindi"),
            material(2, "upsc-english"),
            material(3, "tat-hindi"),
        ];

        let matched = filter_by_subject(&items, "upsc-hindi");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 1);
    }

    #[test]
    fn filter_is_case_sensitive_and_exact() {
        let items = vec![material(1, "upsc-hindi")];
        assert!(filter_by_subject(&items, "UPSC-hindi").is_empty());
        assert!(filter_by_subject(&items, "upsc").is_empty());
        assert!(filter_by_subject(&items, "upsc-hindi ").is_empty());
    }

    #[test]
    fn wire_names_are_lowercase() {
        let json = serde_json::to_string(&ExamCategory::Class3).unwrap();
        assert_eq!(json, "\"class3\"");
        let lang: Language = serde_json::from_str("\"gujarati\"").unwrap();
        assert_eq!(lang, Language::Gujarati);
    }
}
