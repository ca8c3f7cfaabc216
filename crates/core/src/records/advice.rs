//! Harm-reduction advice grouped by stage of use.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::{AdviceId, Stage};

/// One piece of advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub id: AdviceId,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub stage: Stage,
}

/// Advice split into the three page sections, in stage order.
#[must_use]
pub fn group_by_stage(advice: &[Advice]) -> Vec<(Stage, Vec<&Advice>)> {
    Stage::ALL
        .into_iter()
        .map(|stage| (stage, advice.iter().filter(|a| a.stage == stage).collect()))
        .collect()
}

impl Normalize for Advice {
    const ENTITY: &'static str = "advice";
    const LIST_KEYS: &'static [&'static str] = &["advice", "consejos"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        let raw_stage = fields.required_text(&["Etapa", "etapa", "stage", "momento"], "stage")?;
        let stage = raw_stage
            .parse::<Stage>()
            .map_err(|reason| fields.invalid("stage", reason))?;

        Ok(Self {
            id: fields.id(&["ID_Consejo", "id_consejo", "id", "adviceId"])?,
            title: fields.required_text(&["Titulo", "titulo", "title"], "title")?,
            description: fields.text(&["Descripcion", "descripcion", "description"]),
            link: fields.text(&[
                "Enlace",
                "enlace",
                "link",
                "articleLink",
                "article_link",
                "url",
            ]),
            stage,
        })
    }
}

impl TableRow for Advice {
    type Id = AdviceId;

    fn row_id(&self) -> AdviceId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.stage.label()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::parse_list;

    #[test]
    fn test_stage_drives_grouping() {
        let advice = parse_list::<Advice>(&json!({ "consejos": [
            { "id": 1, "titulo": "Hydrate", "etapa": "durante" },
            { "id": 2, "titulo": "Test your pills", "etapa": "antes", "enlace": "https://example.org" },
            { "id": 3, "titulo": "Rest", "etapa": "after" },
            { "id": 4, "titulo": "Check dosage", "etapa": "before" },
        ]}))
        .unwrap()
        .records;

        let grouped = group_by_stage(&advice);
        let titles: Vec<(Stage, Vec<&str>)> = grouped
            .iter()
            .map(|(stage, items)| (*stage, items.iter().map(|a| a.title.as_str()).collect()))
            .collect();
        assert_eq!(
            titles,
            vec![
                (Stage::Before, vec!["Test your pills", "Check dosage"]),
                (Stage::While, vec!["Hydrate"]),
                (Stage::After, vec!["Rest"]),
            ]
        );
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let err = Advice::from_value(&json!({ "title": "x", "stage": "tomorrow" })).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidField { field: "stage", .. }));
    }

    #[test]
    fn test_filter_by_stage_label() {
        let a = Advice::from_value(&json!({ "title": "Sleep", "stage": "after" })).unwrap();
        assert!(a.matches("after use"));
        assert!(a.matches("sleep"));
    }
}
