//! Substances and their long-form detail sheets.
//!
//! The backend serves the basic list (`/api/sustancias`) and the detail
//! sheets (`/api/detalles_sustancias`) separately; [`merge_details`] joins
//! them by substance id.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::SubstanceId;

/// A substance with its detail sheet attached (empty if none was served).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substance {
    pub id: SubstanceId,
    pub name: String,
    pub title: Option<String>,
    pub formula: Option<String>,
    pub image: Option<String>,
    pub details: SubstanceDetails,
}

/// Long-form information about one substance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstanceDetails {
    pub substance_id: SubstanceId,
    pub description: Option<String>,
    pub consumption_methods: Option<String>,
    pub dosage: Option<String>,
    pub effects: Option<String>,
    pub risks: Option<String>,
    pub interactions: Option<String>,
    pub legislation: Option<String>,
}

impl Substance {
    /// Name followed by the descriptive title when there is one.
    #[must_use]
    pub fn heading(&self) -> String {
        match &self.title {
            Some(title) => format!("{} - {title}", self.name),
            None => self.name.clone(),
        }
    }
}

impl SubstanceDetails {
    /// Whether any section has content.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.sections().is_empty()
    }

    /// Non-empty sections in display order, as `(heading, body)`.
    #[must_use]
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Description", &self.description),
            ("Ways of use", &self.consumption_methods),
            ("Dosage", &self.dosage),
            ("Effects", &self.effects),
            ("Risks", &self.risks),
            ("Interactions", &self.interactions),
            ("Legal status", &self.legislation),
        ]
        .into_iter()
        .filter_map(|(heading, body)| body.as_deref().map(|body| (heading, body)))
        .collect()
    }
}

impl Normalize for Substance {
    const ENTITY: &'static str = "substance";
    const LIST_KEYS: &'static [&'static str] = &["sustancias", "substances"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: fields.id(&["ID_Sustancia", "id_sustancia", "id", "substanceId"])?,
            name: fields.required_text(&["Nombre", "nombre", "name"], "name")?,
            title: fields.text(&["Titulo", "titulo", "title"]),
            formula: fields.text(&["Formula", "formula", "Formula_Quimica", "chemicalFormula"]),
            image: fields
                .url_list(&["Imagen", "imagen", "image", "img", "imageUrl"])
                .into_iter()
                .next(),
            details: SubstanceDetails::default(),
        })
    }
}

impl Normalize for SubstanceDetails {
    const ENTITY: &'static str = "substance detail";
    const LIST_KEYS: &'static [&'static str] =
        &["detalles_sustancias", "detalles", "details"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        let substance_id: SubstanceId = fields.id(&[
            "ID_Sustancia",
            "id_sustancia",
            "sustancia_id",
            "substanceId",
            "substance_id",
            "id",
        ])?;
        if substance_id.is_missing() {
            return Err(NormalizeError::MissingField {
                entity: Self::ENTITY,
                field: "substance_id",
            });
        }

        Ok(Self {
            substance_id,
            description: fields.text(&["Descripcion", "descripcion", "description"]),
            consumption_methods: fields.text(&[
                "Metodos_Consumo",
                "metodos_consumo",
                "consumo",
                "consumptionMethods",
                "consumption_methods",
            ]),
            dosage: fields.text(&["Dosis", "dosis", "dosage"]),
            effects: fields.text(&["Efectos", "efectos", "effects"]),
            risks: fields.text(&["Riesgos", "riesgos", "risks"]),
            interactions: fields.text(&["Interacciones", "interacciones", "interactions"]),
            legislation: fields.text(&["Legislacion", "legislacion", "legislation", "legal"]),
        })
    }
}

/// Attach detail sheets to substances by id.
///
/// Substances without a sheet keep empty details; sheets for unknown
/// substances are dropped. If the backend serves two sheets for one
/// substance, the last one wins.
#[must_use]
pub fn merge_details(substances: Vec<Substance>, details: Vec<SubstanceDetails>) -> Vec<Substance> {
    let mut by_id: HashMap<SubstanceId, SubstanceDetails> = details
        .into_iter()
        .map(|sheet| (sheet.substance_id, sheet))
        .collect();

    substances
        .into_iter()
        .map(|mut substance| {
            if let Some(sheet) = by_id.remove(&substance.id) {
                substance.details = sheet;
            } else {
                substance.details.substance_id = substance.id;
            }
            substance
        })
        .collect()
}

impl TableRow for Substance {
    type Id = SubstanceId;

    fn row_id(&self) -> SubstanceId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Borrowed(self.name.as_str())];
        if let Some(title) = &self.title {
            fields.push(Cow::Borrowed(title.as_str()));
        }
        fields
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::parse_list;

    #[test]
    fn test_field_variants_agree() {
        let spanish = json!({
            "ID_Sustancia": 3, "Nombre": "MDMA", "Titulo": "Éxtasis",
            "Formula": "C11H15NO2", "Imagen": "/img/mdma.png"
        });
        let english = json!({
            "id": "3", "name": "MDMA", "title": "Éxtasis",
            "formula": "C11H15NO2", "image": "/img/mdma.png"
        });
        assert_eq!(
            Substance::from_value(&spanish).unwrap(),
            Substance::from_value(&english).unwrap()
        );
    }

    #[test]
    fn test_detail_requires_substance_id() {
        let sheet = json!({ "descripcion": "text" });
        assert!(SubstanceDetails::from_value(&sheet).is_err());
    }

    #[test]
    fn test_merge_by_id() {
        let substances = parse_list::<Substance>(&json!([
            { "id": 1, "nombre": "Cannabis" },
            { "id": 2, "nombre": "Ketamina" },
        ]))
        .unwrap()
        .records;
        let details = parse_list::<SubstanceDetails>(&json!({ "detalles": [
            { "ID_Sustancia": 2, "efectos": "Disociación", "riesgos": "Cistitis" },
            { "ID_Sustancia": 9, "efectos": "Orphan" },
        ]}))
        .unwrap()
        .records;

        let merged = merge_details(substances, details);
        assert_eq!(merged.len(), 2);
        assert!(!merged[0].details.has_content());
        assert_eq!(merged[0].details.substance_id, SubstanceId::new(1));
        assert_eq!(merged[1].details.effects.as_deref(), Some("Disociación"));
        assert_eq!(
            merged[1].details.sections(),
            vec![("Effects", "Disociación"), ("Risks", "Cistitis")]
        );
    }

    #[test]
    fn test_heading() {
        let s = Substance::from_value(&json!({ "name": "LSD", "title": "Ácido" })).unwrap();
        assert_eq!(s.heading(), "LSD - Ácido");
    }
}
