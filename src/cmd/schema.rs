//! Input format introspection for authoring and automation.

use serde::Serialize;

use crate::{Metric, PROFILER_KEY};

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDoc {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "topLevelKey")]
    pub top_level_key: &'static str,
    pub fields: Vec<FieldDoc>,
    #[serde(rename = "minimalExample")]
    pub minimal_example: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDoc {
    pub name: &'static str,
    pub kind: &'static str,
    pub note: &'static str,
}

pub fn schema_doc() -> SchemaDoc {
    let mut fields = vec![FieldDoc {
        name: "Section Name",
        kind: "string",
        note: "not unique; repeated names are separate records",
    }];
    fields.extend(Metric::ALL.into_iter().map(|m| FieldDoc {
        name: m.field(),
        kind: "number|string",
        note: "coerced to a number; missing or non-numeric values are excluded by the threshold filter",
    }));
    fields.push(FieldDoc {
        name: "Timeline",
        kind: "number[]",
        note: "one duration per call; empty timelines are omitted from the timeline chart",
    });

    SchemaDoc {
        schema_version: "profview.input.v1".to_string(),
        top_level_key: PROFILER_KEY,
        fields,
        minimal_example: serde_json::json!({
            "profiler": [
                {
                    "Section Name": "Trig Speed Test",
                    "Avg Time": 0.012,
                    "Max Time": 0.012,
                    "Min Time": 0.012,
                    "Total Time": 0.012,
                    "Timeline": [0.012]
                }
            ]
        }),
    }
}
