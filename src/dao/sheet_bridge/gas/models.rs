use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    dao::models::{LoadedCompetitor, LoadedSheet, SHEET_LAYOUT_VERSION, SheetDocument},
    state::division::Division,
};

/// Read a division back from its sheet.
pub const ACTION_LOAD: &str = "load";
/// Overwrite a division sheet.
pub const ACTION_SAVE: &str = "save";
/// Copy a division sheet aside once the competition is over.
pub const ACTION_ARCHIVE: &str = "archive";

/// Body of every POST sent to the web app.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasActionRequest {
    /// Division the action applies to.
    pub gender: Division,
    /// One of the `ACTION_*` names.
    pub action: &'static str,
    /// Sheet contents, only sent with `save`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<GasNewState>,
}

/// Division contents in the row-array shape the script writes verbatim.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasNewState {
    pub competition_name: String,
    /// One cell array per competitor, in column order.
    pub players: Vec<Vec<Value>>,
    /// Column layout the rows were written with.
    pub layout_version: u32,
}

impl From<SheetDocument> for GasNewState {
    fn from(document: SheetDocument) -> Self {
        Self {
            competition_name: document.competition_name,
            players: document.rows.iter().map(|row| row.to_cells()).collect(),
            layout_version: SHEET_LAYOUT_VERSION,
        }
    }
}

/// Envelope returned by the script for every action.
#[derive(Debug, Deserialize)]
pub struct GasResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasSheetData {
    #[serde(default)]
    pub competition_name: Option<String>,
    pub players: Vec<GasPlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPlayer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub player_class: Option<String>,
    #[serde(default)]
    pub player_group: Option<String>,
    #[serde(default)]
    pub scores: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub total: Option<Value>,
}

impl From<GasSheetData> for LoadedSheet {
    fn from(data: GasSheetData) -> Self {
        Self {
            competition_name: data.competition_name.unwrap_or_default(),
            competitors: data.players.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<GasPlayer> for LoadedCompetitor {
    fn from(player: GasPlayer) -> Self {
        Self {
            name: player.name,
            class: player.player_class,
            group: player.player_group,
            scores: player.scores.unwrap_or_default(),
            total: player.total.as_ref().and_then(value_as_f64),
        }
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::models::SheetRow;

    #[test]
    fn save_request_uses_script_field_names() {
        let request = GasActionRequest {
            gender: Division::Women,
            action: ACTION_SAVE,
            new_state: Some(
                SheetDocument {
                    competition_name: "Spring Cup".into(),
                    rows: vec![SheetRow {
                        class: "上級".into(),
                        group: "1組".into(),
                        name: "Aiko".into(),
                        scores: vec![9.5, 0.0, 0.0, 8.0],
                    }],
                }
                .into(),
            ),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "gender": "women",
                "action": "save",
                "newState": {
                    "competitionName": "Spring Cup",
                    "players": [["上級", "1組", "", "Aiko", 9.5, 0.0, 0.0, 8.0]],
                    "layoutVersion": 1
                }
            })
        );
    }

    #[test]
    fn archive_request_has_no_state() {
        let request = GasActionRequest {
            gender: Division::Men,
            action: ACTION_ARCHIVE,
            new_state: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "gender": "men", "action": "archive" })
        );
    }

    #[test]
    fn load_response_tolerates_missing_fields() {
        let raw = json!({
            "success": true,
            "data": {
                "competitionName": "Autumn Open",
                "players": [
                    { "name": "Ken", "playerClass": "上級", "scores": { "floor": "9.2" }, "total": "9.2" },
                    {}
                ]
            }
        });
        let response: GasResponse<GasSheetData> = serde_json::from_value(raw).unwrap();
        assert!(response.success);

        let sheet: LoadedSheet = response.data.unwrap().into();
        assert_eq!(sheet.competition_name, "Autumn Open");
        assert_eq!(sheet.competitors.len(), 2);
        assert_eq!(sheet.competitors[0].total, Some(9.2));
        assert_eq!(sheet.competitors[0].group, None);
        assert!(sheet.competitors[1].scores.is_empty());
    }

    #[test]
    fn failure_envelope_keeps_message() {
        let response: GasResponse<GasSheetData> =
            serde_json::from_value(json!({ "success": false, "message": "sheet locked" }))
                .unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("sheet locked"));
        assert!(response.data.is_none());
    }
}
