//! Merge rules (§4.5): folds one piece's normalized LLM output into the
//! running artifact.

use crate::config::OrchestratorConfig;
use crate::core::artifact::{AttributedEntry, Checksheet, Frequency, Item, Step, WorkInstructions};
use crate::core::piece::Source;
use crate::error::{MergeError, Result};
use crate::merger::raw::{RawPieceOutput, find_array, find_str, normalize};
use serde_json::Value;

/// Merges one checksheet piece's output into `checksheet`.
///
/// # Errors
///
/// Returns [`MergeError::UnrecognizedShape`] if the piece's JSON output is
/// neither an array nor an object.
pub fn merge_checksheet_piece(
    checksheet: &mut Checksheet,
    raw: Value,
    source: &Source,
    piece_index: usize,
    config: &OrchestratorConfig,
) -> Result<()> {
    let output = normalize(raw, piece_index)?;
    let items = find_array(&output, &["items", "checklist"]).cloned().unwrap_or_default();

    for entry in items.into_iter().take(config.max_items_per_piece as usize) {
        let Some(obj) = entry.as_object() else { continue };
        let Some(item_name) = obj.get("itemName").or_else(|| obj.get("item_name")).and_then(Value::as_str) else {
            continue;
        };
        let Some(inspection_point) = obj
            .get("inspectionPoint")
            .or_else(|| obj.get("inspection_point"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(expected_status) = obj
            .get("expectedStatus")
            .or_else(|| obj.get("expected_status"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        let frequency = obj
            .get("frequency")
            .and_then(Value::as_str)
            .and_then(parse_frequency)
            .unwrap_or(Frequency::Monthly);
        let notes = obj.get("notes").and_then(Value::as_str).map(str::to_string);

        checksheet.items.push(Item {
            item_name: item_name.to_string(),
            inspection_point: inspection_point.to_string(),
            frequency,
            expected_status: expected_status.to_string(),
            notes,
            source_file: source.file_name.clone(),
            source_page: source.page_number,
        });
    }

    Ok(())
}

fn parse_frequency(raw: &str) -> Option<Frequency> {
    match raw.to_ascii_lowercase().as_str() {
        "daily" => Some(Frequency::Daily),
        "weekly" => Some(Frequency::Weekly),
        "monthly" => Some(Frequency::Monthly),
        "quarterly" => Some(Frequency::Quarterly),
        "annual" | "annually" | "yearly" => Some(Frequency::Annual),
        _ => None,
    }
}

/// Merges one work-instructions piece's output into `wi`.
///
/// # Errors
///
/// Returns [`MergeError::UnrecognizedShape`] if the piece's JSON output is
/// neither an array nor an object.
pub fn merge_work_instructions_piece(
    wi: &mut WorkInstructions,
    raw: Value,
    source: &Source,
    piece_index: usize,
    config: &OrchestratorConfig,
) -> Result<()> {
    let output = normalize(raw, piece_index)?;

    merge_scalar(&mut wi.title, find_str(&output, &["title"]));
    merge_scalar(&mut wi.overview, find_str(&output, &["overview"]));
    if wi.estimated_duration.is_none() {
        wi.estimated_duration = find_str(&output, &["estimatedDuration", "estimated_duration"])
            .map(str::to_string);
    }

    merge_prerequisites(wi, &output);
    merge_steps(wi, &output, source, config);
    merge_attributed_list(
        &mut wi.safety_warnings,
        &output,
        &["safetyWarnings", "safety_warnings"],
        source,
    );
    merge_attributed_list(
        &mut wi.completion_checklist,
        &output,
        &["completionChecklist", "completion_checklist"],
        source,
    );

    Ok(())
}

fn merge_scalar(field: &mut String, candidate: Option<&str>) {
    if field.is_empty() {
        if let Some(value) = candidate {
            if !value.trim().is_empty() {
                *field = value.to_string();
            }
        }
    }
}

fn merge_prerequisites(wi: &mut WorkInstructions, output: &RawPieceOutput) {
    if let Some(tools) = find_array(output, &["tools"]) {
        extend_strings(&mut wi.prerequisites.tools, tools);
    }
    if let Some(materials) = find_array(output, &["materials"]) {
        extend_strings(&mut wi.prerequisites.materials, materials);
    }
    if let Some(safety) = find_array(output, &["safety", "safetyPrecautions", "safety_precautions"]) {
        extend_strings(&mut wi.prerequisites.safety, safety);
    }

    if let RawPieceOutput::Object(map) = output {
        if let Some(nested) = map.get("prerequisites").and_then(Value::as_object) {
            if let Some(tools) = nested.get("tools").and_then(Value::as_array) {
                extend_strings(&mut wi.prerequisites.tools, tools);
            }
            if let Some(materials) = nested.get("materials").and_then(Value::as_array) {
                extend_strings(&mut wi.prerequisites.materials, materials);
            }
            if let Some(safety) = nested.get("safety").and_then(Value::as_array) {
                extend_strings(&mut wi.prerequisites.safety, safety);
            }
        }
    }
}

fn extend_strings(field: &mut Vec<String>, values: &[Value]) {
    for value in values {
        if let Some(s) = value.as_str() {
            field.push(s.to_string());
        }
    }
}

fn merge_steps(
    wi: &mut WorkInstructions,
    output: &RawPieceOutput,
    source: &Source,
    config: &OrchestratorConfig,
) {
    let Some(steps) = find_array(output, &["steps"]) else { return };

    for entry in steps.iter().take(config.max_steps_per_piece as usize) {
        let Some(obj) = entry.as_object() else { continue };
        let Some(description) = obj.get("description").and_then(Value::as_str) else { continue };

        wi.steps.push(Step {
            // Renumbered contiguously in `finalize`; placeholder ordinal here.
            step_number: u32::try_from(wi.steps.len()).unwrap_or(u32::MAX) + 1,
            title: obj.get("title").and_then(Value::as_str).map(str::to_string),
            description: description.to_string(),
            details: obj.get("details").and_then(Value::as_str).map(str::to_string),
            warning: obj.get("warning").and_then(Value::as_str).map(str::to_string),
            source_file: source.file_name.clone(),
            source_page: source.page_number,
        });
    }
}

fn merge_attributed_list(
    field: &mut Vec<AttributedEntry>,
    output: &RawPieceOutput,
    keys: &[&str],
    source: &Source,
) {
    let Some(entries) = find_array(output, keys) else { return };
    for entry in entries {
        let text = match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        if let Some(text) = text {
            if !text.trim().is_empty() {
                field.push(AttributedEntry {
                    text,
                    source_file: source.file_name.clone(),
                    source_page: source.page_number,
                });
            }
        }
    }
}

/// Final merge pass, run once after every piece has been processed (§4.5):
/// de-duplicates prerequisite lists and safety/checklist entries preserving
/// first-seen order, renumbers steps to a contiguous `1..M` sequence, and
/// repairs a still-empty title when other fields have content.
pub fn finalize_work_instructions(wi: &mut WorkInstructions) {
    dedupe_preserving_order(&mut wi.prerequisites.tools);
    dedupe_preserving_order(&mut wi.prerequisites.materials);
    dedupe_preserving_order(&mut wi.prerequisites.safety);
    dedupe_attributed_preserving_order(&mut wi.safety_warnings);
    dedupe_attributed_preserving_order(&mut wi.completion_checklist);

    for (i, step) in wi.steps.iter_mut().enumerate() {
        step.step_number = u32::try_from(i + 1).unwrap_or(u32::MAX);
    }

    if wi.title.is_empty() && !wi.is_empty() {
        wi.title = "Work Instructions".to_string();
    }
}

fn dedupe_preserving_order(field: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    field.retain(|item| seen.insert(item.clone()));
}

fn dedupe_attributed_preserving_order(field: &mut Vec<AttributedEntry>) {
    let mut seen = std::collections::HashSet::new();
    field.retain(|entry| seen.insert(entry.text.clone()));
}

/// Fails the generation if the merged checksheet has no items.
///
/// # Errors
///
/// Returns [`MergeError::MergeEmpty`] when empty.
pub fn ensure_checksheet_not_empty(checksheet: &Checksheet, pieces_processed: usize) -> Result<()> {
    if checksheet.is_empty() {
        return Err(MergeError::MergeEmpty { pieces_processed }.into());
    }
    Ok(())
}

/// Fails the generation if the merged work instructions have no content in
/// any field, per the emptiness rule (§4.5).
///
/// # Errors
///
/// Returns [`MergeError::MergeEmpty`] when empty.
pub fn ensure_work_instructions_not_empty(
    wi: &WorkInstructions,
    pieces_processed: usize,
) -> Result<()> {
    if wi.is_empty() {
        return Err(MergeError::MergeEmpty { pieces_processed }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> Source {
        Source {
            file_name: "A.pdf".to_string(),
            page_number: Some(3),
        }
    }

    #[test]
    fn test_merge_checksheet_piece_appends_items() {
        let mut sheet = Checksheet::default();
        let config = OrchestratorConfig::default();
        let raw = json!({"items": [{
            "itemName": "Oil",
            "inspectionPoint": "Level",
            "frequency": "Daily",
            "expectedStatus": "Full",
            "notes": "check seal"
        }]});
        merge_checksheet_piece(&mut sheet, raw, &source(), 0, &config).unwrap();
        assert_eq!(sheet.items.len(), 1);
        assert_eq!(sheet.items[0].source_file, "A.pdf");
        assert_eq!(sheet.items[0].frequency, Frequency::Daily);
    }

    #[test]
    fn test_merge_checksheet_piece_respects_cap() {
        let mut sheet = Checksheet::default();
        let config = OrchestratorConfig {
            max_items_per_piece: 1,
            ..Default::default()
        };
        let raw = json!([
            {"itemName": "A", "inspectionPoint": "p", "expectedStatus": "ok"},
            {"itemName": "B", "inspectionPoint": "p", "expectedStatus": "ok"}
        ]);
        merge_checksheet_piece(&mut sheet, raw, &source(), 0, &config).unwrap();
        assert_eq!(sheet.items.len(), 1);
    }

    #[test]
    fn test_merge_scalar_only_accepted_if_unset() {
        let mut wi = WorkInstructions::default();
        let config = OrchestratorConfig::default();
        merge_work_instructions_piece(&mut wi, json!({"title": "First"}), &source(), 0, &config).unwrap();
        merge_work_instructions_piece(&mut wi, json!({"title": "Second"}), &source(), 1, &config).unwrap();
        assert_eq!(wi.title, "First");
    }

    #[test]
    fn test_merge_prerequisites_union() {
        let mut wi = WorkInstructions::default();
        let config = OrchestratorConfig::default();
        merge_work_instructions_piece(
            &mut wi,
            json!({"tools": ["Wrench"], "materials": ["Filter"]}),
            &source(),
            0,
            &config,
        )
        .unwrap();
        merge_work_instructions_piece(
            &mut wi,
            json!({"tools": ["Wrench", "Gloves"]}),
            &source(),
            1,
            &config,
        )
        .unwrap();
        finalize_work_instructions(&mut wi);
        assert_eq!(wi.prerequisites.tools, vec!["Wrench".to_string(), "Gloves".to_string()]);
    }

    #[test]
    fn test_merge_steps_then_finalize_renumbers_contiguously() {
        let mut wi = WorkInstructions::default();
        let config = OrchestratorConfig {
            max_steps_per_piece: 2,
            ..Default::default()
        };
        merge_work_instructions_piece(
            &mut wi,
            json!({"steps": [{"description": "Step A"}, {"description": "Step B"}]}),
            &source(),
            0,
            &config,
        )
        .unwrap();
        merge_work_instructions_piece(
            &mut wi,
            json!({"steps": [{"description": "Step C"}]}),
            &source(),
            1,
            &config,
        )
        .unwrap();
        finalize_work_instructions(&mut wi);
        assert_eq!(wi.steps.len(), 3);
        assert_eq!(wi.steps[0].step_number, 1);
        assert_eq!(wi.steps[1].step_number, 2);
        assert_eq!(wi.steps[2].step_number, 3);
    }

    #[test]
    fn test_merge_safety_warnings_dedupe_first_wins() {
        let mut wi = WorkInstructions::default();
        let config = OrchestratorConfig::default();
        merge_work_instructions_piece(
            &mut wi,
            json!({"safetyWarnings": ["Wear gloves"]}),
            &source(),
            0,
            &config,
        )
        .unwrap();
        merge_work_instructions_piece(
            &mut wi,
            json!({"safetyWarnings": ["Wear gloves", "Disconnect power"]}),
            &source(),
            1,
            &config,
        )
        .unwrap();
        finalize_work_instructions(&mut wi);
        assert_eq!(wi.safety_warnings.len(), 2);
    }

    #[test]
    fn test_missing_field_repair_sets_default_title() {
        let mut wi = WorkInstructions::default();
        wi.overview = "Replace the oil filter.".to_string();
        finalize_work_instructions(&mut wi);
        assert_eq!(wi.title, "Work Instructions");
    }

    #[test]
    fn test_ensure_not_empty_fails_on_empty_checksheet() {
        let sheet = Checksheet::default();
        assert!(ensure_checksheet_not_empty(&sheet, 15).is_err());
    }

    #[test]
    fn test_ensure_not_empty_passes_with_content() {
        let mut wi = WorkInstructions::default();
        wi.title = "Replace filter".to_string();
        assert!(ensure_work_instructions_not_empty(&wi, 15).is_ok());
    }

    #[test]
    fn test_idempotent_merge_empty_then_value() {
        let config = OrchestratorConfig::default();
        let mut a = WorkInstructions::default();
        merge_work_instructions_piece(&mut a, json!({}), &source(), 0, &config).unwrap();
        merge_work_instructions_piece(&mut a, json!({"title": "X"}), &source(), 1, &config).unwrap();

        let mut b = WorkInstructions::default();
        merge_work_instructions_piece(&mut b, json!({"title": "X"}), &source(), 0, &config).unwrap();

        assert_eq!(a.title, b.title);
    }
}
