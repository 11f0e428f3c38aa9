use parametric::config::EngineSettings;
use parametric::ingest;
use parametric::matcher::SourceSet;
use parametric::qc::scoring::Grade;
use parametric::service::AnalysisService;
use std::io::Cursor;

const MESSY_EXPORT: &str = "\
Module,Part,Item_Name,Value,Min_Spec,Max_Spec,Confidence,Checklist
M1,PSU,Voltage,120,90,110,0.9,Y
M1,PSU,Voltage,121,90,110,0.9,Y
M1,PSU,Current,-,,,,
M1,Fan,9speed,800,,,,
M2,Sensor,Offset,0.5,0,1,0.5,Y
";

fn service() -> AnalysisService {
    AnalysisService::new(EngineSettings::default()).expect("default settings are valid")
}

fn staged() -> SourceSet {
    let mut set = SourceSet::new();
    let records =
        ingest::parse_records(Cursor::new(MESSY_EXPORT), "unit-a").expect("csv parses");
    set.add_source("unit-a", records).expect("unique label");
    set
}

#[test]
fn a_messy_export_is_scored_end_to_end() {
    let service = service();
    let view = service.run_qc(&staged());

    assert_eq!(view.total_items, 5);
    assert!(view.issue_count >= 4);
    assert!(view.scorecard.overall_score < 100.0);
    assert!(view.scorecard.overall_score >= 0.0);
    assert!(!view.scorecard.improvements.is_empty());

    for issue in &view.issues {
        assert!(!issue.recommended_action.is_empty());
        assert!(issue.score_impact > 0.0);
    }
}

#[test]
fn a_clean_export_earns_a_perfect_grade() {
    let service = service();
    let clean = "\
Module,Part,Item_Name,Value,Min_Spec,Max_Spec,Confidence,Checklist
M1,PSU,Voltage,100,90,110,0.95,Y
M1,PSU,Current,2.0,1.0,3.0,0.9,Y
";
    let mut set = SourceSet::new();
    let records = ingest::parse_records(Cursor::new(clean), "unit-a").expect("csv parses");
    set.add_source("unit-a", records).expect("unique label");

    let view = service.run_qc(&set);
    assert_eq!(view.issue_count, 0);
    assert_eq!(view.scorecard.overall_score, 100.0);
    assert_eq!(view.scorecard.grade, Grade::APlus);
}

#[test]
fn scores_never_live_on_the_result() {
    // The run view is recomputed from the result; two derivations agree.
    let service = service();
    let set = staged();

    let result = service.validate(&set);
    let first = service.scoring().scorecard(&result);
    let second = service.scoring().scorecard(&result);
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.category_scores, second.category_scores);

    let json = serde_json::to_value(&result).expect("result serializes");
    assert!(json.get("overall_score").is_none());
    assert!(json.get("category_scores").is_none());
}

#[test]
fn the_view_serializes_with_scorecard_and_issues() {
    let service = service();
    let view = service.run_qc(&staged());

    let json = serde_json::to_value(&view).expect("view serializes");
    assert!(json["scorecard"]["grade_label"].is_string());
    assert!(json["scorecard"]["category_scores"]
        .as_array()
        .is_some_and(|scores| scores.len() == 5));
    assert_eq!(
        json["issues"].as_array().map(|issues| issues.len()),
        Some(view.issue_count)
    );
}
