//! Analysis Reporter over a persisted table

use std::fs;
use tempfile::TempDir;
use xai_study::analysis::{compare_phases, AnalysisReport};
use xai_study::session::TeachingPhase;
use xai_study::Error;

const HEADER: &str = "index,user_id,user_name,class_name,prototype_id,image_name,user_selection,\
                      teaching_phase,testing_phase_class_shown,testing_phase_user_answer\n";

fn table(rows: &[&str]) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("user_guesses.csv");
    let mut text = HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    (dir, path)
}

fn study_rows() -> Vec<&'static str> {
    vec![
        "1,1,Alice,Gadwall,,g.jpg,I don't know,treatment1,Gadwall,Gadwall",
        "2,1,Alice,Mallard,,m.jpg,Mallard,treatment1,Mallard,Mallard",
        "3,1,Alice,Teal,,t.jpg,Gadwall,treatment1,Teal,Gadwall",
        "1,2,Bob,Gadwall,,g.jpg,Gadwall,treatment2,Gadwall,Gadwall",
        "2,2,Bob,Mallard,,m.jpg,I don't know,treatment2,Mallard,I don't know",
        "3,2,Bob,Teal,,t.jpg,Teal,treatment2,Teal,Mallard",
        "1,3,Carol,Gadwall,,g.jpg,Mallard,control,Gadwall,Mallard",
        "2,3,Carol,Mallard,,m.jpg,Mallard,control,,",
        "1,4,Dave,Gadwall,,g.jpg,Gadwall,,,",
    ]
}

#[test]
fn test_confusion_cell_matches_count() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();

    let gadwall = "Gadwall".to_string();
    assert_eq!(report.confusion.count(&gadwall, &gadwall), 2);
    assert_eq!(report.confusion.count(&"Teal".to_string(), &gadwall), 1);
    assert_eq!(report.confusion.count(&"Mallard".to_string(), &"I don't know".to_string()), 1);
}

#[test]
fn test_accuracy_by_phase() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();

    let by_phase: Vec<(TeachingPhase, usize)> = report
        .accuracy_by_phase
        .iter()
        .map(|g| (g.key, g.count))
        .collect();
    assert_eq!(
        by_phase,
        vec![
            (TeachingPhase::Control, 2),
            (TeachingPhase::Treatment1, 3),
            (TeachingPhase::Treatment2, 3),
        ]
    );
    assert!((report.accuracy_by_phase[1].accuracy - 2.0 / 3.0).abs() < 1e-12);
    assert!((report.accuracy_by_phase[2].accuracy - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(report.accuracy_by_phase[0].accuracy, 0.0);
}

#[test]
fn test_participant_and_class_groupings() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();

    assert_eq!(report.accuracy_by_participant.len(), 3);
    let carol = report
        .accuracy_by_participant
        .iter()
        .find(|g| g.key.0 == "Carol")
        .unwrap();
    assert_eq!(carol.key.1, TeachingPhase::Control);

    let gadwall_t2 = report
        .accuracy_by_class
        .iter()
        .find(|g| g.key == ("Gadwall".to_string(), TeachingPhase::Treatment2))
        .unwrap();
    assert_eq!(gadwall_t2.accuracy, 1.0);
}

#[test]
fn test_overview_counts_everything() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();

    assert_eq!(report.overview.total_records, 9);
    assert_eq!(report.overview.unique_users, 4);
    assert_eq!(report.overview.unique_classes, 3);
}

#[test]
fn test_treatment_comparison_reported() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();

    // treatment1 = [1, 1, 0], treatment2 = [1, 0, 0]
    let t = report.treatment_comparison.unwrap();
    assert!(t.statistic > 0.0);
    assert!(t.p_value > 0.05);
    assert!(!t.significant);
}

#[test]
fn test_identical_groups_give_p_one() {
    let (_dir, path) = table(&[
        "1,1,A,Gadwall,,g.jpg,x,treatment1,Gadwall,Gadwall",
        "2,1,A,Mallard,,m.jpg,x,treatment1,Mallard,Teal",
        "1,2,B,Gadwall,,g.jpg,x,treatment2,Gadwall,Gadwall",
        "2,2,B,Mallard,,m.jpg,x,treatment2,Mallard,Teal",
    ]);
    let report = AnalysisReport::load(&path).unwrap();
    let t = report.treatment_comparison.unwrap();
    assert!(t.statistic.abs() < 1e-12);
    assert!((t.p_value - 1.0).abs() < 1e-9);
    assert!(!t.significant);
}

#[test]
fn test_small_group_has_no_comparison() {
    let (_dir, path) = table(&[
        "1,1,A,Gadwall,,g.jpg,x,treatment1,Gadwall,Gadwall",
        "1,2,B,Gadwall,,g.jpg,x,treatment2,Gadwall,Gadwall",
        "2,2,B,Mallard,,m.jpg,x,treatment2,Mallard,Teal",
    ]);
    let report = AnalysisReport::load(&path).unwrap();
    assert!(report.treatment_comparison.is_none());
    assert!(report.to_string().contains("unavailable"));
}

#[test]
fn test_compare_phases_requires_two_rows() {
    assert!(matches!(
        compare_phases(&[], TeachingPhase::Control, TeachingPhase::Treatment1),
        Err(Error::InsufficientData(_))
    ));
}

#[test]
fn test_missing_table_is_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let result = AnalysisReport::load(dir.path().join("none.csv"));
    assert!(matches!(result, Err(Error::InsufficientData(_))));
}

#[test]
fn test_json_report() {
    let (_dir, path) = table(&study_rows());
    let report = AnalysisReport::load(&path).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["overview"]["total_records"], 9);
    assert_eq!(json["accuracy_by_phase"][0]["key"], "control");
    assert!(json["treatment_comparison"]["p_value"].is_number());
}
