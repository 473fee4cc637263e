//! Tests for ValidationService over descriptor files on disk

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use deskmenu::application::services::ValidationService;
use deskmenu::domain::Severity;
use deskmenu::infrastructure::traits::RealFileSystem;

fn write_descriptor(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write descriptor");
    path
}

fn service() -> ValidationService {
    ValidationService::new(Arc::new(RealFileSystem))
}

#[test]
fn given_complete_application_when_validating_then_no_diagnostics() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = write_descriptor(
        &temp,
        "editor.desktop",
        "[Desktop Entry]
Encoding=UTF-8
Type=Application
Name=Editor
Name[de]=Bearbeiter
Comment=Edit text files
Exec=editor %U
Icon=editor.png
Terminal=false
Categories=Utility;TextEditor;
",
    );

    // Act
    let report = service().validate_file(&path).unwrap();

    // Assert
    assert!(report.diagnostics().is_empty(), "{:?}", report.diagnostics());
}

#[test]
fn given_directory_descriptor_when_validating_then_not_fatal() {
    let temp = TempDir::new().unwrap();
    let path = write_descriptor(
        &temp,
        "games.directory",
        "[Desktop Entry]\nEncoding=UTF-8\nType=Directory\nName=Games\nIcon=games.png\n",
    );

    let report = service().validate_file(&path).unwrap();

    assert!(!report.is_fatal());
}

#[rstest]
#[case::missing_main_section("[Other]\nName=x\n")]
#[case::unknown_key("[Desktop Entry]\nEncoding=UTF-8\nType=Application\nName=x\nColour=red\n")]
#[case::bad_type("[Desktop Entry]\nEncoding=UTF-8\nType=Program\nName=x\n")]
#[case::not_a_key_file("just some text\n")]
fn given_broken_descriptor_when_validating_then_fatal(#[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = write_descriptor(&temp, "broken.desktop", content);

    let report = service().validate_file(&path).unwrap();

    assert!(report.is_fatal(), "{:?}", report.diagnostics());
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Error));
}
