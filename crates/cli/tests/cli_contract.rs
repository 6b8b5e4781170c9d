use assert_cmd::cargo::cargo_bin_cmd;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Write a minimal two-page A4 document fixture.
fn write_sample_pdf(dir: &Path) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..2 {
        let content =
            Content { operations: vec![Operation::new("q", vec![]), Operation::new("Q", vec![])] };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => 2 }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("sample.pdf");
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("document should serialize");
    fs::write(&path, bytes).expect("fixture should be written");
    path
}

fn write_strokes_json(dir: &Path, payload: &Value) -> PathBuf {
    let path = dir.join("strokes.json");
    fs::write(&path, serde_json::to_vec_pretty(payload).expect("json")).expect("strokes written");
    path
}

fn valid_strokes() -> Value {
    json!({
        "version": 1,
        "strokes": [
            {
                "page": 1,
                "color": "#FF0000",
                "points": [{"x": 10.0, "y": 20.0}, {"x": 110.0, "y": 20.0}]
            },
            {
                "page": 2,
                "color": "#0000FF",
                "points": [{"x": 50.0, "y": 50.0}, {"x": 90.0, "y": 120.0}, {"x": 150.0, "y": 120.0}]
            }
        ]
    })
}

#[test]
fn info_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());

    let output = cargo_bin_cmd!("redline-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["first_page_size_pt"]["width"], 595.0);
    assert_eq!(value["first_page_size_pt"]["height"], 842.0);
}

#[test]
fn annotate_writes_a_reloadable_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());
    let strokes = write_strokes_json(temp.path(), &valid_strokes());
    let output_path = temp.path().join("annotated.pdf");

    cargo_bin_cmd!("redline-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--strokes")
        .arg(&strokes)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let bytes = fs::read(&output_path).expect("annotated output should exist");
    let doc = Document::load_mem(&bytes).expect("output should stay a valid PDF");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn flatten_writes_an_image_pdf_with_same_page_count() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());
    let strokes = write_strokes_json(temp.path(), &valid_strokes());
    let output_path = temp.path().join("flat.pdf");

    cargo_bin_cmd!("redline-cli")
        .arg("flatten")
        .arg(&pdf)
        .arg("--strokes")
        .arg(&strokes)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let bytes = fs::read(&output_path).expect("flattened output should exist");
    let doc = Document::load_mem(&bytes).expect("output should stay a valid PDF");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn info_fails_for_missing_file() {
    cargo_bin_cmd!("redline-cli")
        .arg("info")
        .arg("definitely-missing.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn annotate_rejects_malformed_strokes_without_writing_output() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());
    let strokes = temp.path().join("strokes.json");
    fs::write(&strokes, b"{ not json").expect("strokes written");
    let output_path = temp.path().join("annotated.pdf");

    cargo_bin_cmd!("redline-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--strokes")
        .arg(&strokes)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("strokes file is not valid strokes JSON"));

    assert!(!output_path.exists(), "a failed export must not leave a partial file");
}

#[test]
fn annotate_rejects_single_point_strokes() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());
    let payload = json!({
        "version": 1,
        "strokes": [{"page": 1, "color": "", "points": [{"x": 1.0, "y": 1.0}]}]
    });
    let strokes = write_strokes_json(temp.path(), &payload);

    cargo_bin_cmd!("redline-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--strokes")
        .arg(&strokes)
        .arg("--output")
        .arg(temp.path().join("out.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2 finite points"));
}

#[test]
fn unsupported_strokes_schema_version_fails() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path());
    let payload = json!({ "version": 99, "strokes": [] });
    let strokes = write_strokes_json(temp.path(), &payload);

    cargo_bin_cmd!("redline-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--strokes")
        .arg(&strokes)
        .arg("--output")
        .arg(temp.path().join("out.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported strokes schema version"));
}
