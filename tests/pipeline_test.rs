use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, TimeZone};
use regex::Regex;
use pdf_extract_ai::models::{FindingValue, Synthesis, SynthesisResult};
use pdf_extract_ai::services::report_writer::{self, AI_SHEET_NAME, RAW_SHEET_NAME};
use pdf_extract_ai::services::ProgressSink;
use pdf_extract_ai::{
    run_batch, App, AppError, Config, DocumentAnalyzer, ExtractionRecord, Findings,
    ProcessingError,
};

/// 以文本首行作为 summary 的分析器，文本含 "BROKEN" 时模拟解析失败
#[derive(Default)]
struct FakeAnalyzer {
    calls: Mutex<usize>,
}

impl DocumentAnalyzer for FakeAnalyzer {
    async fn analyze_one(&self, text: &str) -> Result<Findings, ProcessingError> {
        *self.calls.lock().unwrap() += 1;
        if text.contains("BROKEN") {
            return Err(ProcessingError::with_raw_response(
                "无法解析 AI 响应",
                "not json at all",
            ));
        }
        let first_line = text.lines().next().unwrap_or_default();
        Ok([
            ("summary", FindingValue::from(first_line)),
            (
                "methods",
                FindingValue::List(vec![FindingValue::from("survey")]),
            ),
        ]
        .into_iter()
        .collect())
    }

    async fn synthesize(&self, findings: &[&Findings]) -> anyhow::Result<SynthesisResult> {
        Ok(SynthesisResult {
            analysis: FindingValue::Text(format!("{} documents agree", findings.len())),
        })
    }
}

struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn processing(&self, _filename: &str) {}
    fn failed(&self, _filename: &str, _error: &str, _raw_response: Option<&str>) {}
}

fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// 共享字符串表，按索引排列
fn shared_strings(path: &Path) -> Vec<String> {
    let xml = read_entry(path, "xl/sharedStrings.xml");
    let re = Regex::new(r"(?s)<si>\s*<t[^>]*>(.*?)</t>\s*</si>").unwrap();
    re.captures_iter(&xml).map(|caps| caps[1].to_string()).collect()
}

/// 某张表 A 列的文本，按行排列
fn first_column(path: &Path, sheet: &str) -> Vec<String> {
    let strings = shared_strings(path);
    let xml = read_entry(path, sheet);
    let re = Regex::new(r#"<c r="A\d+"[^>]*?t="s"[^>]*><v>(\d+)</v>"#).unwrap();
    re.captures_iter(&xml)
        .map(|caps| strings[caps[1].parse::<usize>().unwrap()].clone())
        .collect()
}

fn row_count(path: &Path, sheet: &str) -> usize {
    read_entry(path, sheet).matches("<row ").count()
}

fn sample_records() -> Vec<ExtractionRecord> {
    vec![
        ExtractionRecord::new("a.pdf", "Study shows X improves Y.\nMore text.", 3),
        ExtractionRecord::new("scan.pdf", "", 0),
        ExtractionRecord::new("b.pdf", "BROKEN output", 1),
    ]
}

#[tokio::test]
async fn test_batch_to_report() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = FakeAnalyzer::default();
    let records = sample_records();

    let outcome = run_batch(&analyzer, &SilentProgress, &records, 2)
        .await
        .unwrap();

    assert_eq!(*analyzer.calls.lock().unwrap(), 2);
    assert_eq!(outcome.success_count(), 1);
    assert_eq!(outcome.failure_count(), 1);
    assert!(matches!(outcome.synthesis, Synthesis::Completed(_)));

    let timestamp = Local.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
    let path = report_writer::assemble_at(&records, &outcome.analyses, dir.path(), timestamp)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "pdf_extracts_ai_20240131_235959.xlsx"
    );

    let workbook = read_entry(&path, "xl/workbook.xml");
    assert!(workbook.contains(RAW_SHEET_NAME));
    assert!(workbook.contains(AI_SHEET_NAME));

    let strings = read_entry(&path, "xl/sharedStrings.xml");
    for expected in [
        "filename",
        "scan.pdf",
        "summary",
        "methods",
        "error",
        "raw_response",
        "Study shows X improves Y.",
        "not json at all",
    ] {
        assert!(strings.contains(expected), "缺少单元格内容: {}", expected);
    }

    // Raw Data 每个 PDF 一行，AI Analysis 不含无文本的文档
    assert_eq!(row_count(&path, "xl/worksheets/sheet1.xml"), 4);
    assert_eq!(row_count(&path, "xl/worksheets/sheet2.xml"), 3);
    assert_eq!(
        first_column(&path, "xl/worksheets/sheet1.xml"),
        vec!["filename", "a.pdf", "scan.pdf", "b.pdf"]
    );
    assert_eq!(
        first_column(&path, "xl/worksheets/sheet2.xml"),
        vec!["filename", "a.pdf", "b.pdf"]
    );
}

#[tokio::test]
async fn test_single_record_gives_one_row_per_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = FakeAnalyzer::default();
    let records = vec![ExtractionRecord::new("a.pdf", "Study shows X improves Y.", 1)];

    let outcome = run_batch(&analyzer, &SilentProgress, &records, 1)
        .await
        .unwrap();
    let path = report_writer::assemble(&records, &outcome.analyses, dir.path()).unwrap();

    assert_eq!(row_count(&path, "xl/worksheets/sheet1.xml"), 2);
    assert_eq!(row_count(&path, "xl/worksheets/sheet2.xml"), 2);
    assert_eq!(
        first_column(&path, "xl/worksheets/sheet2.xml"),
        vec!["filename", "a.pdf"]
    );
}

#[tokio::test]
async fn test_same_inputs_write_distinct_files_with_same_content() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = FakeAnalyzer::default();
    let records = sample_records();
    let outcome = run_batch(&analyzer, &SilentProgress, &records, 1)
        .await
        .unwrap();

    let first = Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let second = Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap();
    let path_a = report_writer::assemble_at(&records, &outcome.analyses, dir.path(), first)
        .unwrap();
    let path_b = report_writer::assemble_at(&records, &outcome.analyses, dir.path(), second)
        .unwrap();

    assert_ne!(path_a, path_b);
    for sheet in ["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"] {
        assert_eq!(read_entry(&path_a, sheet), read_entry(&path_b, sheet));
    }
}

#[test]
fn test_empty_inputs_write_header_only_sheets() {
    let dir = tempfile::tempdir().unwrap();

    let path = report_writer::assemble(&[], &[], dir.path()).unwrap();

    let workbook = read_entry(&path, "xl/workbook.xml");
    assert!(workbook.contains(RAW_SHEET_NAME));
    assert!(workbook.contains(AI_SHEET_NAME));
    assert!(read_entry(&path, "xl/sharedStrings.xml").contains("filename"));
}

#[tokio::test]
async fn test_all_empty_batch_writes_nothing() {
    let analyzer = FakeAnalyzer::default();
    let records = vec![
        ExtractionRecord::new("scan1.pdf", "", 0),
        ExtractionRecord::new("scan2.pdf", " \n", 1),
    ];

    let err = run_batch(&analyzer, &SilentProgress, &records, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmptyBatch));
    assert_eq!(*analyzer.calls.lock().unwrap(), 0);
}

fn offline_config(inputs: &Path, output_dir: &Path) -> Config {
    Config {
        llm_api_key: "sk-offline".to_string(),
        pdf_inputs: vec![inputs.to_path_buf()],
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_app_without_text_writes_no_report() {
    let inputs = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(inputs.path().join("scan.pdf"), b"not really a pdf").unwrap();

    let err = App::initialize(offline_config(inputs.path(), output.path()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmptyBatch));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_app_without_uploads_writes_no_report() {
    let inputs = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let err = App::initialize(offline_config(inputs.path(), output.path()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmptyBatch));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
#[ignore] // 需要 OPENROUTER_API_KEY 和 uploads/ 下的 PDF：cargo test -- --ignored
async fn test_full_run_against_live_service() {
    pdf_extract_ai::utils::logging::init();

    let mut config = pdf_extract_ai::Config::load().expect("加载配置失败");
    let dir = tempfile::tempdir().unwrap();
    config.output_dir = dir.path().to_path_buf();

    let summary = pdf_extract_ai::App::initialize(config)
        .run()
        .await
        .expect("运行失败");

    assert!(summary.report_path.exists());
    assert!(summary.analyzed + summary.failed <= summary.documents);
}
