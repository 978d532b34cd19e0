//! Excel 报告写入 - 业务能力层
//!
//! 把原始提取记录和 AI 结果写成一个含两张表的工作簿：
//! - `Raw Data`: 每个 PDF 一行（含无文本的文档）
//! - `AI Analysis`: 每个分析过的文档一行，列为所有结果键的并集
//!
//! 写入先落到目标目录下的临时文件，再原子重命名，失败时不会留下半成品。

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::error::ReportError;
use crate::models::{CellRef, DocumentAnalysis, ExtractionRecord, FindingValue};

pub const RAW_SHEET_NAME: &str = "Raw Data";
pub const AI_SHEET_NAME: &str = "AI Analysis";
pub const FILENAME_COLUMN: &str = "filename";
/// 结果中自带的 `filename` 键改写到这一列，避免与文档标识列冲突
pub const FINDING_FILENAME_COLUMN: &str = "finding_filename";

const RAW_COLUMNS: [&str; 3] = [FILENAME_COLUMN, "text", "pages"];

/// Excel 单元格最多容纳的字符数
const MAX_CELL_CHARS: usize = 32_767;

/// 文件名冲突时最多尝试的后缀数量
const MAX_NAME_ATTEMPTS: usize = 100;

/// 写入报告，时间戳取当前本地时间
///
/// # 返回
/// 返回最终写入的文件路径
pub fn assemble(
    raw: &[ExtractionRecord],
    analyses: &[DocumentAnalysis],
    destination_dir: &Path,
) -> Result<PathBuf, ReportError> {
    assemble_at(raw, analyses, destination_dir, Local::now())
}

/// 使用指定时间戳写入报告
pub fn assemble_at(
    raw: &[ExtractionRecord],
    analyses: &[DocumentAnalysis],
    destination_dir: &Path,
    timestamp: DateTime<Local>,
) -> Result<PathBuf, ReportError> {
    check_destination(destination_dir)?;

    let mut workbook = build_workbook(raw, analyses)?;
    let bytes = workbook.save_to_buffer()?;
    debug!("工作簿大小: {} 字节", bytes.len());

    let path = persist_atomically(&bytes, destination_dir, &report_file_stem(timestamp))?;
    info!("💾 报告已写入: {}", path.display());
    Ok(path)
}

/// `pdf_extracts_ai_20240131_235959`
pub fn report_file_stem(timestamp: DateTime<Local>) -> String {
    format!("pdf_extracts_ai_{}", timestamp.format("%Y%m%d_%H%M%S"))
}

/// AI 结果表的列：`filename` 在前，其余按首次出现顺序合并
pub fn ai_columns(analyses: &[DocumentAnalysis]) -> Vec<String> {
    let mut columns = vec![FILENAME_COLUMN.to_string()];
    for analysis in analyses {
        for key in analysis.result.columns() {
            let column = column_for_key(key);
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// 取某个文档在结果表某列的值（不含第一列的文档标识）
pub fn ai_cell<'a>(analysis: &'a DocumentAnalysis, column: &str) -> Option<CellRef<'a>> {
    let key = if column == FINDING_FILENAME_COLUMN {
        FILENAME_COLUMN
    } else {
        column
    };
    analysis.result.cell(key)
}

fn column_for_key(key: &str) -> &str {
    if key == FILENAME_COLUMN {
        FINDING_FILENAME_COLUMN
    } else {
        key
    }
}

fn check_destination(dir: &Path) -> Result<(), ReportError> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ReportError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ReportError::DestinationNotFound {
            path: dir.to_path_buf(),
        }),
        Err(e) => Err(ReportError::io(dir, e)),
    }
}

fn build_workbook(
    raw: &[ExtractionRecord],
    analyses: &[DocumentAnalysis],
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let raw_sheet = workbook.add_worksheet();
    raw_sheet.set_name(RAW_SHEET_NAME)?;
    write_header(raw_sheet, &RAW_COLUMNS, &header)?;
    for (idx, record) in raw.iter().enumerate() {
        let row = row_num(idx + 1);
        write_text(raw_sheet, row, 0, &record.filename)?;
        write_text(raw_sheet, row, 1, &record.text)?;
        raw_sheet.write_number(row, 2, record.pages as f64)?;
    }

    let columns = ai_columns(analyses);
    let ai_sheet = workbook.add_worksheet();
    ai_sheet.set_name(AI_SHEET_NAME)?;
    write_header(ai_sheet, &columns, &header)?;
    for (idx, analysis) in analyses.iter().enumerate() {
        let row = row_num(idx + 1);
        write_text(ai_sheet, row, 0, &analysis.filename)?;
        for (col_idx, column) in columns.iter().enumerate().skip(1) {
            let col = col_num(col_idx);
            match ai_cell(analysis, column) {
                Some(CellRef::Text(text)) => write_text(ai_sheet, row, col, text)?,
                Some(CellRef::Value(value)) => write_value(ai_sheet, row, col, value)?,
                None => {}
            }
        }
    }

    Ok(workbook)
}

fn write_header<S: AsRef<str>>(
    sheet: &mut Worksheet,
    columns: &[S],
    format: &Format,
) -> Result<(), XlsxError> {
    for (idx, column) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col_num(idx), column.as_ref(), format)?;
    }
    Ok(())
}

fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FindingValue,
) -> Result<(), XlsxError> {
    match value {
        FindingValue::Null => {}
        FindingValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        FindingValue::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => write_text(sheet, row, col, &n.to_string())?,
        },
        FindingValue::Text(s) => write_text(sheet, row, col, s)?,
        FindingValue::List(_) | FindingValue::Mapping(_) => {
            write_text(sheet, row, col, &value.render_inline())?
        }
    }
    Ok(())
}

fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), XlsxError> {
    if text.is_empty() {
        return Ok(());
    }
    let text: String = if text.chars().count() > MAX_CELL_CHARS {
        text.chars().take(MAX_CELL_CHARS).collect()
    } else {
        text.to_string()
    };
    sheet.write_string(row, col, text)?;
    Ok(())
}

// 超出 Excel 行列上限时交给 rust_xlsxwriter 报错
fn row_num(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX)
}

fn col_num(idx: usize) -> u16 {
    u16::try_from(idx).unwrap_or(u16::MAX)
}

/// 临时文件写完后再重命名到目标位置，已存在同名文件时追加后缀
fn persist_atomically(bytes: &[u8], dir: &Path, stem: &str) -> Result<PathBuf, ReportError> {
    let mut staged = tempfile::Builder::new()
        .prefix(".pdf_extracts_ai_")
        .suffix(".xlsx.tmp")
        .tempfile_in(dir)
        .map_err(|e| ReportError::io(dir, e))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| ReportError::io(staged.path(), e))?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 0 {
            dir.join(format!("{}.xlsx", stem))
        } else {
            dir.join(format!("{}_{}.xlsx", stem, attempt))
        };

        match staged.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                debug!("文件已存在，尝试下一个名称: {}", candidate.display());
                staged = e.file;
            }
            Err(e) => return Err(ReportError::io(candidate, e.error)),
        }
    }

    Err(ReportError::io(
        dir.join(format!("{}.xlsx", stem)),
        std::io::Error::new(ErrorKind::AlreadyExists, "无可用的报告文件名"),
    ))
}
