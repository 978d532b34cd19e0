//! AI 分析服务 - 业务能力层
//!
//! 只负责"把文本变成结构化结论"的能力，不关心批次和顺序
//!
//! - `analyze_one`: 单个文档 → 结构化结论，或带原始响应的 `ProcessingError`
//! - `synthesize`: 多个文档的结论 → 跨文档综合分析

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::ProcessingError;
use crate::models::{FindingValue, Findings, SynthesisResult};

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a research assistant that extracts structured \
information from academic papers and reports. Always answer with a single valid JSON object \
and nothing else.";

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a research analyst comparing findings across \
several papers. Always answer with a single valid JSON object and nothing else.";

/// 分析能力
///
/// 编排层只依赖这个 trait，测试时可替换为脚本化实现。
#[allow(async_fn_in_trait)]
pub trait DocumentAnalyzer {
    /// 分析单个文档的文本
    async fn analyze_one(&self, text: &str) -> Result<Findings, ProcessingError>;

    /// 对多个文档的结论做综合分析
    async fn synthesize(&self, findings: &[&Findings]) -> Result<SynthesisResult>;
}

/// 基于 LLM 的分析服务
pub struct LlmAnalysisService {
    client: LlmClient,
    max_text_chars: usize,
}

impl LlmAnalysisService {
    /// 创建新的分析服务
    pub fn new(config: &Config) -> Self {
        Self::with_client(LlmClient::new(config), config.max_text_chars)
    }

    pub fn with_client(client: LlmClient, max_text_chars: usize) -> Self {
        Self {
            client,
            max_text_chars,
        }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

impl DocumentAnalyzer for LlmAnalysisService {
    async fn analyze_one(&self, text: &str) -> Result<Findings, ProcessingError> {
        let prompt = build_analysis_prompt(truncate_chars(text, self.max_text_chars));

        let response = self
            .client
            .send_to_llm(&prompt, Some(ANALYSIS_SYSTEM_PROMPT))
            .await
            .map_err(|e| ProcessingError::new(e.to_string()))?;

        debug!("分析响应长度: {} 字符", response.len());
        parse_findings(&response)
    }

    async fn synthesize(&self, findings: &[&Findings]) -> Result<SynthesisResult> {
        let prompt = build_synthesis_prompt(findings)?;
        let response = self
            .client
            .send_to_llm(&prompt, Some(SYNTHESIS_SYSTEM_PROMPT))
            .await?;
        Ok(parse_synthesis(&response))
    }
}

fn build_analysis_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following document text and extract its key information.

Return a JSON object with exactly these keys:
- "title": the document title
- "authors": list of author names
- "publication_year": year as a number, or null if unknown
- "research_question": the main question or objective
- "methodology": a short description of the methods used
- "key_findings": list of the main findings
- "conclusions": the main conclusions
- "limitations": list of stated limitations
- "keywords": list of 3-8 keywords

Use null or an empty list when the text does not contain the information.

Document text:
"""
{}
""""#,
        text
    )
}

fn build_synthesis_prompt(findings: &[&Findings]) -> Result<String> {
    let documents: Vec<JsonValue> = findings.iter().map(|f| f.to_json()).collect();
    let documents_json = serde_json::to_string_pretty(&documents)?;

    Ok(format!(
        r#"Below are structured findings extracted from {} documents.

{}

Compare them and return a JSON object with these keys:
- "common_themes": list of themes shared across documents
- "key_insights": list of the most important insights
- "contradictions": list of conflicting findings, if any
- "research_gaps": list of open questions or gaps
- "recommendations": list of recommendations for further work"#,
        findings.len(),
        documents_json
    ))
}

/// 按字符数截断，保证落在字符边界上
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            warn!("文本超过 {} 字符，已截断", max_chars);
            &text[..idx]
        }
        None => text,
    }
}

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"))
}

/// 从 LLM 响应中取出 JSON 部分
///
/// 依次尝试：整个响应、各个 Markdown 代码块、最外层 `{ ... }`，返回第一个能解析的。
/// 都无法解析时返回最外层 `{ ... }`（或第一个代码块），由调用方报告解析错误。
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let fenced: Vec<&str> = code_fence_regex()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    let braced = outermost_braces(raw);

    std::iter::once(trimmed)
        .chain(fenced.iter().copied())
        .chain(braced)
        .find(|candidate| serde_json::from_str::<JsonValue>(candidate).is_ok())
        .or(braced)
        .or_else(|| fenced.first().copied())
}

fn outermost_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// 解析单文档分析响应
pub fn parse_findings(raw: &str) -> Result<Findings, ProcessingError> {
    let payload = extract_json_payload(raw)
        .ok_or_else(|| ProcessingError::with_raw_response("AI 响应中没有 JSON 对象", raw))?;

    let value: JsonValue = serde_json::from_str(payload).map_err(|e| {
        ProcessingError::with_raw_response(format!("无法解析 AI 响应: {}", e), raw)
    })?;

    match value {
        JsonValue::Object(map) => Ok(Findings::from(map)),
        _ => Err(ProcessingError::with_raw_response(
            "AI 响应不是 JSON 对象",
            raw,
        )),
    }
}

/// 解析综合分析响应
///
/// 无法解析时退化为纯文本；顶层 `analysis` 键会被展开。
pub fn parse_synthesis(raw: &str) -> SynthesisResult {
    let parsed = extract_json_payload(raw)
        .and_then(|payload| serde_json::from_str::<JsonValue>(payload).ok());

    let analysis = match parsed {
        Some(JsonValue::Object(mut map)) if map.contains_key("analysis") => {
            FindingValue::from(map.remove("analysis").unwrap_or(JsonValue::Null))
        }
        Some(value) => FindingValue::from(value),
        None => {
            warn!("综合分析响应不是 JSON，按纯文本处理");
            FindingValue::Text(raw.to_string())
        }
    };

    SynthesisResult { analysis }
}
