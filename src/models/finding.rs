//! AI 分析结果的动态结构
//!
//! LLM 返回的 JSON 形状不固定：可能是单个值，也可能是带列表的嵌套映射。
//! 这里用标签联合表示，渲染时递归处理，不依赖运行时类型判断。

use serde_json::{Map, Number, Value as JsonValue};

/// 分析结果中的单个值
#[derive(Debug, Clone, PartialEq)]
pub enum FindingValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<FindingValue>),
    Mapping(Findings),
}

/// 有序的键值映射（保持 LLM 返回时的键顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Findings {
    entries: Vec<(String, FindingValue)>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入键值；已存在的键会被覆盖，位置不变
    pub fn insert(&mut self, key: impl Into<String>, value: FindingValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FindingValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FindingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl From<Map<String, JsonValue>> for Findings {
    fn from(map: Map<String, JsonValue>) -> Self {
        let mut findings = Findings::new();
        for (key, value) in map {
            findings.insert(key, FindingValue::from(value));
        }
        findings
    }
}

impl<K: Into<String>> FromIterator<(K, FindingValue)> for Findings {
    fn from_iter<I: IntoIterator<Item = (K, FindingValue)>>(iter: I) -> Self {
        let mut findings = Findings::new();
        for (key, value) in iter {
            findings.insert(key, value);
        }
        findings
    }
}

impl From<JsonValue> for FindingValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => FindingValue::Null,
            JsonValue::Bool(b) => FindingValue::Bool(b),
            JsonValue::Number(n) => FindingValue::Number(n),
            JsonValue::String(s) => FindingValue::Text(s),
            JsonValue::Array(items) => {
                FindingValue::List(items.into_iter().map(FindingValue::from).collect())
            }
            JsonValue::Object(map) => FindingValue::Mapping(Findings::from(map)),
        }
    }
}

impl From<&str> for FindingValue {
    fn from(value: &str) -> Self {
        FindingValue::Text(value.to_string())
    }
}

impl FindingValue {
    pub fn to_json(&self) -> JsonValue {
        match self {
            FindingValue::Null => JsonValue::Null,
            FindingValue::Bool(b) => JsonValue::Bool(*b),
            FindingValue::Number(n) => JsonValue::Number(n.clone()),
            FindingValue::Text(s) => JsonValue::String(s.clone()),
            FindingValue::List(items) => {
                JsonValue::Array(items.iter().map(FindingValue::to_json).collect())
            }
            FindingValue::Mapping(findings) => findings.to_json(),
        }
    }

    /// 渲染为单个单元格的文本
    ///
    /// 列表用 `"; "` 连接，映射渲染为 `key: value`，嵌套结构用括号包裹。
    pub fn render_inline(&self) -> String {
        match self {
            FindingValue::Null => String::new(),
            FindingValue::Bool(b) => b.to_string(),
            FindingValue::Number(n) => n.to_string(),
            FindingValue::Text(s) => s.clone(),
            FindingValue::List(items) => items
                .iter()
                .map(|item| item.render_nested())
                .collect::<Vec<_>>()
                .join("; "),
            FindingValue::Mapping(findings) => findings
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.render_nested()))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    fn render_nested(&self) -> String {
        match self {
            FindingValue::List(_) | FindingValue::Mapping(_) => {
                format!("({})", self.render_inline())
            }
            _ => self.render_inline(),
        }
    }

    /// 渲染为 Markdown，用于在终端展示综合分析
    ///
    /// 映射的每个键生成一个 `####` 标题，列表逐项输出为 `- item`。
    pub fn render_markdown(&self) -> String {
        match self {
            FindingValue::Mapping(findings) => {
                let mut out = String::new();
                for (key, value) in findings.iter() {
                    out.push_str(&format!("#### {}\n", title_case(key)));
                    match value {
                        FindingValue::List(items) => {
                            for item in items {
                                out.push_str(&format!("- {}\n", item.render_inline()));
                            }
                        }
                        other => {
                            out.push_str(&other.render_inline());
                            out.push('\n');
                        }
                    }
                    out.push('\n');
                }
                out
            }
            FindingValue::List(items) => items
                .iter()
                .map(|item| format!("- {}\n", item.render_inline()))
                .collect(),
            other => format!("{}\n", other.render_inline()),
        }
    }
}

/// `key_findings` → `Key Findings`
pub fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
