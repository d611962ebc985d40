//! Code analysis collaborator
//!
//! Extracts function and class definitions from snippet content. Index rebuilds use the
//! function names; the `has_functions` / `has_classes` filters use both.

use crate::document::FunctionInfo;
use crate::error::AppError;
use regex::Regex;
use std::collections::HashSet;

/// Finds definitions inside source text
pub trait CodeAnalyzer: Send + Sync {
    fn extract_functions(&self, content: &str, language: &str)
        -> Result<Vec<FunctionInfo>, AppError>;

    /// Class-like definitions (class, struct, interface, ...); names only
    fn extract_classes(&self, content: &str, language: &str) -> Result<Vec<String>, AppError>;
}

struct LanguagePatterns {
    functions: Vec<Regex>,
    classes: Vec<Regex>,
}

impl LanguagePatterns {
    fn compile(functions: &[&str], classes: &[&str]) -> Result<Self, AppError> {
        let build = |sources: &[&str]| -> Result<Vec<Regex>, AppError> {
            sources
                .iter()
                .map(|src| {
                    Regex::new(&format!("(?m){}", src))
                        .map_err(|e| AppError::Internal(format!("bad analyzer pattern: {}", e)))
                })
                .collect()
        };
        Ok(Self {
            functions: build(functions)?,
            classes: build(classes)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    Python,
    JavaScript,
    Rust,
    Go,
    JvmLike,
    Php,
    Ruby,
    Shell,
    Other,
}

impl Family {
    fn of(language: &str) -> Self {
        match language.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Family::Python,
            "javascript" | "js" | "jsx" | "typescript" | "ts" | "tsx" | "node" => {
                Family::JavaScript
            }
            "rust" | "rs" => Family::Rust,
            "go" | "golang" => Family::Go,
            "java" | "kotlin" | "kt" | "c#" | "csharp" | "cs" | "scala" => Family::JvmLike,
            "php" => Family::Php,
            "ruby" | "rb" => Family::Ruby,
            "bash" | "sh" | "shell" | "zsh" => Family::Shell,
            _ => Family::Other,
        }
    }
}

/// Regex-driven analyzer covering the languages snippets are most often saved in.
/// Unknown languages are scanned with the union of the common definition forms.
pub struct PatternAnalyzer {
    python: LanguagePatterns,
    javascript: LanguagePatterns,
    rust: LanguagePatterns,
    go: LanguagePatterns,
    jvm_like: LanguagePatterns,
    php: LanguagePatterns,
    ruby: LanguagePatterns,
    shell: LanguagePatterns,
    other: LanguagePatterns,
}

const PY_DEF: &str = r"^[ \t]*(?:async[ \t]+)?def\s+([A-Za-z_]\w*)\s*\(";
const JS_FUNCTION: &str = r"\bfunction\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(";
const JS_ARROW: &str =
    r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)";
const RUST_FN: &str = r"\bfn\s+([A-Za-z_]\w*)";
const GO_FUNC: &str = r"\bfunc\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*\(";
const JVM_METHOD: &str = r"^[ \t]*(?:(?:public|private|protected|internal|static|final|abstract|override|virtual|async|synchronized)\s+)+[\w<>\[\]?,.]+\s+([A-Za-z_]\w*)\s*\(";
const KOTLIN_FUN: &str = r"\bfun\s+([A-Za-z_]\w*)\s*\(";
const PHP_FUNCTION: &str = r"\bfunction\s+&?([A-Za-z_]\w*)\s*\(";
const RUBY_DEF: &str = r"^[ \t]*def\s+(?:self\.)?([A-Za-z_]\w*[?!=]?)";
const SHELL_FUNCTION: &str = r"^[ \t]*(?:function\s+)?([A-Za-z_][\w-]*)\s*\(\s*\)";

const CLASS: &str = r"^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)";
const RUST_TYPE: &str = r"\b(?:struct|enum|trait)\s+([A-Za-z_]\w*)";
const GO_TYPE: &str = r"\btype\s+([A-Za-z_]\w*)\s+(?:struct|interface)\b";
const JVM_TYPE: &str = r"\b(?:class|interface|record|enum|object)\s+([A-Za-z_]\w*)";
const RUBY_TYPE: &str = r"^[ \t]*(?:class|module)\s+([A-Z]\w*)";

impl PatternAnalyzer {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            python: LanguagePatterns::compile(&[PY_DEF], &[CLASS])?,
            javascript: LanguagePatterns::compile(&[JS_FUNCTION, JS_ARROW], &[CLASS])?,
            rust: LanguagePatterns::compile(&[RUST_FN], &[RUST_TYPE])?,
            go: LanguagePatterns::compile(&[GO_FUNC], &[GO_TYPE])?,
            jvm_like: LanguagePatterns::compile(&[JVM_METHOD, KOTLIN_FUN], &[JVM_TYPE])?,
            php: LanguagePatterns::compile(&[PHP_FUNCTION], &[CLASS])?,
            ruby: LanguagePatterns::compile(&[RUBY_DEF], &[RUBY_TYPE])?,
            shell: LanguagePatterns::compile(&[SHELL_FUNCTION], &[])?,
            other: LanguagePatterns::compile(
                &[PY_DEF, JS_FUNCTION, RUST_FN, GO_FUNC],
                &[CLASS, RUST_TYPE],
            )?,
        })
    }

    fn patterns(&self, language: &str) -> &LanguagePatterns {
        match Family::of(language) {
            Family::Python => &self.python,
            Family::JavaScript => &self.javascript,
            Family::Rust => &self.rust,
            Family::Go => &self.go,
            Family::JvmLike => &self.jvm_like,
            Family::Php => &self.php,
            Family::Ruby => &self.ruby,
            Family::Shell => &self.shell,
            Family::Other => &self.other,
        }
    }
}

impl CodeAnalyzer for PatternAnalyzer {
    fn extract_functions(
        &self,
        content: &str,
        language: &str,
    ) -> Result<Vec<FunctionInfo>, AppError> {
        let lines = LineIndex::new(content);
        let mut seen = HashSet::new();
        let mut functions = Vec::new();

        for pattern in &self.patterns(language).functions {
            for caps in pattern.captures_iter(content) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if !seen.insert((name.as_str().to_string(), whole.start())) {
                    continue;
                }
                let line = lines.line(whole.start());
                let (line_start, line_end) = lines.bounds(line);

                functions.push(FunctionInfo {
                    name: name.as_str().to_string(),
                    line,
                    signature: content[line_start..line_end].trim().to_string(),
                });
            }
        }

        functions.sort_by_key(|f| f.line);
        Ok(functions)
    }

    fn extract_classes(&self, content: &str, language: &str) -> Result<Vec<String>, AppError> {
        let mut seen = HashSet::new();
        let classes: Vec<String> = self
            .patterns(language)
            .classes
            .iter()
            .flat_map(|pattern| pattern.captures_iter(content))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Ok(classes)
    }
}

/// Line-start offsets of a text, for repeated offset → line lookups
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self {
            starts,
            len: content.len(),
        }
    }

    /// 1-based line of a byte offset
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset.min(self.len))
    }

    /// Byte range of a 1-based line, without its newline
    pub fn bounds(&self, line: usize) -> (usize, usize) {
        let start = self.starts[line - 1];
        let end = self.starts.get(line).map_or(self.len, |next| next - 1);
        (start, end)
    }
}

/// 1-based line number of a byte offset
pub fn line_number(content: &str, offset: usize) -> usize {
    LineIndex::new(content).line(offset)
}
