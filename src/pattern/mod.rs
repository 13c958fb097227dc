//! File-set pattern compilation
//!
//! A list of file-sets (a base directory plus include globs) is compiled into a
//! single regular expression. A relative path matches the compiled pattern when
//! any include glob of any file-set matches it under that file-set's directory.

pub mod error;
pub mod glob;

pub use error::*;
pub use glob::{glob_to_regex, tokenize, GlobToken, PatternSyntax};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A base directory plus an ordered list of include globs.
///
/// An empty include list selects everything under the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSetSpec {
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default, alias = "include")]
    includes: Vec<String>,
}

impl FileSetSpec {
    /// A file-set rooted at the implicit deployment root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn under(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            includes: Vec::new(),
        }
    }

    pub fn include(mut self, glob: impl Into<String>) -> Self {
        self.includes.push(glob.into());
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// True when the directory is rooted, on any platform's notion of a root.
    pub fn has_absolute_dir(&self) -> bool {
        match &self.dir {
            Some(dir) => {
                let text = dir.to_string_lossy();
                dir.is_absolute()
                    || text.starts_with('/')
                    || text.starts_with('\\')
                    || has_drive_prefix(&text)
                    || matches!(dir.components().next(), Some(Component::Prefix(_)))
            }
            None => false,
        }
    }

    fn normalized_dir(&self) -> Option<String> {
        let dir = self.dir.as_ref()?.to_string_lossy().replace('\\', "/");
        let trimmed = dir.trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// `C:/` or `C:\`, whatever the host platform
fn has_drive_prefix(text: &str) -> bool {
    matches!(
        text.as_bytes(),
        [drive, b':', b'/' | b'\\', ..] if drive.is_ascii_alphabetic()
    )
}

/// A compiled file-set pattern, matched against whole relative paths.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        // File names may contain newlines; wildcards must cross them.
        let regex = RegexBuilder::new(&format!("^(?:{source})$"))
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| PatternError::InvalidRegex {
                pattern: source.clone(),
                source: e,
            })?;
        Ok(Self { source, regex })
    }

    /// The unanchored regex source.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        if relative_path.contains('\\') {
            self.regex.is_match(&relative_path.replace('\\', "/"))
        } else {
            self.regex.is_match(relative_path)
        }
    }

    pub fn is_match_path(&self, relative_path: &Path) -> bool {
        self.is_match(&relative_path.to_string_lossy())
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.source).finish()
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CompiledPattern {}

impl Serialize for CompiledPattern {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

/// Compiles file-sets into one [`CompiledPattern`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCompiler {
    syntax: PatternSyntax,
}

impl PatternCompiler {
    pub fn new(syntax: PatternSyntax) -> Self {
        Self { syntax }
    }

    pub fn syntax(&self) -> PatternSyntax {
        self.syntax
    }

    /// Returns `Ok(None)` when there are no file-sets to compile.
    pub fn compile(&self, file_sets: &[FileSetSpec]) -> Result<Option<CompiledPattern>> {
        if file_sets.is_empty() {
            return Ok(None);
        }

        let source = file_sets
            .iter()
            .map(|file_set| self.alternative(file_set))
            .collect::<Vec<_>>()
            .join("|");

        CompiledPattern::new(source).map(Some)
    }

    /// Regex source for one file-set: `(<dir>/<includes>)`.
    pub fn alternative(&self, file_set: &FileSetSpec) -> String {
        let mut regex = String::from("(");

        if let Some(dir) = file_set.normalized_dir() {
            regex.push_str(&glob::literal(&dir, self.syntax));
            regex.push('/');
        }

        match file_set.includes() {
            [] => regex.push_str(".*"),
            [single] => {
                regex.push('(');
                regex.push_str(&glob_to_regex(single, self.syntax));
                regex.push(')');
            }
            several => {
                let alternatives = several
                    .iter()
                    .map(|include| format!("({})", glob_to_regex(include, self.syntax)))
                    .collect::<Vec<_>>()
                    .join("|");
                regex.push_str("(?:");
                regex.push_str(&alternatives);
                regex.push(')');
            }
        }

        regex.push(')');
        regex
    }
}

/// Compile file-sets with the default (escaped) syntax.
pub fn compile_file_sets(file_sets: &[FileSetSpec]) -> Result<Option<CompiledPattern>> {
    PatternCompiler::default().compile(file_sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(file_sets: &[FileSetSpec]) -> CompiledPattern {
        compile_file_sets(file_sets).unwrap().unwrap()
    }

    #[test]
    fn test_no_file_sets_yields_no_pattern() {
        assert!(compile_file_sets(&[]).unwrap().is_none());
    }

    #[test]
    fn test_directory_with_single_include() {
        let pattern = compile(&[FileSetSpec::under("server").include("conf/*.properties")]);

        assert_eq!(pattern.source(), r"(server/(conf/[^/]*\.properties))");
        assert!(pattern.is_match("server/conf/foo.properties"));
        assert!(!pattern.is_match("server/conf/sub/foo.properties"));
        assert!(!pattern.is_match("server/conf/fooXproperties"));
    }

    #[test]
    fn test_recursive_glob_without_directory() {
        let pattern = compile(&[FileSetSpec::new().include("**/*.log")]);

        assert_eq!(pattern.source(), r"((.*[^/]*\.log))");
        assert!(pattern.is_match("a/b/c.log"));
        assert!(pattern.is_match("c.log"));
        assert!(!pattern.is_match("a/b/c.txt"));
    }

    #[test]
    fn test_several_file_sets_are_alternated() {
        let pattern = compile(&[
            FileSetSpec::under("a").include("x"),
            FileSetSpec::under("b").include("y"),
        ]);

        assert_eq!(pattern.source(), "(a/(x))|(b/(y))");
        assert!(pattern.is_match("a/x"));
        assert!(pattern.is_match("b/y"));
        assert!(!pattern.is_match("b/x"));
    }

    #[test]
    fn test_empty_includes_match_whole_directory() {
        let pattern = compile(&[FileSetSpec::under("logs")]);

        assert_eq!(pattern.source(), "(logs/.*)");
        assert!(pattern.is_match("logs/a"));
        assert!(pattern.is_match("logs/deep/tree/file.txt"));
        assert!(!pattern.is_match("data/logs/a"));
    }

    #[test]
    fn test_directory_prefix_applies_to_every_include() {
        let pattern = compile(&[FileSetSpec::under("conf").include("*.xml").include("*.properties")]);

        assert!(pattern.is_match("conf/a.xml"));
        assert!(pattern.is_match("conf/a.properties"));
        assert!(!pattern.is_match("a.properties"));
    }

    #[test]
    fn test_legacy_syntax_keeps_metacharacters() {
        let compiler = PatternCompiler::new(PatternSyntax::Legacy);
        let pattern = compiler
            .compile(&[FileSetSpec::new().include("*.jar")])
            .unwrap()
            .unwrap();

        // `.` is a wildcard in legacy mode
        assert!(pattern.is_match("libXjar"));
        assert!(pattern.is_match("lib.jar"));
    }

    #[test]
    fn test_legacy_syntax_surfaces_regex_errors() {
        let compiler = PatternCompiler::new(PatternSyntax::Legacy);
        let result = compiler.compile(&[FileSetSpec::new().include("broken(")]);

        assert!(matches!(result, Err(PatternError::InvalidRegex { .. })));
    }

    #[test]
    fn test_escaped_syntax_accepts_metacharacters() {
        let pattern = compile(&[FileSetSpec::new().include("broken(")]);
        assert!(pattern.is_match("broken("));
    }

    #[test]
    fn test_directory_normalization() {
        let pattern = compile(&[FileSetSpec::under(r"deploy\lib/").include("*.jar")]);

        assert_eq!(pattern.source(), r"(deploy/lib/([^/]*\.jar))");
        assert!(pattern.is_match(r"deploy\lib\a.jar"));
    }

    #[test]
    fn test_absolute_dir_detection() {
        assert!(FileSetSpec::under("/var/log").has_absolute_dir());
        assert!(FileSetSpec::under(r"\temp").has_absolute_dir());
        assert!(!FileSetSpec::under("logs").has_absolute_dir());
        assert!(!FileSetSpec::new().has_absolute_dir());
    }

    #[test]
    fn test_drive_letter_dirs_are_absolute_on_any_host() {
        assert!(FileSetSpec::under("C:/logs").has_absolute_dir());
        assert!(FileSetSpec::under(r"d:\logs").has_absolute_dir());
        assert!(!FileSetSpec::under("logs/C:/x").has_absolute_dir());
    }

    #[test]
    fn test_wildcards_cross_newlines_in_file_names() {
        assert!(compile(&[FileSetSpec::under("logs")]).is_match("logs/a\nb"));
        assert!(compile(&[FileSetSpec::new().include("**/*.log")]).is_match("a\nb/c.log"));
        assert!(compile(&[FileSetSpec::new().include("x?y")]).is_match("x\ny"));
        assert!(!compile(&[FileSetSpec::new().include("*")]).is_match("a\n/b"));
    }
}
