//! Migration source compiler
//!
//! Compiles every `.sql` file directly inside a directory, as one unit, into
//! a [`MigrationModule`]. A source file looks like:
//!
//! ```sql
//! -- Migration: 20240101120000 create users
//! -- Namespace: accounts
//! -- Up
//! CREATE TABLE users (id INT PRIMARY KEY);
//! -- Down
//! DROP TABLE users;
//! ```
//!
//! The version falls back to the leading digits of the file name. A file
//! without section markers is all "up". `-- Profile: <name>` marks a profile
//! migration, which needs no version.
//!
//! Statements are split and validated with the SQL dialect of the target
//! database and stored exactly as written.

use migrun_core::Announcer;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::dialect::{dialect_from_str, Dialect, GenericDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Location, Token, TokenWithLocation, Tokenizer, TokenizerError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Diagnostic, MigrationSource};
use crate::error::{EngineError, EngineResult};
use crate::migrations::{MigrationDefinition, MigrationModule};

/// Extension of migration source files
pub const SOURCE_EXTENSION: &str = "sql";

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^--\s*(migration|namespace|profile)\s*:\s*(.*?)\s*$")
        .expect("directive pattern is valid")
});

static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^--\s*(up|down)(\s+migration)?\s*$").expect("section pattern is valid"));

static FILE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)[_\-\s]*(.*)$").expect("file name pattern is valid"));

static PARSER_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Line: (\d+), Column: (\d+)").expect("location pattern is valid"));

/// Words skipped between `CREATE` and the kind of object created
const CREATE_MODIFIERS: &[&str] = &["OR", "REPLACE", "TEMP", "TEMPORARY", "CONSTRAINT"];

/// Objects whose definitions carry procedural bodies the SQL parser does not
/// model; statements on them only get lexical checks
const OPAQUE_OBJECTS: &[&str] = &[
    "AGGREGATE",
    "DOMAIN",
    "EXTENSION",
    "FUNCTION",
    "OPERATOR",
    "POLICY",
    "PROCEDURE",
    "RULE",
    "TRIGGER",
    "TYPE",
];

/// Leading words kept per statement for classification
const LEADING_WORDS: usize = 6;

/// Compiles a directory of migration sources
pub struct SourceCompiler {
    directory: PathBuf,
    dialect: String,
}

impl SourceCompiler {
    /// `dialect` names the target database ("postgres", "sqlite"); unknown
    /// names validate with a generic SQL dialect
    pub fn new(directory: PathBuf, dialect: impl Into<String>) -> Self {
        Self {
            directory,
            dialect: dialect.into(),
        }
    }

    fn sql_dialect(&self) -> Box<dyn Dialect> {
        dialect_from_str(&self.dialect).unwrap_or_else(|| Box::new(GenericDialect {}))
    }

    /// Source files directly inside the directory, sorted by name
    pub fn discover(&self) -> EngineResult<Vec<PathBuf>> {
        if !self.directory.is_dir() {
            return Err(EngineError::Discovery(format!(
                "Unable to locate migration files for compilation: {} does not exist",
                self.directory.display()
            )));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().map_or(false, |ext| ext == SOURCE_EXTENSION)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(EngineError::Discovery(format!(
                "No migration files found for compilation in {}",
                self.directory.display()
            )));
        }
        Ok(files)
    }

    /// Compile the files as one unit; any error diagnostic fails the whole unit
    pub fn compile(
        &self,
        files: &[PathBuf],
        announcer: &dyn Announcer,
    ) -> EngineResult<MigrationModule> {
        let mut diagnostics = Vec::new();
        let mut migrations = Vec::new();
        let mut declared: BTreeMap<i64, PathBuf> = BTreeMap::new();
        let dialect = self.sql_dialect();

        for file in files {
            announcer.say(&format!("Compiling file: {}", file.display()));

            let content = match fs::read_to_string(file) {
                Ok(content) => content,
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        file.clone(),
                        None,
                        format!("Unable to read file: {}", e),
                    ));
                    continue;
                }
            };

            let (definition, unit_diagnostics) = compile_unit(file, &content, dialect.as_ref());
            diagnostics.extend(unit_diagnostics);

            let Some(definition) = definition else {
                continue;
            };
            if !definition.is_profile() {
                if let Some(previous) = declared.get(&definition.version) {
                    diagnostics.push(Diagnostic::error(
                        file.clone(),
                        None,
                        format!(
                            "Duplicate migration version {} (also declared in {})",
                            definition.version,
                            previous.display()
                        ),
                    ));
                    continue;
                }
                declared.insert(definition.version, file.clone());
            }
            migrations.push(definition);
        }

        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(EngineError::Compilation { diagnostics });
        }

        for warning in &diagnostics {
            tracing::warn!("{}", warning);
            announcer.say(&warning.to_string());
        }

        let name = self
            .directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.directory.display().to_string());
        Ok(MigrationModule::new(name, migrations))
    }
}

impl MigrationSource for SourceCompiler {
    fn describe(&self) -> String {
        format!("sources in {}", self.directory.display())
    }

    fn load(&self, announcer: &dyn Announcer) -> EngineResult<MigrationModule> {
        let files = self.discover()?;
        self.compile(&files, announcer)
    }
}

#[derive(Debug, Clone, Copy)]
enum Section {
    Up,
    Down,
}

/// Lines of one section; comment lines are kept blank so parser line
/// numbers map back onto the file
#[derive(Debug)]
struct SectionText {
    first_line: usize,
    lines: Vec<String>,
}

impl SectionText {
    fn starting_at(first_line: usize) -> Self {
        Self {
            first_line,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn first_content_line(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| !l.trim().is_empty())
            .map(|index| self.first_line + index)
    }

    fn is_blank(&self) -> bool {
        self.first_content_line().is_none()
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }
}

fn compile_unit(
    path: &Path,
    content: &str,
    dialect: &dyn Dialect,
) -> (Option<MigrationDefinition>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut version_directive: Option<(usize, String)> = None;
    let mut namespace = None;
    let mut profile = None;

    let mut preamble = SectionText::starting_at(1);
    let mut up: Option<SectionText> = None;
    let mut down: Option<SectionText> = None;
    let mut current: Option<Section> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();

        if let Some(caps) = SECTION_MARKER.captures(trimmed) {
            let section = if caps[1].eq_ignore_ascii_case("up") {
                Section::Up
            } else {
                Section::Down
            };
            let slot = match section {
                Section::Up => &mut up,
                Section::Down => &mut down,
            };
            if slot.is_some() {
                diagnostics.push(Diagnostic::error(
                    path.to_path_buf(),
                    Some(line_no),
                    format!("Duplicate {} section", trimmed),
                ));
            }
            *slot = Some(SectionText::starting_at(line_no + 1));
            current = Some(section);
            continue;
        }

        let body = if let Some(caps) = DIRECTIVE.captures(trimmed) {
            let value = caps[2].to_string();
            match caps[1].to_ascii_lowercase().as_str() {
                "migration" => version_directive = Some((line_no, value)),
                "namespace" => namespace = Some(value).filter(|v| !v.is_empty()),
                _ => profile = Some(value).filter(|v| !v.is_empty()),
            }
            ""
        } else if trimmed.starts_with("--") {
            ""
        } else {
            raw
        };

        let target = match current {
            Some(Section::Up) => up.as_mut(),
            Some(Section::Down) => down.as_mut(),
            None => Some(&mut preamble),
        };
        if let Some(section) = target {
            section.push(body);
        }
    }

    if up.is_none() && down.is_none() {
        up = Some(preamble);
    } else if let Some(line) = preamble.first_content_line() {
        diagnostics.push(Diagnostic::error(
            path.to_path_buf(),
            Some(line),
            "Statement outside of an '-- Up' or '-- Down' section",
        ));
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let (file_version, mut description) = match FILE_VERSION.captures(stem) {
        Some(caps) => (caps[1].parse::<i64>().ok(), caps[2].replace('_', " ")),
        None => (None, stem.replace('_', " ")),
    };

    let mut version_invalid = false;
    let version = match version_directive {
        Some((line, value)) => {
            let mut parts = value.splitn(2, char::is_whitespace);
            let raw = parts.next().unwrap_or_default();
            match raw.parse::<i64>() {
                Ok(v) => {
                    if let Some(d) = parts.next().map(str::trim).filter(|d| !d.is_empty()) {
                        description = d.to_string();
                    }
                    Some(v)
                }
                Err(_) => {
                    version_invalid = true;
                    diagnostics.push(Diagnostic::error(
                        path.to_path_buf(),
                        Some(line),
                        format!("Invalid migration version '{}'", raw),
                    ));
                    None
                }
            }
        }
        None => file_version,
    };

    if version.is_none() && profile.is_none() && !version_invalid {
        diagnostics.push(Diagnostic::error(
            path.to_path_buf(),
            None,
            "Migration version is missing; declare '-- Migration: <version>' or prefix the file name with it",
        ));
    }

    let description = description.trim();
    let description = if description.is_empty() { stem } else { description };

    let up_statements = compile_section(path, up.as_ref(), "up", dialect, &mut diagnostics);
    let down_statements = compile_section(path, down.as_ref(), "down", dialect, &mut diagnostics);

    if up.as_ref().map_or(true, SectionText::is_blank) {
        diagnostics.push(Diagnostic::warning(
            path.to_path_buf(),
            None,
            "Migration has no up statements",
        ));
    }
    if down.is_none() && profile.is_none() {
        diagnostics.push(Diagnostic::warning(
            path.to_path_buf(),
            None,
            "Migration has no down section and cannot be reverted",
        ));
    }

    if diagnostics.iter().any(Diagnostic::is_error) {
        return (None, diagnostics);
    }

    let definition = MigrationDefinition {
        version: version.unwrap_or_default(),
        description: description.to_string(),
        namespace,
        profile,
        up: up_statements,
        down: down_statements,
    };
    (Some(definition), diagnostics)
}

/// Split a section into statements, validating each with the dialect
fn compile_section(
    path: &Path,
    section: Option<&SectionText>,
    name: &str,
    dialect: &dyn Dialect,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let Some(section) = section.filter(|s| !s.is_blank()) else {
        return Vec::new();
    };

    let statements = match split_statements(dialect, &section.text()) {
        Ok(statements) => statements,
        Err(e) => {
            diagnostics.push(invalid_sql(path, section, 1, name, &e.to_string()));
            return Vec::new();
        }
    };

    let mut compiled = Vec::with_capacity(statements.len());
    for statement in statements {
        if statement.is_opaque() {
            tracing::debug!(line = statement.line, "Passing through procedural statement unparsed");
        } else if let Err(e) = Parser::parse_sql(dialect, &statement.text) {
            diagnostics.push(invalid_sql(path, section, statement.line, name, &e.to_string()));
            continue;
        }
        compiled.push(format!("{};", statement.text));
    }
    compiled
}

/// `statement_line` is where the failing text starts within the section;
/// locations in `message` are relative to it
fn invalid_sql(
    path: &Path,
    section: &SectionText,
    statement_line: usize,
    name: &str,
    message: &str,
) -> Diagnostic {
    let line = PARSER_LOCATION
        .captures(message)
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .map(|relative| section.first_line + statement_line.saturating_sub(1) + relative.saturating_sub(1))
        .or(section.first_content_line());
    Diagnostic::error(
        path.to_path_buf(),
        line,
        format!("Invalid SQL in {} section: {}", name, message),
    )
}

/// One statement as written in the source, without its terminator
#[derive(Debug)]
struct SourceStatement {
    /// 1-based line of the first token, within the section
    line: usize,
    text: String,
    words: Vec<String>,
}

impl SourceStatement {
    fn is_opaque(&self) -> bool {
        match self.words.first().map(String::as_str) {
            Some("DO") | Some("COMMENT") => true,
            _ => object_kind(&self.words).map_or(false, |kind| OPAQUE_OBJECTS.contains(&kind)),
        }
    }
}

/// Kind of object a `CREATE`, `ALTER` or `DROP` statement acts on
fn object_kind(words: &[String]) -> Option<&str> {
    let (first, rest) = words.split_first()?;
    if !matches!(first.as_str(), "CREATE" | "ALTER" | "DROP") {
        return None;
    }
    rest.iter()
        .map(String::as_str)
        .find(|word| !CREATE_MODIFIERS.contains(word))
}

/// Statement being collected by [`split_statements`]
struct PendingStatement {
    line: usize,
    start: usize,
    words: Vec<String>,
    in_trigger: bool,
    block_depth: usize,
}

impl PendingStatement {
    fn starting_at(line: usize, start: usize) -> Self {
        Self {
            line,
            start,
            words: Vec::new(),
            in_trigger: false,
            block_depth: 0,
        }
    }

    /// Track `BEGIN ... END` blocks of trigger bodies, whose inner
    /// semicolons do not end the statement
    fn observe(&mut self, token: &Token) {
        let Token::Word(word) = token else {
            return;
        };
        if word.quote_style.is_some() {
            return;
        }
        let upper = word.value.to_ascii_uppercase();

        if self.words.len() < LEADING_WORDS {
            self.words.push(upper.clone());
            self.in_trigger = self.words[0] == "CREATE" && object_kind(&self.words) == Some("TRIGGER");
        }
        if self.in_trigger {
            match upper.as_str() {
                "BEGIN" | "CASE" => self.block_depth += 1,
                "END" => self.block_depth = self.block_depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn finish(self, sql: &str, end: usize) -> SourceStatement {
        SourceStatement {
            line: self.line,
            text: sql[self.start..end].trim_end().to_string(),
            words: self.words,
        }
    }
}

/// Split on top-level semicolons using the dialect's tokenizer, so quoted
/// text, dollar-quoted bodies and comments never end a statement
fn split_statements(dialect: &dyn Dialect, sql: &str) -> Result<Vec<SourceStatement>, TokenizerError> {
    let tokens = Tokenizer::new(dialect, sql).tokenize_with_location()?;
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(sql.match_indices('\n').map(|(index, _)| index + 1))
        .collect();

    let mut statements = Vec::new();
    let mut current: Option<PendingStatement> = None;

    for TokenWithLocation { token, location } in tokens {
        match &token {
            Token::Whitespace(_) => continue,
            Token::SemiColon => {
                if current.as_ref().map_or(false, |pending| pending.block_depth > 0) {
                    continue;
                }
                if let Some(pending) = current.take() {
                    statements.push(pending.finish(sql, byte_offset(sql, &line_starts, &location)));
                }
                continue;
            }
            _ => {}
        }

        current
            .get_or_insert_with(|| {
                PendingStatement::starting_at(
                    location.line as usize,
                    byte_offset(sql, &line_starts, &location),
                )
            })
            .observe(&token);
    }

    if let Some(pending) = current {
        statements.push(pending.finish(sql, sql.len()));
    }
    Ok(statements)
}

/// Byte offset of a 1-based line/column (in characters) location
fn byte_offset(sql: &str, line_starts: &[usize], location: &Location) -> usize {
    let Some(&start) = line_starts.get((location.line as usize).saturating_sub(1)) else {
        return sql.len();
    };
    sql[start..]
        .char_indices()
        .nth((location.column as usize).saturating_sub(1))
        .map_or(sql.len(), |(index, _)| start + index)
}
