// Specification Decoding Errors
// Location, source excerpt and a hint for documents that are not compiled pipelines

use std::fmt;

/// Position inside the decoded document, both 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Not well-formed YAML/JSON
    YamlSyntax,
    /// Well-formed, but not shaped like a compiled pipeline
    InvalidSchema,
    EmptyDocument,
    IoError,
}

/// Why a document could not be decoded into a pipeline specification
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub location: Option<Location>,
    /// Source lines around `location`, empty when unknown
    pub excerpt: String,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            excerpt: String::new(),
            hint: None,
        }
    }

    pub fn empty_document() -> Self {
        Self::new(ParseErrorKind::EmptyDocument, "document is empty")
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::new(ParseErrorKind::IoError, format!("failed to read file: {}", err))
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(Location { line, column });
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Quote up to `radius` lines either side of the error location
    pub fn with_excerpt(mut self, source: &str, radius: usize) -> Self {
        let Some(Location { line, column }) = self.location else {
            return self;
        };

        let window = line.saturating_sub(radius).max(1)..=line + radius;
        self.excerpt = source
            .lines()
            .zip(1usize..)
            .filter(|(_, n)| window.contains(n))
            .flat_map(|(text, n)| {
                let marker = if n == line { '>' } else { ' ' };
                let mut rows = vec![format!("{}{:>5} | {}", marker, n, text)];
                if n == line && column > 0 {
                    rows.push(format!("{:>7} | {}^", "", " ".repeat(column - 1)));
                }
                rows
            })
            .collect::<Vec<_>>()
            .join("\n");
        self
    }

    /// Translate a serde_yaml failure into document terms
    pub fn from_yaml_error(err: &serde_yaml::Error, source: &str) -> Self {
        let raw = err.to_string();
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let kind = if raw.contains("invalid type") || raw.contains("missing field") {
            ParseErrorKind::InvalidSchema
        } else {
            ParseErrorKind::YamlSyntax
        };

        let mut parsed = Self::new(kind, describe(&raw))
            .at(line, column)
            .with_excerpt(source, 2);
        parsed.hint = hint_for(source, line);
        parsed
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(Location { line, column }) = self.location {
            write!(f, " (line {}:{})", line, column)?;
        }
        if !self.excerpt.is_empty() {
            write!(f, "\n{}", self.excerpt)?;
        }
        match &self.hint {
            Some(hint) => write!(f, "\nhelp: {}", hint),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

fn describe(raw: &str) -> String {
    // serde_yaml appends the position; it is kept in `location` instead
    let msg = raw.split(" at line ").next().unwrap_or(raw);

    if let Some(field) = between(msg, "missing field `", "`") {
        return format!("required field '{}' is missing", field);
    }

    match (between(msg, "invalid type: ", ", expected"), msg.rsplit_once(", expected ")) {
        (Some(found), Some((_, expected))) => format!("found {} where {} was expected", found, expected),
        _ => msg.to_string(),
    }
}

fn between<'a>(msg: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let (_, rest) = msg.split_once(open)?;
    rest.split_once(close).map(|(inner, _)| inner)
}

const SNAKE_CASE_KEYS: &[(&str, &str)] = &[
    ("schema_version", "schemaVersion"),
    ("deployment_spec", "deploymentSpec"),
    ("input_definitions", "inputDefinitions"),
    ("parameter_type", "parameterType"),
    ("runtime_value", "runtimeValue"),
];

fn hint_for(source: &str, line: usize) -> Option<String> {
    if source.contains("@dsl.pipeline") || source.contains("@dsl.component") {
        return Some(
            "this looks like pipeline source code; compile it first and pass the compiled file"
                .into(),
        );
    }

    let offending = source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
    if offending.starts_with('\t') {
        return Some("indent with spaces, YAML does not allow tabs".into());
    }

    SNAKE_CASE_KEYS
        .iter()
        .find(|(snake, _)| offending.contains(snake))
        .map(|(_, camel)| format!("compiled pipelines use camelCase keys, try '{}'", camel))
}

/// An advisory problem found in a decoded specification
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted path to the offending node, e.g. `root.dag.tasks.stage-1`
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
