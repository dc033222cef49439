use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::grid::Grid;
use crate::parse_util;
pub use crate::parse_util::ConvertError;
pub use crate::parse_util::ParseError;
use crate::rule_set::RuleError;
use crate::rule_set::RuleSet;

/// Encoded lines are wrapped at this many characters.
const MAX_LINE_LEN: usize = 70;

/// A parsed RLE file. Borrows from the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern<'a> {
    width: usize,
    height: usize,
    rule_name: Option<&'a str>,
    rule: RuleSet,
    name: Option<&'a str>,
    author: Option<&'a str>,
    comments: Vec<&'a str>,
    rows: Vec<Vec<Run>>,
}

/// `len` consecutive cells of the same state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub alive: bool,
    pub len: usize,
}

impl<'a> Pattern<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The rule as written in the header, or in a `#r` line if the header has none.
    pub fn rule_name(&self) -> Option<&'a str> {
        self.rule_name
    }

    /// The pattern's rule. Standard life unless the file says otherwise.
    pub fn rule(&self) -> RuleSet {
        self.rule
    }

    /// The `#N` line, or else the first plain comment line.
    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    pub fn author(&self) -> Option<&'a str> {
        self.author
    }

    /// Every comment line, without its leading `#`.
    pub fn comments(&self) -> &[&'a str] {
        &self.comments
    }

    /// Runs of each row, top to bottom. Rows past the last run are left out.
    pub fn rows(&self) -> &[Vec<Run>] {
        &self.rows
    }

    /// Materialize the pattern as a grid of its declared size. Cells not covered by a run are
    /// dead.
    pub fn seed(&self) -> Grid {
        let mut cells = vec![false; self.width * self.height];

        for (y, row) in self.rows.iter().enumerate() {
            let mut i = y * self.width;

            for run in row {
                if run.alive {
                    cells[i..i + run.len].fill(true);
                }

                i += run.len;
            }
        }

        Grid::from_cells(self.width, self.height, cells)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RleError {
    #[error("Missing header line")]
    MissingHeader,

    #[error("Line {line}: invalid header: {reason}")]
    InvalidHeader { line: usize, reason: HeaderError },

    #[error("Line {line}: {source}")]
    Rule {
        line: usize,
        #[source]
        source: RuleError,
    },

    #[error("Line {line}, column {column}: run ending at column {end} of row {row} overflows width {width}")]
    RowOverflow {
        line: usize,
        column: usize,
        row: usize,
        width: usize,
        end: usize,
    },

    #[error("Line {line}, column {column}: run on row {row} is past height {height}")]
    HeightOverflow {
        line: usize,
        column: usize,
        row: usize,
        height: usize,
    },

    #[error("Line {line}, column {column}: invalid run token \"{token}\"")]
    InvalidRunToken {
        line: usize,
        column: usize,
        token: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Expected a key")]
    MissingKey,

    #[error("Missing '{key}'")]
    MissingDimension { key: &'static str },

    #[error("'{key}' is defined twice")]
    DuplicateKey { key: &'static str },

    #[error("Failed to parse '{key}': {source}")]
    InvalidDimension {
        key: &'static str,
        #[source]
        source: ConvertError,
    },

    #[error("'{key}' must be positive")]
    ZeroDimension { key: &'static str },

    #[error("Empty rule")]
    EmptyRule,

    #[error("A {width}x{height} pattern is too large")]
    TooLarge { width: usize, height: usize },
}

/// Parse the RLE file format.
///
/// See: https://conwaylife.com/wiki/Run_Length_Encoded
pub fn parse(text: &str) -> Result<Pattern<'_>, RleError> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));
    let mut preamble = Preamble::default();

    // Parse as many comment lines as possible, up to the header
    let (line, header) = loop {
        let Some((line, text)) = lines.next() else {
            return Err(RleError::MissingHeader);
        };

        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(comment) = text.strip_prefix('#') {
            preamble.read_comment(comment);
            continue;
        }

        if !text.contains('=') {
            return Err(RleError::MissingHeader);
        }

        let header = read_header(text).map_err(|reason| RleError::InvalidHeader { line, reason })?;

        break (line, header);
    };

    let (rule_name, rule) = match (header.rule, preamble.rule) {
        (Some(name), _) => {
            let rule = name
                .parse()
                .map_err(|source| RleError::Rule { line, source })?;

            (Some(name), rule)
        }
        (None, Some((name, rule))) => (Some(name), rule),
        (None, None) => (None, RuleSet::default()),
    };

    let rows = read_body(lines, header.width, header.height)?;

    debug!(
        width = header.width,
        height = header.height,
        %rule,
        "Parsed RLE pattern"
    );

    Ok(Pattern {
        width: header.width,
        height: header.height,
        rule_name,
        rule,
        name: preamble.name.or(preamble.first_comment),
        author: preamble.author,
        comments: preamble.comments,
        rows,
    })
}

#[derive(Default)]
struct Preamble<'a> {
    name: Option<&'a str>,
    author: Option<&'a str>,
    rule: Option<(&'a str, RuleSet)>,
    first_comment: Option<&'a str>,
    comments: Vec<&'a str>,
}

impl<'a> Preamble<'a> {
    /// Comment content never fails the parse. Unreadable typed lines are logged and skipped.
    fn read_comment(&mut self, comment: &'a str) {
        self.comments.push(comment);

        let mut chars = comment.chars();
        let kind = chars.next();
        let body = chars.as_str().trim();

        match kind {
            // Pattern name
            Some('N') if !body.is_empty() => {
                if self.name.is_some() {
                    warn!("RLE file name already defined. Using latest");
                }

                self.name = Some(body);
            }

            // Pattern author
            Some('O') if !body.is_empty() => {
                if self.author.is_some() {
                    warn!("RLE author already defined. Using latest");
                }

                self.author = Some(body);
            }

            // Pattern rules
            Some('r') => match body.parse() {
                Ok(rule) => self.rule = Some((body, rule)),
                Err(e) => warn!("Ignoring rule comment \"{body}\": {e}"),
            },

            // Comment line
            Some('C' | 'c') => {
                if !body.is_empty() {
                    self.first_comment.get_or_insert(body);
                }
            }

            // Untyped comment
            Some(c) if !c.is_ascii_alphabetic() => {
                let body = comment.trim();

                if !body.is_empty() {
                    self.first_comment.get_or_insert(body);
                }
            }

            _ => {}
        }
    }
}

struct RleHeaderLine<'a> {
    width: usize,
    height: usize,
    rule: Option<&'a str>,
}

/// Parse `x = <int>, y = <int>[, rule = <rule>]`. Keys may come in any order.
fn read_header(text: &str) -> Result<RleHeaderLine<'_>, HeaderError> {
    let mut width = None;
    let mut height = None;
    let mut rule = None;

    let mut rest = text;

    while !rest.is_empty() {
        let (key, value) = read_key(rest)?;

        // The rule runs to the end of the line, since topologies like `:T20,20` contain commas
        let (value, tail) = if key == "rule" {
            (value, "")
        } else {
            value.split_once(',').unwrap_or((value, ""))
        };
        let value = value.trim();
        rest = tail.trim_start();

        match key {
            "x" => read_dimension(&mut width, "x", value)?,
            "y" => read_dimension(&mut height, "y", value)?,
            "rule" => {
                if rule.is_some() {
                    return Err(HeaderError::DuplicateKey { key: "rule" });
                }

                let (name, topology) = value.split_once(':').unwrap_or((value, ""));
                if !topology.is_empty() {
                    warn!("Ignoring RLE topology \"{topology}\"");
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(HeaderError::EmptyRule);
                }

                rule = Some(name);
            }
            key => warn!("Ignoring unknown RLE header key \"{key}\""),
        }
    }

    let width = width.ok_or(HeaderError::MissingDimension { key: "x" })?;
    let height = height.ok_or(HeaderError::MissingDimension { key: "y" })?;

    if Grid::checked_len(width, height).is_err() {
        return Err(HeaderError::TooLarge { width, height });
    }

    Ok(RleHeaderLine {
        width,
        height,
        rule,
    })
}

/// Read `<key> =`, returning the key and whatever follows the `=`.
fn read_key(text: &str) -> Result<(&str, &str), HeaderError> {
    let p = |b: u8| b == b'=' || b == b',' || b.is_ascii_whitespace();
    let (Some(key), bytes) = parse_util::take_until_fn(p, text.as_bytes()) else {
        return Err(HeaderError::MissingKey);
    };

    let bytes = parse_util::take_ws(bytes);
    let bytes = parse_util::expect(b'=', bytes)?;
    let bytes = parse_util::take_ws(bytes);

    // `key` and `bytes` both border ascii bytes, so these are char boundaries
    Ok((&text[..key.len()], &text[text.len() - bytes.len()..]))
}

fn read_dimension(
    dim: &mut Option<usize>,
    key: &'static str,
    value: &str,
) -> Result<(), HeaderError> {
    if dim.is_some() {
        return Err(HeaderError::DuplicateKey { key });
    }

    let n: usize = parse_util::convert(value.as_bytes())
        .map_err(|source| HeaderError::InvalidDimension { key, source })?;

    if n == 0 {
        return Err(HeaderError::ZeroDimension { key });
    }

    *dim = Some(n);

    Ok(())
}

/// Read run tokens until `!`. Tokens may be wrapped across lines, and anything after `!` is
/// ignored.
fn read_body<'a, I>(lines: I, width: usize, height: usize) -> Result<Vec<Vec<Run>>, RleError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut rows: Vec<Vec<Run>> = Vec::new();
    let (mut x, mut y) = (0usize, 0usize);

    for (line, text) in lines {
        let mut bytes = text.as_bytes();

        loop {
            bytes = parse_util::take_ws(bytes);

            if bytes.is_empty() {
                break;
            }

            // Columns count characters, starting at 1
            let start = text.len() - bytes.len();
            let column = text[..start].chars().count() + 1;

            let (digits, rest) = parse_util::take_digits(bytes);
            let (tag, after) = parse_util::take_1(rest);

            let invalid = || {
                let at = text.len() - rest.len();
                let tag = text[at..].chars().next().map(String::from);

                RleError::InvalidRunToken {
                    line,
                    column,
                    token: format!("{}{}", &text[start..at], tag.unwrap_or_default()),
                }
            };

            let len = match digits {
                None => 1,
                Some(digits) => match parse_util::convert::<usize>(digits) {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid()),
                },
            };

            match tag {
                // End of input
                Some(b'!') => return Ok(rows),

                // End of line
                Some(b'$') => {
                    y = y.saturating_add(len);
                    x = 0;
                }

                // Dead or live cells
                Some(tag @ (b'b' | b'o')) => {
                    if y >= height {
                        return Err(RleError::HeightOverflow {
                            line,
                            column,
                            row: y,
                            height,
                        });
                    }

                    let end = x.saturating_add(len);
                    if end > width {
                        return Err(RleError::RowOverflow {
                            line,
                            column,
                            row: y,
                            width,
                            end,
                        });
                    }

                    if rows.len() <= y {
                        rows.resize_with(y + 1, Vec::new);
                    }

                    rows[y].push(Run {
                        alive: tag == b'o',
                        len,
                    });
                    x = end;
                }

                _ => return Err(invalid()),
            }

            bytes = after;
        }
    }

    warn!("RLE pattern is missing its '!' terminator");

    Ok(rows)
}

/// Encode `grid` as RLE. Trailing dead cells are left out, and empty rows are folded into a
/// single `$` run.
pub fn encode(grid: &Grid, rule: &RuleSet) -> String {
    let mut out = format!(
        "x = {}, y = {}, rule = {}\n",
        grid.width(),
        grid.height(),
        rule
    );
    let mut line_len = 0;

    let mut push = |out: &mut String, len: usize, tag: char| {
        let token = if len == 1 {
            tag.to_string()
        } else {
            format!("{len}{tag}")
        };

        if line_len + token.len() > MAX_LINE_LEN {
            out.push('\n');
            line_len = 0;
        }

        out.push_str(&token);
        line_len += token.len();
    };

    let mut newlines = 0;

    for row in grid.rows() {
        // Drop trailing dead cells
        let row = &row[..row.iter().rposition(|&c| c).map_or(0, |i| i + 1)];

        if !row.is_empty() {
            if newlines > 0 {
                push(&mut out, newlines, '$');
            }

            for run in row.chunk_by(|a, b| a == b) {
                push(&mut out, run.len(), if run[0] { 'o' } else { 'b' });
            }

            newlines = 0;
        }

        newlines += 1;
    }

    push(&mut out, 1, '!');
    out.push('\n');

    out
}
