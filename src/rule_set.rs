use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::grid::Grid;
use crate::parse_util;

/// Rules of Conway's Game of Life.
pub const B3S23: RuleSet = RuleSet::from_counts(&[3], &[2, 3]);

/// Named rules. Several names may share a rule; the first name listed for a rule is its
/// canonical one.
///
/// See: https://conwaylife.com/wiki/List_of_Life-like_rules
const REGISTRY: &[(&str, RuleSet)] = &[
    ("life", B3S23),
    ("conway", B3S23),
    ("conways-life", B3S23),
    ("standard", B3S23),
    ("highlife", RuleSet::from_counts(&[3, 6], &[2, 3])),
    ("high-life", RuleSet::from_counts(&[3, 6], &[2, 3])),
    ("day-and-night", RuleSet::from_counts(&[3, 6, 7, 8], &[3, 4, 6, 7, 8])),
    ("seeds", RuleSet::from_counts(&[2], &[])),
    ("replicator", RuleSet::from_counts(&[1, 3, 5, 7], &[1, 3, 5, 7])),
    ("fredkin", RuleSet::from_counts(&[1, 3, 5, 7], &[0, 2, 4, 6, 8])),
    ("live-free-or-die", RuleSet::from_counts(&[2], &[0])),
    ("life-without-death", RuleSet::from_counts(&[3], &[0, 1, 2, 3, 4, 5, 6, 7, 8])),
    ("maze", RuleSet::from_counts(&[3], &[1, 2, 3, 4, 5])),
    ("mazectric", RuleSet::from_counts(&[3], &[1, 2, 3, 4])),
    ("two-by-two", RuleSet::from_counts(&[3, 6], &[1, 2, 5])),
    ("2x2", RuleSet::from_counts(&[3, 6], &[1, 2, 5])),
    ("move", RuleSet::from_counts(&[3, 6, 8], &[2, 4, 5])),
    ("dry-life", RuleSet::from_counts(&[3, 7], &[2, 3])),
    ("pedestrian-life", RuleSet::from_counts(&[3, 8], &[2, 3])),
];

/// # Representation
/// Life rules are represented as
/// ```notrust
/// |------birth------|
/// 0000_0000_0000_0000_0000_0000_0000_0000
///                     |----survival-----|
/// ```
///
/// # Examples
/// ```notrust
/// b3s23:                0000_0000_0000_1000_0000_0000_0000_1100
///
/// b0s0:                 0000_0000_0000_0000_0000_0000_0000_0000
/// b012345678s012345678: 0000_0001_1111_1111_0000_0001_1111_1111
/// ```
///
/// See: https://conwaylife.com/wiki/Rulestring
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    rule: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Unknown rule \"{name}\"")]
    UnknownRule { name: String },

    #[error("Invalid rule \"{rule}\": {reason}")]
    InvalidRuleSyntax { rule: String, reason: SyntaxError },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unexpected character '{got}'")]
    UnexpectedChar { got: char },

    #[error("neighbor count {got} is larger than 8")]
    CountOutOfRange { got: u8 },

    #[error("missing survival section")]
    MissingSurvival,

    #[error("expected survivals and births separated by '/'")]
    MissingSlash,
}

impl Default for RuleSet {
    fn default() -> Self {
        B3S23
    }
}

impl RuleSet {
    /// Create a new `RuleSet` for the given births and survivals. For both `b` and
    /// `s`, numbers are set on a bit basis. For instance if bit `i` in `b` is on, it
    /// means `i` is included in the set of births. Any bit past the 8th is ignored.
    ///
    /// Big endian is used here (i.e. `b = 0b1` means b1, and `b = 0b1_0000_0000` means b8).
    pub const fn new(b: u16, s: u16) -> Self {
        let b = b & 0x1FF;
        let s = s & 0x1FF;

        Self {
            rule: (b as u32) << 16 | s as u32,
        }
    }

    /// Create a new `RuleSet` from lists of neighbor counts. Counts past 8 are ignored.
    pub const fn from_counts(births: &[u8], survivals: &[u8]) -> Self {
        const fn mask(counts: &[u8]) -> u16 {
            let mut m = 0;
            let mut i = 0;

            while i < counts.len() {
                if counts[i] <= 8 {
                    m |= 1 << counts[i];
                }

                i += 1;
            }

            m
        }

        Self::new(mask(births), mask(survivals))
    }

    pub fn births(&self) -> u16 {
        ((self.rule & 0x1FF0000) >> 0x10) as u16
    }

    pub fn survivals(&self) -> u16 {
        (self.rule & 0x1FF) as u16
    }

    /// Look a rule up by name. Case is ignored, and spaces, underscores and dashes are
    /// interchangeable.
    pub fn named(name: &str) -> Result<Self, RuleError> {
        Self::lookup(name).ok_or_else(|| RuleError::UnknownRule {
            name: name.to_string(),
        })
    }

    /// Every registered `(name, rule)` pair.
    pub fn registry() -> impl Iterator<Item = (&'static str, RuleSet)> {
        REGISTRY.iter().copied()
    }

    /// Canonical name of this rule, if it is registered.
    pub fn name(&self) -> Option<&'static str> {
        REGISTRY
            .iter()
            .find(|(_, rule)| rule == self)
            .map(|(name, _)| *name)
    }

    fn lookup(name: &str) -> Option<Self> {
        let name: String = name
            .trim()
            .chars()
            .filter(|&c| c != '\'')
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        REGISTRY
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, rule)| *rule)
    }

    /// State of a cell in the next generation, given whether it is alive now and how many of
    /// its neighbors are.
    pub fn next_state(&self, alive: bool, live_count: u8) -> bool {
        if live_count > 8 {
            return false;
        }

        let set = if alive {
            self.survivals()
        } else {
            self.births()
        };

        set >> live_count & 1 == 1
    }

    /// Compute the next generation of `grid`.
    ///
    /// Every cell is computed from `grid` as it is now, so no cell sees another's update.
    pub fn step(&self, grid: &Grid, wrap: bool) -> Grid {
        let (w, h) = (grid.width(), grid.height());
        let mut cells = Vec::with_capacity(w * h);

        for y in 0..h {
            for x in 0..w {
                let count = grid.live_neighbor_count(x, y, wrap);
                cells.push(self.next_state(grid.is_alive(x, y), count));
            }
        }

        Grid::from_cells(w, h, cells)
    }
}

impl FromStr for RuleSet {
    type Err = RuleError;

    /// Accepts a registered name, `B<digits>/S<digits>` (case-insensitive, `/` optional), or
    /// `<survivals>/<births>` as found in older pattern files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(rule) = Self::lookup(s) {
            return Ok(rule);
        }

        let invalid = |reason| RuleError::InvalidRuleSyntax {
            rule: s.to_string(),
            reason,
        };

        match s.as_bytes() {
            [b'b' | b'B', rest @ ..]
                if matches!(
                    rest.first(),
                    None | Some(b'0'..=b'9' | b'/' | b's' | b'S')
                ) =>
            {
                parse_birth_survival(s).map_err(invalid)
            }
            bytes
                if !bytes.is_empty()
                    && bytes.iter().all(|&b| b.is_ascii_digit() || b == b'/') =>
            {
                parse_survival_birth(s).map_err(invalid)
            }
            _ => Err(RuleError::UnknownRule {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn digits(f: &mut fmt::Formatter<'_>, mask: u16) -> fmt::Result {
            for n in 0..=8 {
                if mask >> n & 1 == 1 {
                    write!(f, "{n}")?;
                }
            }

            Ok(())
        }

        f.write_str("B")?;
        digits(f, self.births())?;
        f.write_str("/S")?;
        digits(f, self.survivals())
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({self})")
    }
}

// Parse rules that look like B3/S23
fn parse_birth_survival(rule: &str) -> Result<RuleSet, SyntaxError> {
    let (_, bytes) = parse_util::take_1(rule.as_bytes());

    let (b, bytes) = parse_util::take_digits(bytes);

    let bytes = match parse_util::take_1(bytes) {
        (Some(b'/'), rest) => rest,
        _ => bytes,
    };

    let bytes = match parse_util::take_1(bytes) {
        (Some(b's' | b'S'), rest) => rest,
        (Some(_), _) => return Err(unexpected(rule, bytes)),
        (None, _) => return Err(SyntaxError::MissingSurvival),
    };

    let (s, bytes) = parse_util::take_digits(bytes);

    if !bytes.is_empty() {
        return Err(unexpected(rule, bytes));
    }

    Ok(RuleSet::new(counts_to_mask(b)?, counts_to_mask(s)?))
}

// Parse rules that look like 23/3. These show up in RLE #r comment lines.
fn parse_survival_birth(rule: &str) -> Result<RuleSet, SyntaxError> {
    let Some((s, b)) = rule.split_once('/') else {
        return Err(SyntaxError::MissingSlash);
    };

    if b.contains('/') {
        return Err(SyntaxError::UnexpectedChar { got: '/' });
    }

    let s = counts_to_mask(Some(s.as_bytes()))?;
    let b = counts_to_mask(Some(b.as_bytes()))?;

    Ok(RuleSet::new(b, s))
}

/// The character at the start of `rest`, which must be a suffix of `rule`.
fn unexpected(rule: &str, rest: &[u8]) -> SyntaxError {
    let got = rule[rule.len() - rest.len()..]
        .chars()
        .next()
        .unwrap_or_default();

    SyntaxError::UnexpectedChar { got }
}

/// Convert the human readable birth/survival digits to a packed bit representation
fn counts_to_mask(digits: Option<&[u8]>) -> Result<u16, SyntaxError> {
    let mut n = 0;

    for &b in digits.unwrap_or_default() {
        if !b.is_ascii_digit() {
            return Err(SyntaxError::UnexpectedChar { got: b as char });
        }

        let count = b - b'0';
        if count > 8 {
            return Err(SyntaxError::CountOutOfRange { got: count });
        }

        n |= 1 << count;
    }

    Ok(n)
}
