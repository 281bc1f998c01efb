//! The literal scanner: a per-line state machine that decides, for every byte of a line,
//! whether it lies inside a string literal.
//!
//! Every pass that must not touch string contents (comment stripping, substitution, key
//! quoting, trailing comma removal) asks the same [`LineMask`], so they all agree on where
//! strings begin and end. State never carries over from one line to the next.

/// The scanner state at a given point of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    InString(char),
}

/// The result of scanning one line.
///
/// Both the opening and the closing quote are reported as inside the string, so a code
/// region never contains a quote character that delimits a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMask {
    in_string: Vec<bool>,
    literals: Vec<StringLiteral>,
    end_state: ScanState,
}

/// One string literal found on a line. `end` is exclusive and includes the closing quote
/// when the literal is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLiteral {
    pub start: usize,
    pub end: usize,
    pub quote: char,
    pub terminated: bool,
}

impl LineMask {
    /// Whether the byte at `index` is part of a string literal. Indices past the end of the
    /// line report the state the line ended in.
    pub fn in_string(&self, index: usize) -> bool {
        self.in_string
            .get(index)
            .copied()
            .unwrap_or(matches!(self.end_state, ScanState::InString(_)))
    }

    pub fn in_code(&self, index: usize) -> bool {
        !self.in_string(index)
    }

    /// The state left over at the end of the line. `InString` means the line holds an
    /// unterminated literal.
    pub fn end_state(&self) -> ScanState {
        self.end_state
    }

    /// The string literals of the line, in order.
    pub fn literals(&self) -> &[StringLiteral] {
        &self.literals
    }
}

/// Scans a single line. Any trailing newline is treated as ordinary text.
pub fn scan_line(line: &str) -> LineMask {
    let bytes = line.as_bytes();
    let mut in_string = vec![false; bytes.len()];
    let mut literals = Vec::new();
    let mut state = ScanState::Normal;
    let mut opened_at = 0;

    for (index, c) in line.char_indices() {
        let width = c.len_utf8();
        match state {
            ScanState::Normal => {
                if c == '"' || c == '\'' {
                    state = ScanState::InString(c);
                    opened_at = index;
                    mark(&mut in_string, index, width);
                }
            }
            ScanState::InString(quote) => {
                mark(&mut in_string, index, width);
                if c == quote && !is_escaped(bytes, index) {
                    state = ScanState::Normal;
                    literals.push(StringLiteral {
                        start: opened_at,
                        end: index + width,
                        quote,
                        terminated: true,
                    });
                }
            }
        }
    }

    if let ScanState::InString(quote) = state {
        literals.push(StringLiteral {
            start: opened_at,
            end: line.len(),
            quote,
            terminated: false,
        });
    }

    LineMask {
        in_string,
        literals,
        end_state: state,
    }
}

/// A quote is escaped when it is preceded by an odd number of consecutive backslashes.
pub fn is_escaped(bytes: &[u8], index: usize) -> bool {
    let backslashes = bytes[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 1
}

fn mark(in_string: &mut [bool], index: usize, width: usize) {
    for flag in &mut in_string[index..index + width] {
        *flag = true;
    }
}

/// Finds the byte index of the first `//` whose slashes both lie in code.
pub fn find_comment_start(line: &str, mask: &LineMask) -> Option<usize> {
    line.match_indices("//")
        .map(|(index, _)| index)
        .find(|&index| mask.in_code(index) && mask.in_code(index + 1))
}
