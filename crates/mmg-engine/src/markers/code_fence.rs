/// The character a fence is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

/// A fence line: its character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFence {
    pub kind: FenceKind,
    pub len: usize,
}

impl CodeFence {
    pub const MIN_LEN: usize = 3;

    /// Reads a fence from the start of `line` (leading whitespace allowed).
    pub fn sig(line: &str) -> Option<CodeFence> {
        let t = line.trim_start();
        let kind = match t.chars().next()? {
            '`' => FenceKind::Backticks,
            '~' => FenceKind::Tildes,
            _ => return None,
        };
        let c = if kind == FenceKind::Backticks { '`' } else { '~' };
        let len = t.chars().take_while(|&ch| ch == c).count();
        (len >= Self::MIN_LEN).then_some(CodeFence { kind, len })
    }

    /// A closer uses the opener's character, is at least as long, and
    /// carries no info string.
    pub fn closes(&self, line: &str) -> bool {
        match Self::sig(line) {
            Some(fence) => {
                fence.kind == self.kind
                    && fence.len >= self.len
                    && line.trim().chars().count() == fence.len
            }
            None => false,
        }
    }
}

/// Per-line flags marking lines that belong to a fenced code block,
/// both fences included.
///
/// Directive scanning skips masked lines so documentation can show the
/// marker syntax without it taking effect. Classification ignores the mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlockMask {
    in_code: Vec<bool>,
    unclosed_from: Option<usize>,
}

impl CodeBlockMask {
    pub fn compute(lines: &[&str]) -> Self {
        let mut in_code = Vec::with_capacity(lines.len());
        let mut open: Option<(CodeFence, usize)> = None;

        for (index, line) in lines.iter().enumerate() {
            in_code.push(open.is_some() || CodeFence::sig(line).is_some());
            open = match open {
                Some((fence, _)) if fence.closes(line) => None,
                Some(open) => Some(open),
                None => CodeFence::sig(line).map(|fence| (fence, index)),
            };
        }

        Self {
            in_code,
            unclosed_from: open.map(|(_, start)| start),
        }
    }

    pub fn is_masked(&self, index: usize) -> bool {
        self.in_code.get(index).copied().unwrap_or(false)
    }

    /// Zero-based index of a fence opener that is never closed.
    pub fn unclosed_from(&self) -> Option<usize> {
        self.unclosed_from
    }
}
