//! Tableau symbols.

/// The role a symbol plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum SymbolKind {
    /// Placeholder for "no symbol".
    Invalid,
    /// Mirrors a user variable.
    External,
    /// Slack for an inequality.
    Slack,
    /// Error term of a soft constraint.
    Error,
    /// Marker of a required equality.
    Dummy,
}

/// A tableau symbol.
///
/// Ids come from a per-solver counter, so ordering symbols orders them by
/// creation. That order drives every tie-break in the simplex passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Symbol {
    id: usize,
    kind: SymbolKind,
}

impl Symbol {
    pub(crate) fn new(id: usize, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub(crate) fn invalid() -> Self {
        Self {
            id: 0,
            kind: SymbolKind::Invalid,
        }
    }

    pub(crate) fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub(crate) fn is_external(&self) -> bool {
        self.kind == SymbolKind::External
    }

    pub(crate) fn is_error(&self) -> bool {
        self.kind == SymbolKind::Error
    }

    pub(crate) fn is_dummy(&self) -> bool {
        self.kind == SymbolKind::Dummy
    }

    /// Slack and error symbols may be pivoted in for an artificial variable.
    pub(crate) fn is_pivotable(&self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }
}

/// The auxiliary symbols created when a constraint is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tag {
    pub marker: Symbol,
    pub other: Symbol,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            marker: Symbol::invalid(),
            other: Symbol::invalid(),
        }
    }
}
