//! Declarations and the duplicate-name policy.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Origin;
use crate::config::OverridePolicy;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, Location, codes};
use crate::project::SourceMap;
use crate::schema::Record;
use crate::section::Section;

/// A value and the line that declared it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declared<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Declared<T> {
    pub fn new(value: T, origin: Origin) -> Self {
        Self { value, origin }
    }
}

/// A conflicting declaration that replaced an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Override {
    /// What was redeclared, e.g. `"atom type"`.
    pub what: String,
    pub name: String,
    pub previous: Location,
    pub replacement: Location,
}

impl Override {
    /// The override as a located warning, pointing back at the replaced
    /// definition.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(
            self.replacement.clone(),
            format!("{} '{}' overrides an earlier definition", self.what, self.name),
        )
        .with_code(codes::OVERRIDDEN_DEFINITION)
        .with_related(self.previous.clone(), format!("replaced definition of '{}'", self.name))
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' at {} overrides the definition at {}",
            self.what, self.name, self.replacement, self.previous
        )
    }
}

/// A section kept verbatim: an unregistered label and its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassthroughBlock {
    pub label: SmolStr,
    pub lines: Vec<String>,
}

impl PassthroughBlock {
    pub fn from_section(section: &Section) -> Self {
        let lines = section
            .records()
            .filter_map(|record| match record {
                Record::Raw(line) => Some(line.clone()),
                _ => None,
            })
            .collect();
        Self {
            label: section.label.clone(),
            lines,
        }
    }
}

impl fmt::Display for PassthroughBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ {} ]", self.label)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Bookkeeping shared by one assembly pass.
pub(crate) struct Assembly<'s> {
    pub sources: &'s SourceMap,
    pub policy: OverridePolicy,
    pub diagnostics: DiagnosticCollector,
    pub overrides: Vec<Override>,
}

impl<'s> Assembly<'s> {
    pub fn new(sources: &'s SourceMap, policy: OverridePolicy) -> Self {
        Self {
            sources,
            policy,
            diagnostics: DiagnosticCollector::new(),
            overrides: Vec::new(),
        }
    }

    pub fn location(&self, origin: Origin) -> Location {
        Location::of(self.sources, origin)
    }

    /// Insert `incoming` under `key`, settling a clash with an existing
    /// declaration of the same key.
    pub fn merge<K, V>(
        &mut self,
        table: &mut IndexMap<K, Declared<V>>,
        key: K,
        incoming: Declared<V>,
        what: &str,
    ) where
        K: Hash + Eq + fmt::Display,
        V: PartialEq,
    {
        match table.get_mut(&key) {
            Some(existing) => self.settle(existing, incoming, what, &key.to_string()),
            None => {
                table.insert(key, incoming);
            }
        }
    }

    /// Like [`merge`](Self::merge), for a declaration that can appear once.
    pub fn merge_single<V: PartialEq>(
        &mut self,
        slot: &mut Option<Declared<V>>,
        incoming: Declared<V>,
        what: &str,
    ) {
        match slot {
            Some(existing) => self.settle(existing, incoming, what, what),
            None => *slot = Some(incoming),
        }
    }

    fn settle<V: PartialEq>(
        &mut self,
        existing: &mut Declared<V>,
        incoming: Declared<V>,
        what: &str,
        name: &str,
    ) {
        if existing.value == incoming.value {
            tracing::trace!(what, name, at = %incoming.origin, "identical redeclaration");
            return;
        }
        let previous = self.location(existing.origin);
        let replacement = self.location(incoming.origin);
        if !self.replaces(existing.origin, incoming.origin) {
            self.diagnostics
                .ambiguous_definition(what, name, replacement, previous);
            return;
        }
        tracing::warn!(
            what,
            name,
            previous = %previous,
            replacement = %replacement,
            "definition overridden"
        );
        let applied = Override {
            what: what.to_string(),
            name: name.to_string(),
            previous,
            replacement,
        };
        self.diagnostics.add(applied.to_diagnostic());
        self.overrides.push(applied);
        *existing = incoming;
    }

    fn replaces(&self, existing: Origin, incoming: Origin) -> bool {
        match self.policy {
            OverridePolicy::Strict => false,
            OverridePolicy::EntryFileWins => {
                incoming.in_entry_file() && !existing.in_entry_file()
            }
            OverridePolicy::LastWins => true,
        }
    }
}
