//! Include resolution: splicing `#include`d files into one logical stream.
//!
//! Files are walked depth-first. Every `#include` is replaced, in place,
//! by the fully resolved lines of the file it names, so the order of the
//! logical stream is the order a reader following the includes would see.
//! Conditional blocks (`#ifdef`, `#ifndef`, `#else`, `#endif`) are
//! evaluated on the way; lines in inactive branches are dropped, and
//! `#include`s inside them are never followed.
//!
//! Directive lines never reach the output. Every remaining line keeps an
//! [`Origin`] pointing at the file and line it came from; the files
//! themselves are recorded in a [`SourceMap`].

use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;

use super::fs::{FileSystem, normalize};
use super::source_map::SourceMap;
use crate::base::{FileId, Origin};
use crate::config::ParseConfig;
use crate::syntax::{COMMENT_MARKER, Directive, LineClass, LineError, LogicalLine, classify};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("cannot find include file '{reference}' (referenced from {}:{line})", from.display())]
    MissingInclude {
        /// The path as written in the directive.
        reference: String,
        from: PathBuf,
        line: u32,
        /// Every location that was tried.
        searched: Vec<PathBuf>,
    },

    #[error("circular inclusion involving {}: {}", path.display(), display_chain(chain))]
    Cycle {
        path: PathBuf,
        /// From the first file on the cycle back to itself.
        chain: Vec<PathBuf>,
    },

    #[error("'#{directive}' without a matching '#ifdef' or '#ifndef' at {}:{line}", path.display())]
    UnbalancedConditional {
        directive: &'static str,
        path: PathBuf,
        line: u32,
    },

    #[error("conditional opened at {}:{line} is never closed", path.display())]
    UnterminatedConditional { path: PathBuf, line: u32 },

    #[error("include depth exceeds {limit} at {}", path.display())]
    DepthLimit { limit: usize, path: PathBuf },

    #[error("{}:{line}: {source}", path.display())]
    Directive {
        path: PathBuf,
        line: u32,
        #[source]
        source: LineError,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read include file {} (referenced from {}:{line}): {source}", path.display(), from.display())]
    UnreadableInclude {
        path: PathBuf,
        from: PathBuf,
        line: u32,
        #[source]
        source: io::Error,
    },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One `#include` directive met during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InclusionEdge {
    /// The directive line in the including file.
    pub origin: Origin,
    /// The path as written.
    pub reference: String,
    /// `#include <...>` rather than `#include "..."`.
    pub system: bool,
    /// The included file; `None` when the include was not followed.
    pub target: Option<FileId>,
}

impl InclusionEdge {
    pub fn from(&self) -> FileId {
        self.origin.file
    }
}

/// The output of one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSource {
    pub lines: Vec<LogicalLine>,
    pub sources: SourceMap,
    /// Every include met in an active branch, in stream order.
    pub edges: Vec<InclusionEdge>,
}

/// Resolves an entry file against a file system.
#[derive(Clone, Copy)]
pub struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    config: &'a ParseConfig,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a ParseConfig) -> Self {
        Self { fs, config }
    }

    /// Resolve `entry` and everything it includes.
    #[tracing::instrument(level = "debug", skip_all, fields(entry = %entry.display()))]
    pub fn resolve(&self, entry: &Path) -> Result<ResolvedSource, ResolutionError> {
        let mut walk = Walk::new(self, true);
        walk.entry(normalize(entry))?;
        tracing::debug!(
            files = walk.out.sources.len(),
            lines = walk.out.lines.len(),
            "include graph resolved"
        );
        Ok(walk.out)
    }

    /// Read only `entry`. Includes are recorded as edges but not followed.
    pub fn scan(&self, entry: &Path) -> Result<ResolvedSource, ResolutionError> {
        let mut walk = Walk::new(self, false);
        walk.entry(normalize(entry))?;
        Ok(walk.out)
    }

    /// Where `reference`, included from `includer`, lives. On failure,
    /// returns every candidate that was tried.
    fn locate(&self, reference: &str, system: bool, includer: &Path) -> Result<PathBuf, Vec<PathBuf>> {
        let mut candidates = Vec::new();
        if !system {
            let dir = includer.parent().unwrap_or(Path::new(""));
            candidates.push(normalize(&dir.join(reference)));
        }
        candidates.extend(
            self.config
                .include_dirs
                .iter()
                .map(|dir| normalize(&dir.join(reference))),
        );
        match candidates.iter().find(|path| self.fs.is_file(path)) {
            Some(found) => Ok(found.clone()),
            None => Err(candidates),
        }
    }
}

/// An open `#ifdef`/`#ifndef` block.
#[derive(Debug)]
struct Conditional {
    line: u32,
    /// Whether the enclosing region is active.
    parent: bool,
    condition: bool,
    in_else: bool,
}

impl Conditional {
    fn taking(&self) -> bool {
        self.parent && (self.condition != self.in_else)
    }
}

struct Walk<'r, 'a> {
    resolver: &'r IncludeResolver<'a>,
    follow: bool,
    macros: FxHashMap<SmolStr, Option<String>>,
    chain: Vec<PathBuf>,
    on_chain: FxHashSet<PathBuf>,
    out: ResolvedSource,
}

impl<'r, 'a> Walk<'r, 'a> {
    fn new(resolver: &'r IncludeResolver<'a>, follow: bool) -> Self {
        Self {
            resolver,
            follow,
            macros: resolver.config.defines.iter().cloned().collect(),
            chain: Vec::new(),
            on_chain: FxHashSet::default(),
            out: ResolvedSource::default(),
        }
    }

    fn entry(&mut self, path: PathBuf) -> Result<(), ResolutionError> {
        let text = self
            .resolver
            .fs
            .read_to_string(&path)
            .map_err(|source| ResolutionError::Io {
                path: path.clone(),
                source,
            })?;
        self.visit(path, &text)
    }

    /// Fail if entering `path` would close a cycle or exceed the depth limit.
    fn check_enter(&self, path: &Path) -> Result<(), ResolutionError> {
        if self.on_chain.contains(path) {
            let start = self.chain.iter().position(|p| p == path).unwrap_or(0);
            let mut chain = self.chain[start..].to_vec();
            chain.push(path.to_owned());
            return Err(ResolutionError::Cycle {
                path: path.to_owned(),
                chain,
            });
        }
        let limit = self.resolver.config.max_include_depth;
        if self.chain.len() > limit {
            return Err(ResolutionError::DepthLimit {
                limit,
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    fn visit(&mut self, path: PathBuf, text: &str) -> Result<(), ResolutionError> {
        let file = self.out.sources.file_id(&path);
        self.on_chain.insert(path.clone());
        self.chain.push(path.clone());

        let mut open: Vec<Conditional> = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let origin = Origin::from_index(file, idx);
            let active = open.last().is_none_or(Conditional::taking);
            match classify(raw) {
                LineClass::Directive(directive) => {
                    self.directive(directive, origin, &path, &mut open, active)?
                }
                LineClass::Malformed(LineError::MalformedDirective { directive, reason }) if active => {
                    return Err(ResolutionError::Directive {
                        path,
                        line: origin.line,
                        source: LineError::MalformedDirective { directive, reason },
                    });
                }
                LineClass::Malformed(LineError::MalformedDirective { directive, .. })
                    if matches!(directive.as_str(), "ifdef" | "ifndef") =>
                {
                    // Still opens a block, so the skipped region nests.
                    open.push(Conditional {
                        line: origin.line,
                        parent: false,
                        condition: false,
                        in_else: false,
                    });
                }
                _ if !active => {}
                LineClass::Data(_) => {
                    let text = self.substitute(raw);
                    self.out.lines.push(LogicalLine::new(text, origin));
                }
                _ => self.out.lines.push(LogicalLine::new(raw, origin)),
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(ResolutionError::UnterminatedConditional {
                path,
                line: unclosed.line,
            });
        }
        self.chain.pop();
        self.on_chain.remove(&path);
        Ok(())
    }

    fn directive(
        &mut self,
        directive: Directive<'_>,
        origin: Origin,
        path: &Path,
        open: &mut Vec<Conditional>,
        active: bool,
    ) -> Result<(), ResolutionError> {
        let unbalanced = |directive| ResolutionError::UnbalancedConditional {
            directive,
            path: path.to_owned(),
            line: origin.line,
        };
        match directive {
            Directive::IfDef(name) | Directive::IfNDef(name) => {
                let defined = self.macros.contains_key(name);
                open.push(Conditional {
                    line: origin.line,
                    parent: active,
                    condition: defined == matches!(directive, Directive::IfDef(_)),
                    in_else: false,
                });
            }
            Directive::Else => match open.last_mut() {
                Some(block) if !block.in_else => block.in_else = true,
                _ => return Err(unbalanced("else")),
            },
            Directive::EndIf => {
                open.pop().ok_or_else(|| unbalanced("endif"))?;
            }
            _ if !active => {}
            Directive::Define { name, value } => {
                self.macros
                    .insert(SmolStr::new(name), value.map(str::to_owned));
            }
            Directive::Undef(name) => {
                self.macros.remove(name);
            }
            Directive::Include { path: reference, system } => {
                self.include(reference, system, origin, path)?;
            }
            Directive::Unknown(name) => {
                tracing::warn!(
                    directive = name,
                    at = %self.out.sources.describe(origin),
                    "skipping unsupported directive"
                );
            }
        }
        Ok(())
    }

    fn include(
        &mut self,
        reference: &str,
        system: bool,
        origin: Origin,
        includer: &Path,
    ) -> Result<(), ResolutionError> {
        let mut edge = InclusionEdge {
            origin,
            reference: reference.to_owned(),
            system,
            target: None,
        };
        if !self.follow {
            self.out.edges.push(edge);
            return Ok(());
        }

        let target = self
            .resolver
            .locate(reference, system, includer)
            .map_err(|searched| ResolutionError::MissingInclude {
                reference: reference.to_owned(),
                from: includer.to_owned(),
                line: origin.line,
                searched,
            })?;
        tracing::debug!(reference, path = %target.display(), "following include");
        self.check_enter(&target)?;
        let text = self
            .resolver
            .fs
            .read_to_string(&target)
            .map_err(|source| ResolutionError::UnreadableInclude {
                path: target.clone(),
                from: includer.to_owned(),
                line: origin.line,
                source,
            })?;
        let slot = self.out.edges.len();
        self.out.edges.push(edge.clone());
        self.visit(target.clone(), &text)?;
        edge.target = self.out.sources.lookup(&target);
        self.out.edges[slot] = edge;
        Ok(())
    }

    /// Replace whole tokens naming valued macros. Comments are kept.
    fn substitute(&self, raw: &str) -> String {
        let value_of = |token: &str| self.macros.get(token).and_then(Option::as_deref);
        let (content, comment) = raw.split_at(raw.find(COMMENT_MARKER).unwrap_or(raw.len()));
        if !content.split_whitespace().any(|token| value_of(token).is_some()) {
            return raw.to_owned();
        }
        let mut out = content
            .split_whitespace()
            .map(|token| value_of(token).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" ");
        if !comment.is_empty() {
            out.push(' ');
            out.push_str(comment);
        }
        out
    }
}
