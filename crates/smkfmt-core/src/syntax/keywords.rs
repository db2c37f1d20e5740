//! Workflow keyword table
//!
//! Maps `(scope, name)` to the category that decides how a keyword body is
//! parsed and laid out. The table is a plain value handed to the block tree
//! builder, so callers can extend or replace it.

use std::collections::HashMap;
use std::fmt;

/// Where a keyword line is being looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Module level, and inside host-language suites
    Global,
    /// Inside the body of a structural keyword such as `rule`
    Rule,
}

/// How a keyword body is parsed and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    /// `keyword: value` on a single line
    Inline,
    /// Comma-separated parameters, one per line
    List,
    /// One expression, each logical line its own chunk
    Expression,
    /// Named entity with nested keyword blocks
    Structural,
    /// Suite of host-language code
    BlockBody,
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeywordCategory::Inline => "inline",
            KeywordCategory::List => "list",
            KeywordCategory::Expression => "expression",
            KeywordCategory::Structural => "structural",
            KeywordCategory::BlockBody => "block-body",
        };
        f.write_str(name)
    }
}

const GLOBAL_KEYWORDS: &[(&str, KeywordCategory)] = &[
    ("configfile", KeywordCategory::Inline),
    ("workdir", KeywordCategory::Inline),
    ("include", KeywordCategory::Inline),
    ("pepfile", KeywordCategory::Inline),
    ("pepschema", KeywordCategory::Inline),
    ("report", KeywordCategory::Inline),
    ("ruleorder", KeywordCategory::Inline),
    ("container", KeywordCategory::Inline),
    ("containerized", KeywordCategory::Inline),
    ("singularity", KeywordCategory::Inline),
    ("conda", KeywordCategory::Inline),
    ("wildcard_constraints", KeywordCategory::List),
    ("localrules", KeywordCategory::List),
    ("envvars", KeywordCategory::List),
    ("rule", KeywordCategory::Structural),
    ("checkpoint", KeywordCategory::Structural),
    ("subworkflow", KeywordCategory::Structural),
    ("module", KeywordCategory::Structural),
    ("onstart", KeywordCategory::BlockBody),
    ("onsuccess", KeywordCategory::BlockBody),
    ("onerror", KeywordCategory::BlockBody),
];

const RULE_KEYWORDS: &[(&str, KeywordCategory)] = &[
    ("input", KeywordCategory::List),
    ("output", KeywordCategory::List),
    ("params", KeywordCategory::List),
    ("log", KeywordCategory::List),
    ("resources", KeywordCategory::List),
    ("benchmark", KeywordCategory::List),
    ("wildcard_constraints", KeywordCategory::List),
    ("envmodules", KeywordCategory::List),
    ("shell", KeywordCategory::Expression),
    ("script", KeywordCategory::Expression),
    ("wrapper", KeywordCategory::Expression),
    ("message", KeywordCategory::Expression),
    ("notebook", KeywordCategory::Expression),
    ("cwl", KeywordCategory::Expression),
    ("conda", KeywordCategory::Expression),
    ("container", KeywordCategory::Expression),
    ("singularity", KeywordCategory::Expression),
    ("shadow", KeywordCategory::Expression),
    ("group", KeywordCategory::Expression),
    ("name", KeywordCategory::Expression),
    ("template_engine", KeywordCategory::Expression),
    ("snakefile", KeywordCategory::Expression),
    ("workdir", KeywordCategory::Expression),
    ("configfile", KeywordCategory::Expression),
    ("config", KeywordCategory::Expression),
    ("meta_wrapper", KeywordCategory::Expression),
    ("prefix", KeywordCategory::Expression),
    ("replace_prefix", KeywordCategory::Expression),
    ("skip_validation", KeywordCategory::Expression),
    ("threads", KeywordCategory::Inline),
    ("priority", KeywordCategory::Inline),
    ("version", KeywordCategory::Inline),
    ("cache", KeywordCategory::Inline),
    ("retries", KeywordCategory::Inline),
    ("localrule", KeywordCategory::Inline),
    ("default_target", KeywordCategory::Inline),
    ("handover", KeywordCategory::Inline),
    ("run", KeywordCategory::BlockBody),
];

/// Swappable `(scope, name) -> category` lookup
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: HashMap<(Scope, String), KeywordCategory>,
}

impl KeywordTable {
    /// An empty table: every line is host-language code
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard Snakemake vocabulary
    pub fn snakemake() -> Self {
        let mut table = Self::new();
        for (name, category) in GLOBAL_KEYWORDS {
            table.insert(Scope::Global, *name, *category);
        }
        for (name, category) in RULE_KEYWORDS {
            table.insert(Scope::Rule, *name, *category);
        }
        table
    }

    /// Add or replace a keyword
    pub fn insert(&mut self, scope: Scope, name: impl Into<String>, category: KeywordCategory) {
        self.entries.insert((scope, name.into()), category);
    }

    /// Builder-style [`KeywordTable::insert`]
    pub fn with_keyword(
        mut self,
        scope: Scope,
        name: impl Into<String>,
        category: KeywordCategory,
    ) -> Self {
        self.insert(scope, name, category);
        self
    }

    pub fn remove(&mut self, scope: Scope, name: &str) -> Option<KeywordCategory> {
        self.entries.remove(&(scope, name.to_string()))
    }

    pub fn lookup(&self, scope: Scope, name: &str) -> Option<KeywordCategory> {
        self.entries.get(&(scope, name.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
