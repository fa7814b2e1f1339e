//! Folder selection, renaming, and ordering policy
//!
//! A [`FolderPolicy`] bundles the four user-configurable transforms
//! applied during folder discovery: name translation, an inclusion
//! filter, a sort comparator, and the literal include list. All four
//! default to identity/no-op. The policy is built once at repository
//! construction and is immutable afterwards.
//!
//! The discovery loop feeds `filter_accept` the *translated* name
//! (and includes bypass the filter entirely); translation input is
//! always the raw server name. Keep that asymmetry in mind when
//! writing expressions.
//!
//! Transforms can be injected as plain closures, or compiled from
//! small configuration expressions whose only capability is regular
//! expressions:
//!
//! - translation: `s/pattern/replacement/` substitutions, chained
//!   with `;`, applied in order (`$1` group references work)
//! - filter: `accept /pattern/` keeps only matching names,
//!   `reject /pattern/` drops matching names
//! - sort: `lexical` (the default) or `reverse`

use crate::error::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

type TranslateFn = Box<dyn Fn(&str) -> String + Send + Sync>;
type FilterFn = Box<dyn Fn(&str) -> bool + Send + Sync>;
type SortFn = Box<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Folder discovery policy: four optional transforms plus the
/// explicit include list.
pub struct FolderPolicy {
    translate: TranslateFn,
    filter: FilterFn,
    sort: SortFn,
    includes: Vec<String>,
}

impl fmt::Debug for FolderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderPolicy")
            .field("includes", &self.includes)
            .finish_non_exhaustive()
    }
}

impl Default for FolderPolicy {
    fn default() -> Self {
        Self {
            translate: Box::new(str::to_string),
            filter: Box::new(|_| true),
            sort: Box::new(str::cmp),
            includes: Vec::new(),
        }
    }
}

impl FolderPolicy {
    /// Identity policy: no translation, everything accepted, natural
    /// lexical ordering, no includes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a policy from configuration expressions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an expression is malformed
    /// or a pattern fails to compile.
    pub fn from_exprs(
        name_translate: Option<&str>,
        folder_filter: Option<&str>,
        folder_sort: Option<&str>,
        includes: Vec<String>,
    ) -> Result<Self> {
        let mut policy = Self::new().with_includes(includes);
        if let Some(expr) = name_translate {
            policy.translate = compile_translate(expr)?;
        }
        if let Some(expr) = folder_filter {
            policy.filter = compile_filter(expr)?;
        }
        if let Some(expr) = folder_sort {
            policy.sort = compile_sort(expr)?;
        }
        Ok(policy)
    }

    #[must_use]
    pub fn with_name_translate(
        mut self,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.translate = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_sort(
        mut self,
        f: impl Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Box::new(f);
        self
    }

    #[must_use]
    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    /// Map a raw server folder name to its display name.
    #[must_use]
    pub fn translate(&self, raw_name: &str) -> String {
        (self.translate)(raw_name)
    }

    /// Whether a discovered folder passes the inclusion filter.
    /// Folders rejected here are dropped from discovery entirely;
    /// they reappear only if listed in [`FolderPolicy::includes`].
    #[must_use]
    pub fn filter_accept(&self, name: &str) -> bool {
        (self.filter)(name)
    }

    /// Compare two display names for the final ordering.
    #[must_use]
    pub fn sort_compare(&self, a: &str, b: &str) -> Ordering {
        (self.sort)(a, b)
    }

    /// Folder names forced into the result set independent of
    /// discovery and filtering.
    #[must_use]
    pub fn includes(&self) -> &[String] {
        &self.includes
    }
}

/// Parse `s/pattern/replacement/` chains into a translation closure.
fn compile_translate(expr: &str) -> Result<TranslateFn> {
    let mut rules = Vec::new();
    for part in expr.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (pattern, replacement) = parse_substitution(part)?;
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("name_translate pattern: {e}")))?;
        rules.push((regex, replacement));
    }
    if rules.is_empty() {
        return Err(Error::Config("empty name_translate expression".into()));
    }
    Ok(Box::new(move |name| {
        let mut out = name.to_string();
        for (regex, replacement) in &rules {
            out = regex.replace_all(&out, replacement.as_str()).into_owned();
        }
        out
    }))
}

/// Split one `s/pattern/replacement/` rule. `\/` escapes a literal
/// slash inside either section; other backslash escapes pass through
/// to the regex untouched.
fn parse_substitution(part: &str) -> Result<(String, String)> {
    let body = part.strip_prefix("s/").ok_or_else(|| {
        Error::Config(format!("name_translate rule must start with 's/': {part}"))
    })?;

    let mut sections = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('/') => current.push('/'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => {
                    return Err(Error::Config(format!(
                        "name_translate rule ends mid-escape: {part}"
                    )));
                }
            },
            '/' => sections.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    // s/pat/repl/ scans to two closed sections and nothing after the
    // final slash.
    match <[String; 2]>::try_from(sections) {
        Ok([pattern, replacement]) if current.is_empty() => Ok((pattern, replacement)),
        _ => Err(Error::Config(format!(
            "name_translate rule needs 's/pat/repl/': {part}"
        ))),
    }
}

/// Parse `accept /pat/` or `reject /pat/` into a filter closure.
fn compile_filter(expr: &str) -> Result<FilterFn> {
    let expr = expr.trim();
    let (accept, rest) = if let Some(rest) = expr.strip_prefix("accept ") {
        (true, rest)
    } else if let Some(rest) = expr.strip_prefix("reject ") {
        (false, rest)
    } else {
        return Err(Error::Config(format!(
            "folder_filter must be 'accept /pat/' or 'reject /pat/': {expr}"
        )));
    };
    let pattern = rest
        .trim()
        .strip_prefix('/')
        .and_then(|s| s.strip_suffix('/'))
        .ok_or_else(|| {
            Error::Config(format!("folder_filter pattern must be /delimited/: {expr}"))
        })?;
    let regex =
        Regex::new(pattern).map_err(|e| Error::Config(format!("folder_filter pattern: {e}")))?;
    Ok(Box::new(move |name| regex.is_match(name) == accept))
}

/// Parse the sort keyword into a comparator closure.
fn compile_sort(expr: &str) -> Result<SortFn> {
    match expr.trim() {
        "lexical" => Ok(Box::new(str::cmp)),
        "reverse" => Ok(Box::new(|a: &str, b: &str| b.cmp(a))),
        other => Err(Error::Config(format!(
            "folder_sort must be 'lexical' or 'reverse': {other}"
        ))),
    }
}
