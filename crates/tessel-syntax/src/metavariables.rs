//! Metavariable syntax shared by the pattern compiler and matcher.
//!
//! Patterns use `$NAME` for a single node and `$$$NAME` for a run of sibling
//! nodes. Before parsing, each metavariable is rewritten to a placeholder
//! identifier the grammars accept, and the matcher recognises a pattern node
//! as a metavariable when its whole text is such a placeholder.

use crate::error::SyntaxError;

const SINGLE_PREFIX: &str = "__TESSEL_MV_";
const MULTI_PREFIX: &str = "__TESSEL_MVS_";
const PLACEHOLDER_SUFFIX: &str = "__";

/// Name bound by a bare `$$$`.
pub(crate) const ANONYMOUS_MULTI: &str = "_";

/// The kind of metavariable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaVarKind {
    /// Matches a single named node (`$VAR`).
    Single,
    /// Matches zero or more sibling nodes (`$$$VAR`).
    Multiple,
}

/// A metavariable occurrence in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaVariable {
    /// The name of the metavariable (without the `$` prefix).
    pub name: String,
    /// Single or variadic.
    pub kind: MetaVarKind,
    /// Byte offset where this metavariable appears in the pattern source.
    pub offset: usize,
}

impl MetaVariable {
    /// Returns whether matches record a binding for this metavariable.
    ///
    /// Names starting with `_` are wildcards and never bind.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        is_capturing_name(&self.name)
    }
}

/// Returns whether a binding is recorded for `name`.
#[must_use]
pub(crate) fn is_capturing_name(name: &str) -> bool {
    !name.starts_with('_')
}

/// Returns whether `c` is a valid first character for a metavariable name.
#[must_use]
pub(crate) const fn is_valid_metavar_start_char(c: char) -> bool {
    c.is_ascii_uppercase() || c == '_'
}

/// Returns whether `c` may continue a metavariable name.
#[must_use]
pub(crate) const fn is_valid_metavar_continuation_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

/// Extracts a metavariable name from a character stream positioned just
/// after the `$` prefix. Returns an empty string if no name starts there.
pub(crate) fn extract_metavar_name(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> String {
    let mut name = String::new();

    let Some((_, first_char)) = chars.peek().copied() else {
        return name;
    };

    if !is_valid_metavar_start_char(first_char) {
        return name;
    }

    name.push(first_char);
    chars.next();

    while let Some((_, c)) = chars.peek().copied() {
        if !is_valid_metavar_continuation_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }

    name
}

/// Builds the placeholder identifier standing in for a metavariable.
#[must_use]
pub(crate) fn placeholder_for(name: &str, kind: MetaVarKind) -> String {
    let prefix = match kind {
        MetaVarKind::Single => SINGLE_PREFIX,
        MetaVarKind::Multiple => MULTI_PREFIX,
    };
    format!("{prefix}{name}{PLACEHOLDER_SUFFIX}")
}

/// Recognises a placeholder identifier, returning its kind and name.
#[must_use]
pub(crate) fn parse_placeholder(text: &str) -> Option<(MetaVarKind, &str)> {
    let (kind, rest) = if let Some(rest) = text.strip_prefix(MULTI_PREFIX) {
        (MetaVarKind::Multiple, rest)
    } else {
        (MetaVarKind::Single, text.strip_prefix(SINGLE_PREFIX)?)
    };
    let name = rest.strip_suffix(PLACEHOLDER_SUFFIX)?;
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_valid_metavar_start_char)
        && chars.all(is_valid_metavar_continuation_char);
    valid.then_some((kind, name))
}

/// A pattern with its metavariables rewritten to placeholders.
#[derive(Debug)]
pub(crate) struct Normalised {
    pub(crate) text: String,
    pub(crate) metavariables: Vec<MetaVariable>,
}

/// Rewrites every metavariable in `source` to its placeholder.
///
/// A single `$` that is not followed by a name is kept as literal text, so
/// identifiers such as `$` in script languages remain expressible.
///
/// # Errors
///
/// Rejects two or more than three consecutive `$`, and a name used both as a
/// single and a variadic metavariable.
pub(crate) fn normalise(source: &str) -> Result<Normalised, SyntaxError> {
    let mut text = String::with_capacity(source.len());
    let mut metavariables: Vec<MetaVariable> = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '$' {
            text.push(ch);
            continue;
        }

        let mut dollar_count = 1;
        while chars.peek().is_some_and(|(_, c)| *c == '$') {
            chars.next();
            dollar_count += 1;
        }

        if dollar_count == 2 || dollar_count > 3 {
            return Err(SyntaxError::invalid_metavariable(format!(
                "metavariable at offset {offset} has invalid '$' prefix length ({dollar_count})"
            )));
        }

        let extracted = extract_metavar_name(&mut chars);
        let (kind, name) = match (dollar_count, extracted.is_empty()) {
            (3, true) => (MetaVarKind::Multiple, ANONYMOUS_MULTI.to_owned()),
            (3, false) => (MetaVarKind::Multiple, extracted),
            (_, true) => {
                text.push('$');
                continue;
            }
            (_, false) => (MetaVarKind::Single, extracted),
        };

        let conflicting = metavariables
            .iter()
            .any(|existing| existing.name == name && existing.kind != kind);
        if conflicting && is_capturing_name(&name) {
            return Err(SyntaxError::invalid_metavariable(format!(
                "metavariable `{name}` is used both as single and variadic"
            )));
        }

        text.push_str(&placeholder_for(&name, kind));
        metavariables.push(MetaVariable { name, kind, offset });
    }

    Ok(Normalised {
        text,
        metavariables,
    })
}
