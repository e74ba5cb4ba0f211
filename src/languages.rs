//! Bundled rule tables
//!
//! Each bundled language is a [Language] entry: display name, lookup aliases, filename globs
//! and an accessor for its shared table. Tables are built on first use and then shared for
//! the life of the process.

pub mod gsql;

use crate::lexer::table::RuleTable;
use std::path::Path;

pub struct Language {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Globs of the form `*.ext` or exact file names.
    pub filenames: &'static [&'static str],
    table: fn() -> &'static RuleTable,
}

impl Language {
    pub fn table(&self) -> &'static RuleTable {
        (self.table)()
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn matches_file(&self, file_name: &str) -> bool {
        self.filenames.iter().any(|glob| match glob.strip_prefix('*') {
            Some(suffix) => file_name
                .len()
                .checked_sub(suffix.len())
                .and_then(|start| file_name.get(start..))
                .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix)),
            None => file_name == *glob,
        })
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("filenames", &self.filenames)
            .finish()
    }
}

static LANGUAGES: &[Language] = &[Language {
    name: gsql::NAME,
    aliases: &["gsql"],
    filenames: &["*.gsql"],
    table: gsql::table,
}];

pub fn all() -> &'static [Language] {
    LANGUAGES
}

/// Looks a language up by display name or alias, ignoring ASCII case.
pub fn by_name(name: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.matches_name(name))
}

/// Looks a language up by the file name of `path`.
pub fn for_filename(path: impl AsRef<Path>) -> Option<&'static Language> {
    let file_name = path.as_ref().file_name()?.to_str()?;
    LANGUAGES.iter().find(|lang| lang.matches_file(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("gsql")]
    #[case("GSQL")]
    #[case("Gsql")]
    fn test_by_name(#[case] name: &str) {
        assert_eq!(by_name(name).map(|l| l.name), Some("GSQL"));
    }

    #[rstest]
    #[case("query.gsql", Some("GSQL"))]
    #[case("dir/Query.GSQL", Some("GSQL"))]
    #[case("/abs/path/q.gsql", Some("GSQL"))]
    #[case("query.sql", None)]
    #[case("gsql", None)]
    fn test_for_filename(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(for_filename(path).map(|l| l.name), expected);
    }

    #[test]
    fn test_table_accessor_is_shared() {
        let gsql = by_name("gsql").unwrap();
        assert!(std::ptr::eq(gsql.table(), gsql::table()));
        assert_eq!(all().len(), 1);
    }
}
