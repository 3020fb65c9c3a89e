// ABOUTME: The fixed library of SQL scripts that build a view schema
// ABOUTME: Scripts are embedded at compile time and run in filename order

/// One SQL script from the `sql/` directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script {
    /// Filename without the `.sql` extension, e.g. `003-release_summary`
    pub name: &'static str,
    pub content: &'static str,
}

macro_rules! script {
    ($name:literal) => {
        Script {
            name: $name,
            content: include_str!(concat!("../../sql/", $name, ".sql")),
        }
    };
}

/// All scripts, in execution order.
pub const SCRIPTS: &[Script] = &[
    script!("001-flatten"),
    script!("002-tmp_release_summary"),
    script!("003-release_summary"),
    script!("004-parties"),
    script!("005-buyer"),
    script!("006-tender"),
    script!("007-awards"),
    script!("008-contracts"),
];

impl Script {
    /// Tables and views created by this script, in order of creation.
    ///
    /// Only statements starting at the beginning of a line are recognized:
    /// `CREATE TABLE name` and `CREATE VIEW name` (case-insensitive).
    pub fn created_relations(&self) -> Vec<String> {
        created_relations(self.content)
    }

    /// The script text, with views materialized as tables if requested.
    pub fn sql(&self, tables_only: bool) -> String {
        if tables_only {
            views_to_tables(self.content)
        } else {
            self.content.to_string()
        }
    }
}

pub fn created_relations(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            if line.starts_with(char::is_whitespace) {
                return None;
            }
            let mut words = line.split_whitespace();
            if !words.next()?.eq_ignore_ascii_case("CREATE") {
                return None;
            }
            let kind = words.next()?;
            if !kind.eq_ignore_ascii_case("VIEW") && !kind.eq_ignore_ascii_case("TABLE") {
                return None;
            }
            let name = words.next()?.trim_end_matches(['(', ';']);
            Some(name.to_string())
        })
        .collect()
}

/// Rewrite `CREATE VIEW` at the start of a line to `CREATE TABLE`.
pub fn views_to_tables(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let mut words = line.splitn(3, char::is_whitespace);
            match (words.next(), words.next(), words.next()) {
                (Some(create), Some(view), Some(rest))
                    if create.eq_ignore_ascii_case("CREATE") && view.eq_ignore_ascii_case("VIEW") =>
                {
                    format!("CREATE TABLE {}", rest)
                }
                _ => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Names of the documented tables: every created relation except staging
/// tables (`tmp_`, `staged_`) and `_no_data` variants, plus `field_counts`.
pub fn documented_tables() -> Vec<String> {
    let mut tables: Vec<String> = SCRIPTS
        .iter()
        .flat_map(Script::created_relations)
        .filter(|name| is_documented(name))
        .collect();
    tables.push(crate::views::FIELD_COUNTS_TABLE.to_string());
    tables
}

fn is_documented(name: &str) -> bool {
    !name.starts_with("tmp_") && !name.starts_with("staged_") && !name.ends_with("_no_data")
}
