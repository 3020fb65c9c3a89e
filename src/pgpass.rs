// ABOUTME: PostgreSQL password file (.pgpass) parsing and lookup
// ABOUTME: Honors wildcards, escapes and the owner-only permission requirement

use std::fs;
use std::path::Path;

/// Connection parameters a password file line is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordQuery<'a> {
    pub host: &'a str,
    pub port: u16,
    pub dbname: &'a str,
    pub user: &'a str,
}

/// One `hostname:port:database:username:password` line.
///
/// `None` in one of the first four fields is the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordEntry {
    pub host: Option<String>,
    pub port: Option<String>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: String,
}

impl PasswordEntry {
    /// Parse a single line. Returns `None` for blank lines, comments and
    /// lines without exactly five fields.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }

        let fields = split_fields(line);
        if fields.len() != 5 {
            return None;
        }

        let mut fields = fields.into_iter();
        let mut wildcard = || fields.next().filter(|f| f != "*");
        let host = wildcard();
        let port = wildcard();
        let dbname = wildcard();
        let user = wildcard();
        let password = fields.next().unwrap_or_default();

        Some(PasswordEntry {
            host,
            port,
            dbname,
            user,
            password,
        })
    }

    /// Whether this entry applies to the query.
    ///
    /// A non-numeric port field is logged and treated as a non-match.
    pub fn matches(&self, query: &PasswordQuery<'_>) -> bool {
        let port_matches = match &self.port {
            None => true,
            Some(port) => match port.parse::<u16>() {
                Ok(port) => port == query.port,
                Err(_) => {
                    tracing::warn!(
                        "Skipping PostgreSQL Password File: Error validating port value \"{}\"",
                        port
                    );
                    false
                }
            },
        };

        port_matches
            && field_matches(&self.host, &normalize_host(query.host))
            && field_matches(&self.dbname, query.dbname)
            && field_matches(&self.user, query.user)
    }
}

fn field_matches(field: &Option<String>, value: &str) -> bool {
    field.as_deref().map_or(true, |field| field == value)
}

/// Socket directories are matched as `localhost`, as libpq does.
fn normalize_host(host: &str) -> String {
    if host.is_empty() || host.starts_with('/') {
        "localhost".to_string()
    } else {
        host.to_string()
    }
}

/// Split on unescaped colons, resolving `\:` and `\\`.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Find the password for `query` in the file at `path`.
///
/// Never fails: a missing or unreadable file, unsafe permissions, or the
/// absence of a matching line all yield `None`. Unsafe permissions are logged.
pub fn lookup(path: &Path, query: &PasswordQuery<'_>) -> Option<String> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("PostgreSQL Password File {} not usable: {}", path.display(), e);
            return None;
        }
    };

    if !metadata.is_file() {
        return None;
    }

    if let Some(mode) = unsafe_mode(&metadata) {
        tracing::warn!(
            "Skipping PostgreSQL Password File: Invalid Permissions for {}: {:#o}.\nTry: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        );
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    find_password(&content, query)
}

/// First-match-wins scan over the file contents.
pub fn find_password(content: &str, query: &PasswordQuery<'_>) -> Option<String> {
    content
        .lines()
        .filter_map(PasswordEntry::parse)
        .find(|entry| entry.matches(query))
        .map(|entry| entry.password)
}

/// Returns the permission bits when the group or others have any access.
#[cfg(unix)]
fn unsafe_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode() & 0o777;
    (mode & 0o077 != 0).then_some(mode)
}

#[cfg(not(unix))]
fn unsafe_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn query() -> PasswordQuery<'static> {
        PasswordQuery {
            host: "localhost",
            port: 5432,
            dbname: "ocdskingfisher",
            user: "ocdskingfisher",
        }
    }

    #[test]
    fn test_parse_entry_with_wildcards() {
        let entry = PasswordEntry::parse("*:5432:*:ocdskingfisher:secret").unwrap();
        assert_eq!(entry.host, None);
        assert_eq!(entry.port.as_deref(), Some("5432"));
        assert_eq!(entry.dbname, None);
        assert_eq!(entry.user.as_deref(), Some("ocdskingfisher"));
        assert_eq!(entry.password, "secret");
    }

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        assert!(PasswordEntry::parse("# localhost:5432:db:user:pass").is_none());
        assert!(PasswordEntry::parse("   ").is_none());
        assert!(PasswordEntry::parse("localhost:5432:db:user").is_none());
        assert!(PasswordEntry::parse("localhost:5432:db:user:pass:extra").is_none());
    }

    #[test]
    fn test_parse_escaped_colon_in_password() {
        let entry = PasswordEntry::parse(r"localhost:5432:db:user:pa\:ss\\word").unwrap();
        assert_eq!(entry.password, r"pa:ss\word");
    }

    #[test]
    fn test_first_match_wins() {
        let content = "\
# comment
otherhost:5432:ocdskingfisher:ocdskingfisher:wrong
localhost:5432:ocdskingfisher:ocdskingfisher:secret
*:*:*:*:fallback
";
        assert_eq!(find_password(content, &query()).as_deref(), Some("secret"));
    }

    #[test]
    fn test_wildcard_match() {
        let content = "*:*:*:*:fallback\n";
        assert_eq!(find_password(content, &query()).as_deref(), Some("fallback"));
    }

    #[test]
    fn test_no_match() {
        let content = "localhost:5432:otherdb:ocdskingfisher:secret\n";
        assert_eq!(find_password(content, &query()), None);
    }

    #[test]
    fn test_bad_port_line_is_skipped() {
        let content = "\
localhost:invalid:ocdskingfisher:ocdskingfisher:wrong
localhost:5432:ocdskingfisher:ocdskingfisher:secret
";
        assert_eq!(find_password(content, &query()).as_deref(), Some("secret"));
    }

    #[test]
    fn test_socket_directory_matches_localhost() {
        let content = "localhost:5432:ocdskingfisher:ocdskingfisher:secret\n";
        let socket = PasswordQuery {
            host: "/var/run/postgresql",
            ..query()
        };
        assert_eq!(find_password(content, &socket).as_deref(), Some("secret"));
    }

    #[test]
    fn test_lookup_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(lookup(&dir.path().join("nonexistent"), &query()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_lookup_respects_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "localhost:5432:ocdskingfisher:ocdskingfisher:secret").unwrap();

        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(lookup(file.path(), &query()).as_deref(), Some("secret"));

        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(lookup(file.path(), &query()), None);
    }
}
