// ABOUTME: Resolves the database connection URI for every command
// ABOUTME: Precedence: KINGFISHER_VIEWS_DB_URI, then config.ini, then the password file

use crate::error::{Error, Result};
use crate::pgpass::{self, PasswordQuery};
use ini::{Ini, ParseOption};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const DATABASE_URI_VAR: &str = "KINGFISHER_VIEWS_DB_URI";
pub const PASSWORD_FILE_VAR: &str = "PGPASSFILE";

/// How the config file is referred to in user-facing messages.
pub const CONFIG_DISPLAY_PATH: &str = "~/.config/ocdskingfisher-views/config.ini";
const CONFIG_RELATIVE_PATH: &str = ".config/ocdskingfisher-views/config.ini";
const CONFIG_SECTION: &str = "DBHOST";
const DOCS_URL: &str = "https://kingfisher-views.readthedocs.io/en/latest/get-started.html";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: &str = "5432";

/// Everything the resolver reads from the process environment.
///
/// Captured once, so resolution itself touches no global state and can be
/// exercised in tests with arbitrary inputs.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub database_uri: Option<String>,
    pub password_file: Option<PathBuf>,
    pub config_path: PathBuf,
    pub login: Option<String>,
}

impl ConfigSources {
    pub fn from_env() -> Self {
        let home = env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(passwd_home)
            .unwrap_or_default();

        ConfigSources {
            database_uri: env::var(DATABASE_URI_VAR).ok(),
            password_file: env::var_os(PASSWORD_FILE_VAR).map(PathBuf::from),
            config_path: home.join(CONFIG_RELATIVE_PATH),
            login: login_name(),
        }
    }
}

/// A resolved connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
}

impl DatabaseSettings {
    /// Build `postgresql://[user[:password]@]host:port/dbname`.
    ///
    /// A Unix-socket directory host is percent-encoded, so `/var/run/postgresql`
    /// becomes `%2Fvar%2Frun%2Fpostgresql`.
    pub fn to_uri(&self) -> String {
        let mut uri = String::from("postgresql://");

        if !self.user.is_empty() {
            uri.push_str(&urlencoding::encode(&self.user));
            if let Some(password) = &self.password {
                uri.push(':');
                uri.push_str(&urlencoding::encode(password));
            }
            uri.push('@');
        }

        if self.host.starts_with('/') {
            uri.push_str(&urlencoding::encode(&self.host));
        } else {
            uri.push_str(&self.host);
        }
        uri.push(':');
        uri.push_str(&self.port.to_string());
        uri.push('/');
        uri.push_str(&urlencoding::encode(&self.dbname));
        uri
    }
}

/// Resolve the connection URI from the process environment.
pub fn get_database_uri() -> Result<String> {
    resolve_database_uri(&ConfigSources::from_env())
}

/// Resolve the connection URI from explicit sources.
///
/// # Errors
///
/// - [`Error::Usage`] if neither the environment variable nor the config file
///   is present, `DBNAME` is blank, or `PORT` is not an integer
/// - [`Error::NoSection`] / [`Error::NoOption`] / [`Error::Ini`] if the config
///   file is malformed
/// - [`Error::Io`] if the config file exists but cannot be read
pub fn resolve_database_uri(sources: &ConfigSources) -> Result<String> {
    if let Some(uri) = sources.database_uri.as_deref().filter(|uri| !uri.is_empty()) {
        return Ok(uri.to_string());
    }

    let mut settings = read_settings(sources)?;

    if settings.password.is_none() {
        settings.password = sources.password_file.as_deref().and_then(|path| {
            pgpass::lookup(
                path,
                &PasswordQuery {
                    host: &settings.host,
                    port: settings.port,
                    dbname: &settings.dbname,
                    user: &settings.user,
                },
            )
        });
    }

    Ok(settings.to_uri())
}

/// Read and validate the `[DBHOST]` section of the config file.
pub fn read_settings(sources: &ConfigSources) -> Result<DatabaseSettings> {
    let path = &sources.config_path;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::usage(format!(
                "You must either set the {} environment variable or create the {} file.\nSee {}",
                DATABASE_URI_VAR, CONFIG_DISPLAY_PATH, DOCS_URL
            )));
        }
        Err(source) => {
            return Err(Error::Io {
                path: path.clone(),
                source,
            })
        }
    };

    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(&content, options).map_err(|source| Error::Ini {
        path: path.clone(),
        source,
    })?;

    let section = ini
        .section(Some(CONFIG_SECTION))
        .ok_or_else(|| Error::NoSection {
            section: CONFIG_SECTION.to_string(),
            path: path.clone(),
        })?;

    let get = |option: &str| -> Result<String> {
        section
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(option))
            .map(|(_, value)| value.trim().to_string())
            .ok_or_else(|| Error::NoOption {
                option: option.to_string(),
                section: CONFIG_SECTION.to_string(),
            })
    };

    let host = get("HOST")?;
    let port = get("PORT")?;
    let user = get("USER")?;
    let password = get("PASSWORD")?;
    let dbname = get("DBNAME")?;

    if dbname.is_empty() {
        return Err(Error::usage(format!(
            "You must set DBNAME in {}.",
            CONFIG_DISPLAY_PATH
        )));
    }

    let port = or_default(port, DEFAULT_PORT).parse::<u16>().map_err(|e| {
        Error::usage(format!("PORT is invalid in {}. ({})", CONFIG_DISPLAY_PATH, e))
    })?;

    let user = if user.is_empty() {
        sources.login.clone().unwrap_or_default()
    } else {
        user
    };

    Ok(DatabaseSettings {
        host: or_default(host, DEFAULT_HOST),
        port,
        dbname,
        user,
        password: Some(password).filter(|p| !p.is_empty()),
    })
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// The current login name, checked the same way libpq-based tools do.
fn login_name() -> Option<String> {
    ["LOGNAME", "USER", "LNAME", "USERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|name| !name.is_empty())
        .or_else(|| {
            nix::unistd::User::from_uid(nix::unistd::getuid())
                .ok()
                .flatten()
                .map(|user| user.name)
        })
}

fn passwd_home() -> Option<PathBuf> {
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|user| user.dir)
}
