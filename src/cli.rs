//! `hoverzoom-resolve`: print the candidates the resolver produces for URLs.

use std::path::{Path, PathBuf};

use clap::Parser;
use hoverzoom_core::config::{ConfigError, HoverConfig};
use hoverzoom_core::media::ResolvedMedia;
use hoverzoom_core::resolve::MediaResolver;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "hoverzoom-resolve",
    version,
    about = "Print the full-resolution candidates for each URL as JSON"
)]
pub struct Cli {
    /// Resolve relative URLs against this page URL
    #[arg(long, value_name = "URL")]
    pub base: Option<String>,

    /// Read settings from PATH instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,

    /// URLs to resolve
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid base URL {base:?}: {source}")]
    InvalidBase {
        base: String,
        source: url::ParseError,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Get the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    // Try to use XDG config directory, fall back to home directory
    if let Some(config_dir) = dirs::config_dir() {
        Some(config_dir.join("hoverzoom").join(HoverConfig::default_filename()))
    } else {
        dirs::home_dir().map(|home_dir| {
            home_dir
                .join(".config")
                .join("hoverzoom")
                .join(HoverConfig::default_filename())
        })
    }
}

fn read_config(path: &Path) -> Result<HoverConfig, ConfigError> {
    let json = std::fs::read_to_string(path)?;
    HoverConfig::from_json(&json)
}

/// Where the settings came from.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// The default file exists but could not be read.
    Unreadable { path: PathBuf, error: ConfigError },
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: HoverConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Report where the settings came from. Called once the logger is up,
    /// since the log level itself comes from the config.
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => log::info!("Loaded configuration from {:?}", path),
            ConfigSource::Defaults => log::debug!("No config file found, using defaults"),
            ConfigSource::Unreadable { path, error } => {
                log::warn!("Failed to load config file {:?}: {}", path, error)
            }
        }
    }
}

/// Load settings. An explicit path must be readable; the default location
/// is optional and falls back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, CliError> {
    load_config_from(explicit, default_config_path().as_deref())
}

fn load_config_from(explicit: Option<&Path>, default: Option<&Path>) -> Result<LoadedConfig, CliError> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            config: read_config(path)?,
            source: ConfigSource::File(path.to_path_buf()),
        });
    }

    let Some(path) = default.filter(|p| p.exists()) else {
        return Ok(LoadedConfig {
            config: HoverConfig::default(),
            source: ConfigSource::Defaults,
        });
    };
    Ok(match read_config(path) {
        Ok(config) => LoadedConfig {
            config,
            source: ConfigSource::File(path.to_path_buf()),
        },
        Err(error) => LoadedConfig {
            config: HoverConfig::default(),
            source: ConfigSource::Unreadable {
                path: path.to_path_buf(),
                error,
            },
        },
    })
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub input: String,
    /// `None` when the input is not recognised as media.
    pub media: Option<ResolvedMedia>,
}

pub fn resolve_all(resolver: &MediaResolver, inputs: &[String]) -> Vec<ResolvedEntry> {
    inputs
        .iter()
        .map(|input| {
            let media = resolver.resolve(input);
            match &media {
                Some(media) => log::debug!("{} -> {} candidates", input, media.candidates().len()),
                None => log::debug!("{} is not media", input),
            }
            ResolvedEntry {
                input: input.clone(),
                media,
            }
        })
        .collect()
}

pub fn render(entries: &[ResolvedEntry], compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(entries)?
    } else {
        serde_json::to_string_pretty(entries)?
    })
}

pub fn resolver_for(cli: &Cli) -> Result<MediaResolver, CliError> {
    match cli.base.as_deref() {
        Some(base) => MediaResolver::try_with_base(base).map_err(|source| CliError::InvalidBase {
            base: base.to_string(),
            source,
        }),
        None => Ok(MediaResolver::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("hoverzoom-resolve").chain(list.iter().copied()))
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hoverzoom-test-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags_and_urls() {
        let cli = parse(&[
            "--base",
            "https://example.com/page",
            "--compact",
            "a.jpg",
            "--",
            "--weird.png",
        ])
        .unwrap();
        assert_eq!(cli.base.as_deref(), Some("https://example.com/page"));
        assert!(cli.compact);
        assert!(cli.config.is_none());
        assert_eq!(cli.urls, args(&["a.jpg", "--weird.png"]));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse(&[]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["--compact"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["--verbose", "a.jpg"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert!(parse(&["a.jpg", "--base"]).is_err());
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_invalid_base_is_an_error() {
        let cli = parse(&["--base", "not a url", "a.jpg"]).unwrap();
        assert!(matches!(
            resolver_for(&cli),
            Err(CliError::InvalidBase { base, .. }) if base == "not a url"
        ));

        let cli = parse(&["--base", "https://example.com/gallery/", "a.jpg"]).unwrap();
        let resolver = resolver_for(&cli).unwrap();
        assert_eq!(
            resolver.base().map(|u| u.as_str()),
            Some("https://example.com/gallery/")
        );
    }

    #[test]
    fn test_resolve_all_marks_non_media() {
        let resolver = MediaResolver::with_base("https://example.com/gallery/");
        let entries = resolve_all(&resolver, &args(&["photo.jpg", "https://example.com/about"]));
        assert_eq!(entries.len(), 2);
        let first = entries[0].media.as_ref().unwrap();
        assert_eq!(first.primary(), "https://example.com/gallery/photo.jpg");
        assert!(entries[1].media.is_none());
    }

    #[test]
    fn test_render_compact_json() {
        let resolver = MediaResolver::new();
        let entries = resolve_all(&resolver, &args(&["https://example.com/a.png"]));
        let json = render(&entries, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["input"], "https://example.com/a.png");
        assert_eq!(value[0]["media"]["type"], "image");
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let missing = temp_path("missing-config");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(
            load_config(Some(&missing)),
            Err(CliError::Config(ConfigError::IoError(_)))
        ));
    }

    #[test]
    fn test_explicit_config_is_read() {
        let path = temp_path("config");
        std::fs::write(&path, r#"{"alt_only": true, "log_level": "debug"}"#).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(loaded.config.alt_only);
        assert_eq!(loaded.config.log_level, hoverzoom_core::config::LogLevel::Debug);
        assert!(matches!(loaded.source, ConfigSource::File(p) if p == path));
    }

    #[test]
    fn test_broken_default_config_falls_back_with_reason() {
        let path = temp_path("broken-default");
        std::fs::write(&path, "{ not json").unwrap();
        let loaded = load_config_from(None, Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(!loaded.config.alt_only);
        assert!(matches!(
            loaded.source,
            ConfigSource::Unreadable { error: ConfigError::ParseError(_), .. }
        ));
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let path = temp_path("absent-default");
        let _ = std::fs::remove_file(&path);
        let loaded = load_config_from(None, Some(&path)).unwrap();
        assert!(matches!(loaded.source, ConfigSource::Defaults));
        assert!(matches!(
            load_config_from(None, None).unwrap().source,
            ConfigSource::Defaults
        ));
    }
}
