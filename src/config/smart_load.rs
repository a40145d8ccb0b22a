use figment::providers::{Data, Format, Json, Toml, Yaml};
use figment::value::{Dict, Map};
use figment::{Metadata, Profile, Provider};
use std::path::Path;

/// Provider for a config file whose format is chosen by its extension
///
/// Unknown extensions are read as TOML.
pub fn auto<P: AsRef<Path>>(path: P) -> ConfigFile {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => ConfigFile::Json(Json::file(path)),
        "yaml" | "yml" => ConfigFile::Yaml(Yaml::file(path)),
        "toml" => ConfigFile::Toml(Toml::file(path)),
        other => {
            tracing::debug!("unknown config extension '{other}', reading {} as TOML", path.display());
            ConfigFile::Toml(Toml::file(path))
        }
    }
}

pub enum ConfigFile {
    Toml(Data<Toml>),
    Json(Data<Json>),
    Yaml(Data<Yaml>),
}

impl ConfigFile {
    pub fn format_name(&self) -> &'static str {
        match self {
            ConfigFile::Toml(_) => "toml",
            ConfigFile::Json(_) => "json",
            ConfigFile::Yaml(_) => "yaml",
        }
    }
}

impl Provider for ConfigFile {
    fn metadata(&self) -> Metadata {
        match self {
            ConfigFile::Toml(p) => p.metadata(),
            ConfigFile::Json(p) => p.metadata(),
            ConfigFile::Yaml(p) => p.metadata(),
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        match self {
            ConfigFile::Toml(p) => p.data(),
            ConfigFile::Json(p) => p.data(),
            ConfigFile::Yaml(p) => p.data(),
        }
    }
}
