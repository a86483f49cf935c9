use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::schema::ItemSchema;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "page_url")]
    pub url: Option<String>,
    pub flavor: Option<String>,
    pub window_size: Option<usize>,
    /// Full override of the markup flavor's element names.
    pub schema: Option<ItemSchema>,
    pub start: Option<usize>,
    pub pages: Option<usize>,
    pub retries: Option<u32>,
    pub rate: Option<u32>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub follow_redirects: Option<bool>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub target: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".serviam").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# serviam config
#
# Location (default):
#   ~/.serviam/config.yml

# Results page to page through
# url: http://localhost:8042/results?q=alien

# Markup flavor: film (9 per window) or card (24 per window)
flavor: card
# window_size: 24
# start: 24

# Custom element names (overrides flavor)
# schema:
#   item_tag: card
#   poster_tag: picture
#   label_tag: text
#   window_size: 24
#   media_prefix: ""

# Paging
pages: 1
retries: 0
rate: 10

# HTTP (optional)
timeout: 10
# proxy: http://127.0.0.1:8080
# header: "Key: Value"
follow_redirects: true

# Output (optional)
# output: ./results.html
# output_format: html

# Query submission target: results or watch
target: results

no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_yaml_parses() {
        let cfg = parse_config(&default_config_yaml()).unwrap();
        assert_eq!(cfg.flavor.as_deref(), Some("card"));
        assert_eq!(cfg.pages, Some(1));
        assert_eq!(cfg.target.as_deref(), Some("results"));
        assert!(cfg.url.is_none());
    }

    #[test]
    fn schema_override_parses_without_media_prefix() {
        let cfg = parse_config(
            "page_url: http://h/results\nschema:\n  item_tag: show\n  poster_tag: still\n  label_tag: air_date\n  window_size: 12\n",
        )
        .unwrap();
        let schema = cfg.schema.unwrap();
        assert_eq!(schema.item_tag, "show");
        assert_eq!(schema.window_size, 12);
        assert_eq!(schema.media_prefix, "");
        assert_eq!(cfg.url.as_deref(), Some("http://h/results"));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("./out.html"), PathBuf::from("./out.html"));
    }
}
