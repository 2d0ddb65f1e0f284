use crate::error::ConfigError;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.discogs.com";
pub const DEFAULT_USERNAME: &str = "justingodard";
pub const USER_AGENT: &str = concat!("cogsync/", env!("CARGO_PKG_VERSION"));

const PLACEHOLDER_USERNAME: &str = "YOUR_DISCOGS_USERNAME";
const PLACEHOLDER_TOKEN: &str = "YOUR_DISCOGS_API_TOKEN";

/// Everything the fetcher and the proxy need to talk to Discogs.
#[derive(Debug, Clone)]
pub struct DiscogsConfig {
    pub api_base: Url,
    pub username: String,
    pub token: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
}

impl DiscogsConfig {
    /// Rejects empty or placeholder credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_credential("username", &self.username, PLACEHOLDER_USERNAME)?;
        check_credential("token", &self.token, PLACEHOLDER_TOKEN)?;
        if self.api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiBase(self.api_base.to_string()));
        }
        Ok(())
    }

    /// Builds `<api_base>/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn folders_url(&self) -> Url {
        self.endpoint(&["users", &self.username, "collection", "folders"])
    }

    pub fn folder_releases_url(&self, folder_id: u64, per_page: u32, page: u32) -> Url {
        let folder_id = folder_id.to_string();
        let mut url = self.endpoint(&[
            "users",
            &self.username,
            "collection",
            "folders",
            &folder_id,
            "releases",
        ]);
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    /// Maps a proxied request path (already percent-encoded) onto the API base.
    pub fn proxy_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.api_base.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base_path, path.trim_start_matches('/')));
        url.set_query(query);
        url
    }

    pub fn authorization(&self) -> String {
        format!("Discogs token={}", self.token)
    }
}

fn check_credential(
    name: &'static str,
    value: &str,
    placeholder: &str,
) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    if value == placeholder {
        return Err(ConfigError::Placeholder(name));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub discogs: DiscogsConfig,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[cfg(test)]
pub(crate) fn test_config(api_base: &str, data_dir: PathBuf) -> DiscogsConfig {
    DiscogsConfig {
        api_base: Url::parse(api_base).unwrap(),
        username: "crate_digger".to_string(),
        token: "secret-token".to_string(),
        user_agent: USER_AGENT.to_string(),
        data_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_base: &str) -> DiscogsConfig {
        test_config(api_base, PathBuf::from("data"))
    }

    #[test]
    fn builds_folder_urls() {
        let config = config(DEFAULT_API_BASE);
        assert_eq!(
            config.folders_url().as_str(),
            "https://api.discogs.com/users/crate_digger/collection/folders"
        );
        assert_eq!(
            config.folder_releases_url(0, 100, 3).as_str(),
            "https://api.discogs.com/users/crate_digger/collection/folders/0/releases?per_page=100&page=3"
        );
    }

    #[test]
    fn keeps_api_base_path_prefix() {
        let config = config("http://localhost:9000/mirror/");
        assert_eq!(
            config.folders_url().as_str(),
            "http://localhost:9000/mirror/users/crate_digger/collection/folders"
        );
        assert_eq!(
            config
                .proxy_url("/database/search", Some("q=nirvana"))
                .as_str(),
            "http://localhost:9000/mirror/database/search?q=nirvana"
        );
    }

    #[test]
    fn encodes_username_segment() {
        let mut config = config(DEFAULT_API_BASE);
        config.username = "dj shadow/x".to_string();
        assert_eq!(
            config.folders_url().as_str(),
            "https://api.discogs.com/users/dj%20shadow%2Fx/collection/folders"
        );
    }

    #[test]
    fn authorization_embeds_token() {
        assert_eq!(
            config(DEFAULT_API_BASE).authorization(),
            "Discogs token=secret-token"
        );
    }

    #[test]
    fn rejects_missing_and_placeholder_credentials() {
        let mut config = config(DEFAULT_API_BASE);
        assert_eq!(config.validate(), Ok(()));

        config.token = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Missing("token")));

        config.token = PLACEHOLDER_TOKEN.to_string();
        assert_eq!(config.validate(), Err(ConfigError::Placeholder("token")));

        config.token = "real".to_string();
        config.username = PLACEHOLDER_USERNAME.to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Placeholder("username"))
        );
    }
}
