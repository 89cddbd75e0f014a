//! Console URL building and the same-site check applied to post-login redirect targets.

use url::{form_urlencoded, Url};

/// A path with an ordered list of query arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleUrl {
    path: String,
    args: Vec<(String, String)>,
}

impl ConsoleUrl {
    /// Parse a path with an optional query string, e.g. a request URI.
    pub fn parse(uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        let args = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Self {
            path: path.to_string(),
            args,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn set_argument(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.args.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.args.push((name.to_string(), value)),
        }
        self
    }

    pub fn remove_argument(mut self, name: &str) -> Self {
        self.args.retain(|(k, _)| k != name);
        self
    }
}

impl std::fmt::Display for ConsoleUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            return f.write_str(&self.path);
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.args.iter())
            .finish();
        write!(f, "{}?{}", self.path, query)
    }
}

/// Whether `target` stays on this site. Relative references are accepted; absolute URLs only
/// with an http(s) scheme and the given `host` (as sent in the Host header).
pub fn is_same_site(target: &str, host: Option<&str>) -> bool {
    let target = target.trim();
    if target.is_empty()
        || target.starts_with("//")
        || target.contains('\\')
        || target.chars().any(|c| c.is_control())
    {
        return false;
    }

    match Url::parse(target) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                return false;
            }
            let authority = match (url.host_str(), url.port()) {
                (Some(h), Some(p)) => format!("{}:{}", h, p),
                (Some(h), None) => h.to_string(),
                (None, _) => return false,
            };
            host.is_some_and(|host| host.eq_ignore_ascii_case(&authority))
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_edit_arguments() {
        let url = ConsoleUrl::parse("/index_mfa.php?state=abc&duo_code=1&x=y")
            .remove_argument("state")
            .remove_argument("duo_code")
            .set_argument("request", "zabbix.php?action=dashboard.view");

        assert_eq!(url.argument("x"), Some("y"));
        assert_eq!(
            url.to_string(),
            "/index_mfa.php?x=y&request=zabbix.php%3Faction%3Ddashboard.view"
        );
        assert_eq!(ConsoleUrl::parse("index.php").to_string(), "index.php");
        assert_eq!(
            ConsoleUrl::parse("index.php").set_argument("form", "default").to_string(),
            "index.php?form=default"
        );
    }

    #[test]
    fn test_same_site() {
        assert!(is_same_site("zabbix.php?action=module.list", None));
        assert!(is_same_site("/zabbix.php", None));
        assert!(is_same_site("http://console.local/zabbix.php", Some("console.local")));
        assert!(is_same_site("https://console.local:8443/", Some("console.local:8443")));

        assert!(!is_same_site("https://evil.example/", Some("console.local")));
        assert!(!is_same_site("http://console.local/", None));
        assert!(!is_same_site("//evil.example/", Some("console.local")));
        assert!(!is_same_site("javascript:alert(1)", Some("console.local")));
        assert!(!is_same_site("/\\evil.example", None));
        assert!(!is_same_site("", None));
    }
}
