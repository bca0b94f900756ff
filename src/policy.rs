//! Navigation policy for the embedded browser surface.
//!
//! Every outgoing navigation request the surface reports is classified by a
//! fixed, data-driven rule table: logout detection first, then document
//! types that belong in an external viewer, then the allow-list of
//! external-app domains. Everything else loads inline. Classification is
//! pure string matching on the request URL; nothing is resolved over the
//! network.

use serde::{Deserialize, Serialize};
use url::Url;

/// What the host should do with an outgoing navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum NavigationDecision {
    /// Let the surface load the URL in place
    LoadInline,
    /// Block the surface and open the URL via the OS
    DispatchExternally(String),
    /// The portal navigated to its logout endpoint; end the session
    TriggerLogout,
}

/// Ordered classification rules for outgoing navigation requests.
///
/// Logout detection always wins: a logout URL is never dispatched
/// externally, whatever the other rules would say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationPolicy {
    /// Prefixes that mean the portal logged the user out
    pub logout_prefixes: Vec<String>,
    /// Path extensions handed to an external viewer
    pub document_extensions: Vec<String>,
    /// Literal, case-sensitive URL prefixes opened in their own app
    pub external_prefixes: Vec<String>,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            logout_prefixes: vec!["https://app.reaisystems.com.br/usuario/logout".to_string()],
            document_extensions: vec![".pdf".to_string()],
            external_prefixes: vec![
                "https://api.whatsapp.com/".to_string(),
                "https://web.whatsapp.com/".to_string(),
                "https://whatsapp.com/".to_string(),
                "https://wa.me/".to_string(),
                "whatsapp://".to_string(),
                "https://www.facebook.com/".to_string(),
                "https://twitter.com/".to_string(),
                "https://x.com/".to_string(),
                "https://instagram.com/".to_string(),
            ],
        }
    }
}

impl NavigationPolicy {
    /// Default table with the logout rule taken from the given logout URL.
    pub fn for_logout_url(logout_url: &str) -> Self {
        Self {
            logout_prefixes: vec![logout_url.to_string()],
            ..Self::default()
        }
    }

    /// Classify one outgoing navigation request.
    pub fn decide(&self, url: &str) -> NavigationDecision {
        if self
            .logout_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
        {
            return NavigationDecision::TriggerLogout;
        }

        let path = Self::path_of(url);
        if self
            .document_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
        {
            return NavigationDecision::DispatchExternally(url.to_string());
        }

        if self
            .external_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
        {
            return NavigationDecision::DispatchExternally(url.to_string());
        }

        NavigationDecision::LoadInline
    }

    /// Path portion of the URL, without query or fragment. Falls back to
    /// manual truncation for strings the `url` crate cannot parse.
    fn path_of(raw: &str) -> String {
        if let Ok(parsed) = Url::parse(raw) {
            return parsed.path().to_string();
        }
        let end = raw
            .find(['?', '#'])
            .unwrap_or(raw.len());
        raw[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NavigationPolicy {
        NavigationPolicy::default()
    }

    #[test]
    fn test_portal_pages_load_inline() {
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/inicio/dashboard?origem=login"),
            NavigationDecision::LoadInline
        );
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/imoveis/busca"),
            NavigationDecision::LoadInline
        );
    }

    #[test]
    fn test_logout_url_triggers_logout() {
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/usuario/logout"),
            NavigationDecision::TriggerLogout
        );
        // Prefix match: trailing query parameters still count
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/usuario/logout?motivo=expirado"),
            NavigationDecision::TriggerLogout
        );
    }

    #[test]
    fn test_logout_wins_over_document_extension() {
        let policy = NavigationPolicy {
            logout_prefixes: vec!["https://portal.example/logout".to_string()],
            ..NavigationPolicy::default()
        };
        assert_eq!(
            policy.decide("https://portal.example/logout/report.pdf"),
            NavigationDecision::TriggerLogout
        );
    }

    #[test]
    fn test_logout_wins_over_allow_list() {
        let policy = NavigationPolicy {
            logout_prefixes: vec!["https://wa.me/".to_string()],
            ..NavigationPolicy::default()
        };
        assert_eq!(
            policy.decide("https://wa.me/5511999999999"),
            NavigationDecision::TriggerLogout
        );
    }

    #[test]
    fn test_pdf_dispatches_externally() {
        let url = "https://app.reaisystems.com.br/contratos/123/contrato.pdf";
        assert_eq!(
            policy().decide(url),
            NavigationDecision::DispatchExternally(url.to_string())
        );
    }

    #[test]
    fn test_pdf_with_query_string_dispatches_externally() {
        let url = "https://app.reaisystems.com.br/contratos/123/contrato.pdf?token=abc";
        assert_eq!(
            policy().decide(url),
            NavigationDecision::DispatchExternally(url.to_string())
        );
    }

    #[test]
    fn test_pdf_in_query_value_does_not_count() {
        // Only the path is checked for extensions
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/busca?arquivo=contrato.pdf"),
            NavigationDecision::LoadInline
        );
    }

    #[test]
    fn test_whatsapp_links_dispatch_externally() {
        for url in [
            "https://api.whatsapp.com/send?phone=5511999999999",
            "https://wa.me/5511999999999",
            "whatsapp://send?text=ola",
        ] {
            assert_eq!(
                policy().decide(url),
                NavigationDecision::DispatchExternally(url.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn test_social_links_dispatch_externally() {
        for url in [
            "https://www.facebook.com/smartimobiliario",
            "https://x.com/smartimobiliario",
            "https://instagram.com/smartimobiliario",
        ] {
            assert_eq!(
                policy().decide(url),
                NavigationDecision::DispatchExternally(url.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn test_allow_list_match_is_case_sensitive() {
        assert_eq!(
            policy().decide("https://WA.ME/5511999999999"),
            NavigationDecision::LoadInline
        );
    }

    #[test]
    fn test_allow_list_is_prefix_not_substring() {
        // A portal page linking out is not itself an external link
        assert_eq!(
            policy().decide("https://app.reaisystems.com.br/share?to=https://wa.me/55"),
            NavigationDecision::LoadInline
        );
    }

    #[test]
    fn test_for_logout_url_overrides_logout_rule() {
        let policy = NavigationPolicy::for_logout_url("https://staging.example/sair");
        assert_eq!(
            policy.decide("https://staging.example/sair"),
            NavigationDecision::TriggerLogout
        );
        assert_eq!(
            policy.decide("https://app.reaisystems.com.br/usuario/logout"),
            NavigationDecision::LoadInline
        );
    }
}
