//! Instance token generation and the deterministic object names/labels
//! derived from it.
//!
//! Per the design notes, this uses the OS CSPRNG directly rather than a
//! shared PRNG seeded once from wall-clock time — the one spot where we
//! deliberately diverge from the source tool's behavior.

use std::collections::BTreeMap;

use rand::rngs::OsRng;
use rand::Rng;

const TOKEN_LEN: usize = 5;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const APP_LABEL: &str = "app";
pub const APP_VALUE: &str = "pv-migrate";
pub const COMPONENT_LABEL: &str = "component";
pub const INSTANCE_LABEL: &str = "instance";

/// Which transient component an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Sshd,
    Rsync,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Sshd => "sshd",
            Component::Rsync => "rsync",
        }
    }
}

/// A short random lowercase-alphanumeric token scoping one run's objects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceToken(String);

impl InstanceToken {
    /// Generates a fresh token from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let token: String = (0..TOKEN_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ALPHABET.len());
                ALPHABET[idx] as char
            })
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the server (sshd) pod for this instance.
    pub fn server_pod_name(&self) -> String {
        format!("pv-migrate-sshd-{}", self.0)
    }

    /// Name of the client (rsync) job for this instance.
    pub fn client_job_name(&self) -> String {
        format!("pv-migrate-rsync-{}", self.0)
    }

    /// Name of the endpoint (Service) resource for this instance.
    pub fn endpoint_name(&self) -> String {
        format!("pv-migrate-{}", self.0)
    }

    /// The exact label set every object this run creates must carry.
    pub fn labels(&self, component: Component) -> BTreeMap<String, String> {
        BTreeMap::from([
            (APP_LABEL.to_string(), APP_VALUE.to_string()),
            (COMPONENT_LABEL.to_string(), component.as_str().to_string()),
            (INSTANCE_LABEL.to_string(), self.0.clone()),
        ])
    }

    /// The label selector cleanup uses to find every object this run created.
    pub fn selector(&self) -> String {
        format!("{}={},{}={}", APP_LABEL, APP_VALUE, INSTANCE_LABEL, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_five_lowercase_alphanumeric_chars() {
        let token = InstanceToken::generate();
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn tokens_are_distinct_with_overwhelming_probability() {
        let a = InstanceToken::generate();
        let b = InstanceToken::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn names_are_deterministic_functions_of_the_token() {
        let token = InstanceToken(String::from("ab3k9"));
        assert_eq!(token.server_pod_name(), "pv-migrate-sshd-ab3k9");
        assert_eq!(token.client_job_name(), "pv-migrate-rsync-ab3k9");
        assert_eq!(token.endpoint_name(), "pv-migrate-ab3k9");
    }

    #[test]
    fn label_set_is_exact() {
        let token = InstanceToken(String::from("ab3k9"));
        let labels = token.labels(Component::Sshd);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get("app"), Some(&"pv-migrate".to_string()));
        assert_eq!(labels.get("component"), Some(&"sshd".to_string()));
        assert_eq!(labels.get("instance"), Some(&"ab3k9".to_string()));
    }

    #[test]
    fn selector_matches_app_and_instance_only() {
        let token = InstanceToken(String::from("zzzzz"));
        assert_eq!(token.selector(), "app=pv-migrate,instance=zzzzz");
    }
}
