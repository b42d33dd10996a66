pub mod client;
pub mod server;

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use crate::keys::KeyBundle;

pub(crate) fn object_meta(name: &str, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}

/// The four secret entries the sshd/rsync container images are
/// contractually wired to: `host-key`/`host-pub` identify the server,
/// `user-key`/`user-pub` authenticate the client. Both the source-side
/// and (when replicated) destination-side secret get this exact data,
/// so the two secrets are always byte-for-byte identical. `host-pub`
/// is the known_hosts-style line (address-prefixed), not the bare
/// public key, per the design invariant that it must begin with the
/// resolved endpoint address followed by a space.
pub(crate) fn secret_data(bundle: &KeyBundle, endpoint_address: &str) -> BTreeMap<String, ByteString> {
    let mut data = BTreeMap::new();
    data.insert(
        "host-key".to_string(),
        ByteString(bundle.host.private_key_pem.as_bytes().to_vec()),
    );
    data.insert(
        "host-pub".to_string(),
        ByteString(bundle.known_hosts_line(endpoint_address).as_bytes().to_vec()),
    );
    data.insert(
        "user-key".to_string(),
        ByteString(bundle.user.private_key_pem.as_bytes().to_vec()),
    );
    data.insert(
        "user-pub".to_string(),
        ByteString(bundle.user.public_key_line.as_bytes().to_vec()),
    );
    data
}

pub(crate) const SSHD_IMAGE: &str = "ghcr.io/pv-migrate/sshd:latest";
pub(crate) const RSYNC_IMAGE: &str = "ghcr.io/pv-migrate/rsync:latest";
pub(crate) const SSH_PORT: i32 = 22;
