/// Helper function to join path components
pub(crate) fn join_path(parts: &[&str]) -> String {
    parts.join("/")
}

/// Namespace part of a bundle name: everything before the last `/`.
pub(crate) fn bundle_namespace(bundle: &str) -> &str {
    match bundle.rsplit_once('/') {
        Some((namespace, _)) => namespace,
        None => bundle,
    }
}

/// Hash-range part of a bundle name: everything after the last `/`.
pub(crate) fn bundle_range(bundle: &str) -> &str {
    match bundle.rsplit_once('/') {
        Some((_, range)) => range,
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(
            join_path(&["/loadbalance", "brokers", "a:8080"]),
            "/loadbalance/brokers/a:8080"
        );
    }

    #[test]
    fn test_bundle_name_parts() {
        assert_eq!(
            bundle_namespace("tenant/ns1/0x00000000_0x80000000"),
            "tenant/ns1"
        );
        assert_eq!(
            bundle_range("tenant/ns1/0x00000000_0x80000000"),
            "0x00000000_0x80000000"
        );
        assert_eq!(bundle_namespace("no-range"), "no-range");
        assert_eq!(bundle_range("no-range"), "");
    }
}
