//! Distro naming tables.
//!
//! The kernel feed names distros the way its crawlers do (`AlmaLinux`,
//! `CentOS`), the build backend uses lowercase target names (`almalinux`,
//! `centos`). Only distros listed here get configs generated for them.

/// `(backend name, feed name)` for every supported distro, sorted by backend name.
const SUPPORTED_DISTROS: &[(&str, &str)] = &[
    ("almalinux", "AlmaLinux"),
    ("amazonlinux", "AmazonLinux"),
    ("amazonlinux2", "AmazonLinux2"),
    ("amazonlinux2022", "AmazonLinux2022"),
    ("amazonlinux2023", "AmazonLinux2023"),
    ("bottlerocket", "BottleRocket"),
    ("centos", "CentOS"),
    ("debian", "Debian"),
    ("fedora", "Fedora"),
    ("minikube", "Minikube"),
    ("photon", "PhotonOS"),
    ("talos", "Talos"),
    ("ubuntu", "Ubuntu"),
];

/// Backend name of a known feed distro.
pub fn backend_name(feed_distro: &str) -> Option<&'static str> {
    SUPPORTED_DISTROS
        .iter()
        .find(|(_, feed)| *feed == feed_distro)
        .map(|(backend, _)| *backend)
}

/// Translate a feed distro name to the backend naming.
///
/// Unknown names fall back to a lowercased copy of the input, so values that are
/// only meant as filters (`Cent.*`) keep working. Regex escapes are kept as
/// written: `\D` must not turn into `\d`.
pub fn to_backend_distro(feed_distro: &str) -> String {
    match backend_name(feed_distro) {
        Some(backend) => backend.to_string(),
        None => lowercase_literals(feed_distro),
    }
}

/// Lowercases every character that is not part of a backslash escape.
/// `\p{Lu}` style class names are copied through their closing brace.
fn lowercase_literals(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend(c.to_lowercase());
            continue;
        }
        out.push(c);
        let Some(escaped) = chars.next() else {
            break;
        };
        out.push(escaped);
        if matches!(escaped, 'p' | 'P') {
            let rest = chars.as_str();
            if rest.starts_with('{') {
                if let Some(end) = rest.find('}') {
                    out.push_str(&rest[..=end]);
                    chars = rest[end + 1..].chars();
                }
            }
        }
    }
    out
}

pub fn is_supported(backend_distro: &str) -> bool {
    SUPPORTED_DISTROS
        .iter()
        .any(|(backend, _)| *backend == backend_distro)
}

/// Sorted backend names of all supported distros.
pub fn supported_distros() -> Vec<&'static str> {
    SUPPORTED_DISTROS.iter().map(|(backend, _)| *backend).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_to_backend() {
        assert_eq!(to_backend_distro("AlmaLinux"), "almalinux");
        assert_eq!(to_backend_distro("PhotonOS"), "photon");
        assert_eq!(to_backend_distro("BottleRocket"), "bottlerocket");
    }

    #[test]
    fn test_unknown_feed_name_is_lowercased() {
        assert_eq!(to_backend_distro("Cent.*"), "cent.*");
        assert_eq!(to_backend_distro("Flatcar"), "flatcar");
        assert!(!is_supported("flatcar"));
    }

    #[test]
    fn test_backend_name_lookup() {
        assert_eq!(backend_name("CentOS"), Some("centos"));
        assert_eq!(backend_name("centos"), None);
    }

    #[test]
    fn test_fallback_keeps_regex_escapes() {
        assert_eq!(to_backend_distro(r"^\D+$"), r"^\D+$");
        assert_eq!(to_backend_distro(r"Ubuntu\S*\W"), r"ubuntu\S*\W");
        assert_eq!(to_backend_distro(r"\p{Lu}Linux"), r"\p{Lu}linux");
        assert_eq!(to_backend_distro(r"Photon\.OS"), r"photon\.os");
        assert_eq!(to_backend_distro("Trailing\\"), "trailing\\");
    }

    #[test]
    fn test_supported_list_sorted() {
        let list = supported_distros();
        let mut sorted = list.clone();
        sorted.sort_unstable();
        assert_eq!(list, sorted);
        assert!(list.contains(&"ubuntu"));
    }
}
