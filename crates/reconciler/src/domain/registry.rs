#![forbid(unsafe_code)]

/// Registry assumed for image references that carry no explicit host.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Extract the registry host from a container image reference.
///
/// `"nginx"` and `"library/nginx"` resolve to the default public registry;
/// only a first path segment containing a `.` or `:` is treated as an
/// explicit registry host (`"myregistry.io/nginx"`, `"localhost:5000/app"`).
pub fn extract_registry(image: &str) -> &str {
    let Some((first, _)) = image.split_once('/') else {
        return DEFAULT_REGISTRY;
    };
    if first.contains('.') || first.contains(':') {
        first
    } else {
        DEFAULT_REGISTRY
    }
}
