//! Resource path composition
//!
//! Pure string helpers used to build the request path and the bound entity
//! path of every fetched resource, and to turn a path into a full URL.
//!
//! Three placeholders travel through paths:
//! - `{bcid}`: the id of the entity a template describes, substituted once when
//!   the entity is constructed
//! - `{webservice}`: the web service segment, substituted with `braincube` when
//!   a request is dispatched
//! - `{braincube-name}`: the tenant (cube) name, substituted in the final URL

/// Id placeholder inside relative entity path templates
pub const ID_PLACEHOLDER: &str = "{bcid}";

/// Web service placeholder inside entity paths
pub const WEBSERVICE_PLACEHOLDER: &str = "{webservice}";

/// Value substituted for [`WEBSERVICE_PLACEHOLDER`] at request time
pub const WEBSERVICE: &str = "braincube";

/// Tenant placeholder accepted in the configured base URLs
pub const TENANT_PLACEHOLDER: &str = "{braincube-name}";

const SEPARATOR: char = '/';

/// Remove the separators from both sides of a path segment
pub fn strip_path(path: &str) -> &str {
    path.trim_matches(SEPARATOR)
}

/// Remove the scheme and the surrounding separators from a domain name
pub fn strip_domain(domain: &str) -> &str {
    let domain = match domain.split_once("//") {
        Some((_, rest)) => rest,
        None => domain,
    };
    strip_path(domain)
}

/// Join path segments with a single separator
///
/// Each segment is stripped of its leading and trailing separators and empty
/// segments are skipped, so `join_path(&[&join_path(s)])` equals `join_path(s)`.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| strip_path(segment.as_ref()))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the `(request_path, entity_path)` pair for a child resource
///
/// The entity path always hangs off the parent. A collection request is built
/// from the parent path (list endpoints live beside the unresolved child
/// template) while a single-entity request is built from the entity path.
pub fn compose_paths(
    parent_path: &str,
    relative_entity_path: &str,
    request_suffix: &str,
    is_collection: bool,
) -> (String, String) {
    let entity_path = join_path(&[parent_path, relative_entity_path]);
    let pre_request_path = if is_collection {
        parent_path
    } else {
        entity_path.as_str()
    };
    let request_path = join_path(&[pre_request_path, request_suffix]);
    (request_path, entity_path)
}

/// Literal substitution of a placeholder
pub fn substitute_tenant(url: &str, placeholder: &str, tenant_name: &str) -> String {
    if !url.contains(placeholder) {
        return url.to_string();
    }
    url.replace(placeholder, tenant_name)
}

/// Substitute the `{webservice}` placeholder before dispatch
pub fn resolve_webservice(path: &str) -> String {
    path.replace(WEBSERVICE_PLACEHOLDER, WEBSERVICE)
}

/// Part of a bound entity path that precedes the web service segment
///
/// For `braincube/demo/{webservice}/mb/1` this is `braincube/demo/`.
pub fn cube_prefix(path: &str) -> &str {
    match path.split_once(WEBSERVICE_PLACEHOLDER) {
        Some((prefix, _)) => prefix,
        None => path,
    }
}

/// Append a path to a base URL and substitute the tenant placeholder
pub fn build_url(base_url: &str, path: &str, tenant_name: &str) -> String {
    let base = base_url.trim_end_matches(SEPARATOR);
    let path = strip_path(path);
    let url = match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, path),
    };
    substitute_tenant(&url, TENANT_PLACEHOLDER, tenant_name)
}

/// Append the pagination query to a collection request path
pub fn with_page_query(path: &str, offset: usize, size: usize) -> String {
    format!("{}?offset={}&size={}", path, offset, size)
}
