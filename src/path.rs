//! Mount-path normalization.

/// Normalize a route or mount path: collapse duplicate separators, force a
/// leading slash and strip any trailing one (the root path stays `/`).
pub fn clean_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut cleaned = String::with_capacity(path.len() + 1);
    cleaned.push('/');
    cleaned.push_str(&segments.join("/"));
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_duplicate_slashes() {
        assert_eq!(clean_path("//api///items"), "/api/items");
    }

    #[test]
    fn forces_leading_slash() {
        assert_eq!(clean_path("users"), "/users");
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(clean_path("/users/"), "/users");
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
    }

    #[test]
    fn prefix_concatenation() {
        // rootPath "/api" + controller "/items", then method "/:id"
        assert_eq!(clean_path(&format!("{}{}", "/api", "/items")), "/api/items");
        assert_eq!(
            clean_path(&format!("{}{}", "/api/items", "/:id")),
            "/api/items/:id"
        );
    }
}
