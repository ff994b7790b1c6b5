use std::path::{Component, Path};

/// Render a path relative to a reconciled directory the way manifests store it
///
/// Components are joined with `/` regardless of platform. Returns `None` if
/// any component is not valid UTF-8, since such a name cannot be written to a
/// manifest without changing it.
#[must_use]
pub fn to_manifest_path(relative: &Path) -> Option<String> {
    let mut out = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(name.to_str()?);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    Some(out)
}

/// Strip `./` prefixes that `find`-generated manifests carry
#[must_use]
pub fn normalize_recorded(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_to_manifest_path() {
        assert_eq!(
            to_manifest_path(Path::new("a/b/c.txt")).as_deref(),
            Some("a/b/c.txt")
        );
        assert_eq!(
            to_manifest_path(Path::new("./a/./b")).as_deref(),
            Some("a/b")
        );
        assert_eq!(to_manifest_path(Path::new("")).as_deref(), Some(""));

        let mut nested = PathBuf::from("dir");
        nested.push("file name.jpg");
        assert_eq!(
            to_manifest_path(&nested).as_deref(),
            Some("dir/file name.jpg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_has_no_manifest_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut path = PathBuf::from("dir");
        path.push(OsStr::from_bytes(b"a\xff"));
        assert_eq!(to_manifest_path(&path), None);
    }

    #[test]
    fn test_normalize_recorded() {
        assert_eq!(normalize_recorded("./foo.txt"), "foo.txt");
        assert_eq!(normalize_recorded("././a/b"), "a/b");
        assert_eq!(normalize_recorded("foo.txt"), "foo.txt");
        assert_eq!(normalize_recorded(".hidden"), ".hidden");
    }
}
