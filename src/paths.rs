//! Path helpers for PATH-kind metadata and gamelist entry paths.
//!
//! Serialized paths are stored relative to a base directory (`./boxart/a.png`)
//! or the home directory (`~/roms/a.zip`) when possible and expanded back to
//! absolute form on load. All work is lexical; a path that cannot be expanded
//! or shortened is returned as the literal input.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Expand `path` to an absolute, normalized path.
///
/// - `""` stays empty (absent media)
/// - `~/x` expands under the home directory when `allow_home` is set
/// - absolute paths are normalized
/// - any other relative path (`./x`, `x`, `../x`) is joined onto `relative_to`
pub fn resolve_relative_path(path: &str, relative_to: &Utf8Path, allow_home: bool) -> String {
    if path.is_empty() {
        return String::new();
    }

    if allow_home {
        if let Some(rest) = path.strip_prefix("~/") {
            return match home_dir() {
                Some(home) => normalize(&home.join(rest)).into_string(),
                None => {
                    tracing::debug!("No home directory available to expand {}", path);
                    path.to_string()
                }
            };
        }
    }

    let candidate = Utf8Path::new(path);
    if candidate.is_absolute() {
        return normalize(candidate).into_string();
    }

    if relative_to.as_str().is_empty() {
        return path.to_string();
    }

    normalize(&relative_to.join(candidate)).into_string()
}

/// Shorten an absolute `path` to `./rel` under `relative_to`, or `~/rel` under
/// the home directory when `allow_home` is set. Anything else comes back as-is.
pub fn create_relative_path(path: &str, relative_to: &Utf8Path, allow_home: bool) -> String {
    if path.is_empty() {
        return String::new();
    }

    let candidate = Utf8Path::new(path);
    if !candidate.is_absolute() {
        return path.to_string();
    }
    let candidate = normalize(candidate);

    if !relative_to.as_str().is_empty() {
        if let Some(rel) = strip_base(&candidate, &normalize(relative_to)) {
            return format!("./{}", rel);
        }
    }

    if allow_home {
        if let Some(home) = home_dir() {
            if let Some(rel) = strip_base(&candidate, &normalize(&home)) {
                return format!("~/{}", rel);
            }
        }
    }

    path.to_string()
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let ends_in_name = matches!(
                    out.components().next_back(),
                    Some(Utf8Component::Normal(_))
                );
                if ends_in_name {
                    out.pop();
                } else if !out.has_root() {
                    // Leading `..` of a relative path has nothing to cancel
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Portion of `path` below `base`, joined with `/`
fn strip_base(path: &Utf8Path, base: &Utf8Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<&str> = rel.components().map(|c| c.as_str()).collect();
    Some(parts.join("/"))
}

fn home_dir() -> Option<Utf8PathBuf> {
    dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(
            normalize(Utf8Path::new("/roms/snes/./media/../a.zip")),
            Utf8PathBuf::from("/roms/snes/a.zip")
        );
        assert_eq!(normalize(Utf8Path::new("/../a")), Utf8PathBuf::from("/a"));
        assert_eq!(normalize(Utf8Path::new("../a")), Utf8PathBuf::from("../a"));
    }

    #[test]
    fn test_resolve_relative_variants() {
        let base = Utf8Path::new("/roms/snes");
        assert_eq!(
            resolve_relative_path("./media/a.png", base, false),
            "/roms/snes/media/a.png"
        );
        assert_eq!(
            resolve_relative_path("media/a.png", base, false),
            "/roms/snes/media/a.png"
        );
        assert_eq!(
            resolve_relative_path("../shared/a.png", base, false),
            "/roms/shared/a.png"
        );
        assert_eq!(
            resolve_relative_path("/abs/a.png", base, false),
            "/abs/a.png"
        );
        assert_eq!(resolve_relative_path("", base, true), "");
    }

    #[test]
    fn test_resolve_without_base_is_literal() {
        assert_eq!(
            resolve_relative_path("./a.png", Utf8Path::new(""), false),
            "./a.png"
        );
    }

    #[test]
    fn test_tilde_is_literal_without_allow_home() {
        let base = Utf8Path::new("/roms");
        assert_eq!(resolve_relative_path("~/a.zip", base, false), "/roms/~/a.zip");
    }

    #[test]
    fn test_create_relative_inside_and_outside_base() {
        let base = Utf8Path::new("/roms/snes");
        assert_eq!(
            create_relative_path("/roms/snes/media/a.png", base, false),
            "./media/a.png"
        );
        assert_eq!(
            create_relative_path("/elsewhere/a.png", base, false),
            "/elsewhere/a.png"
        );
        assert_eq!(create_relative_path("./already.png", base, false), "./already.png");
        assert_eq!(create_relative_path("", base, false), "");
    }

    #[test]
    fn test_relative_then_absolute_is_lossless() {
        let base = Utf8Path::new("/roms/snes");
        let original = "/roms/snes/boxart/Super Game (USA).png";
        let stored = create_relative_path(original, base, true);
        assert_eq!(resolve_relative_path(&stored, base, true), original);
    }

    #[test]
    fn test_home_round_trip() {
        if let Some(home) = home_dir() {
            let original = normalize(&home.join("gamedeck-test/a.zip")).into_string();
            let stored = create_relative_path(&original, Utf8Path::new("/nonexistent-base"), true);
            assert!(stored.starts_with("~/"));
            assert_eq!(
                resolve_relative_path(&stored, Utf8Path::new("/nonexistent-base"), true),
                original
            );
        }
    }
}
