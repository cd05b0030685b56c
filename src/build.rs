const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_SHORT_HASH: &str = env!("GIT_SHORT_HASH");
const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

#[cfg(debug_assertions)]
const IS_RELEASE: bool = false;

#[cfg(not(debug_assertions))]
const IS_RELEASE: bool = true;

/// Build information shown in diagnostics screens
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BuildInfo {
    pub version: String,
    pub git_short_hash: String,
    pub profile: String,
    pub is_release: bool,
}

pub fn version() -> String {
    VERSION.to_string()
}

pub fn git_short_hash() -> String {
    GIT_SHORT_HASH.to_string()
}

pub fn is_release() -> bool {
    IS_RELEASE
}

pub fn profile() -> String {
    BUILD_PROFILE.to_string()
}

#[uniffi::export]
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: version(),
        git_short_hash: git_short_hash(),
        profile: profile(),
        is_release: is_release(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_matches_package() {
        let info = build_info();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.is_release, !cfg!(debug_assertions));
        assert!(!info.git_short_hash.is_empty());
    }
}
