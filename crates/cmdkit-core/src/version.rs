use semver::Version;

/// Parses `MAJOR.MINOR.PATCH[-PRERELEASE]`. Build metadata is rejected.
pub fn parse_version(raw: &str) -> Option<Version> {
    let version = Version::parse(raw.trim()).ok()?;
    version.build.is_empty().then_some(version)
}

pub fn is_valid_version(raw: &str) -> bool {
    parse_version(raw).is_some()
}

/// Returns true when `bundle` should replace what is installed.
///
/// A missing or empty installed version is a first install and always older.
/// An installed version that does not parse is treated as older as well. A
/// bundle version that does not parse never wins.
pub fn is_newer_version(installed: Option<&str>, bundle: &str) -> bool {
    let Some(bundle) = parse_version(bundle) else {
        return false;
    };

    match installed.map(str::trim).filter(|value| !value.is_empty()) {
        None => true,
        Some(raw) => match parse_version(raw) {
            Some(installed) => installed < bundle,
            None => true,
        },
    }
}
