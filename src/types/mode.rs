/// How configuration errors in condition trees are surfaced.
///
/// Development fails loud so rule authors see mistakes immediately;
/// production logs the problem and treats the condition as false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    Development,
    Production,
}

impl Default for ErrorMode {
    /// `Development` in debug builds, `Production` in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ErrorMode::Development
        } else {
            ErrorMode::Production
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_follows_build_profile() {
        let expected = if cfg!(debug_assertions) {
            ErrorMode::Development
        } else {
            ErrorMode::Production
        };
        assert_eq!(ErrorMode::default(), expected);
    }
}
