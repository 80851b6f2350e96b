//! Secret reference resolver.
//!
//! Credential values in `config.toml` can point at secrets stored outside
//! the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - anything else is returned as-is

use crate::error::{ClientError, ClientResult};

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> ClientResult<String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value, keeping `None` as is.
pub fn resolve_opt(value: Option<&str>) -> ClientResult<Option<String>> {
    value.map(resolve).transpose()
}

fn resolve_pass(path: &str) -> ClientResult<String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| ClientError::Secret(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClientError::Secret(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Secret(format!("`pass show {}` produced no output", path)))
}

fn resolve_env(var: &str) -> ClientResult<String> {
    std::env::var(var)
        .map_err(|_| ClientError::Secret(format!("environment variable `{}` is not set", var)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hello").unwrap(), "hello");
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(resolve("abc::def").unwrap(), "abc::def");
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_COMMONSLOT_TEST_SECRET", "s3cret");
        }
        assert_eq!(resolve("env::_COMMONSLOT_TEST_SECRET").unwrap(), "s3cret");
        unsafe {
            std::env::remove_var("_COMMONSLOT_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_COMMONSLOT_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(matches!(err, ClientError::Secret(_)));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }

    #[test]
    fn optional_values() {
        assert_eq!(resolve_opt(None).unwrap(), None);
        assert_eq!(resolve_opt(Some("x")).unwrap(), Some("x".to_string()));
    }
}
