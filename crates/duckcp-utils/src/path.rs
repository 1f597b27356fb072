use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// Expands `$VAR` and `${VAR}`, replaces a leading `~` with the home directory, and turns
    /// relative paths into absolute ones based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
    /// * [`PathError::UnclosedVariable`] if a `${` is never closed
    ///
    /// # Example
    ///
    /// ```
    /// use duckcp_utils::error::PathResult;
    /// use duckcp_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolved = SystemPathResolver.resolve_path("$HOME/scripts/daily.sql")?;
    ///     assert!(resolved.is_absolute());
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory
    ///
    /// Reads `HOME`, falling back to `/home/$USER`.
    fn home_dir(&self) -> PathBuf;

    /// Returns `$XDG_CONFIG_HOME`, or `$HOME/.config` when unset.
    fn xdg_config_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] backed by the process environment.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
            let user = env::var("USER").unwrap_or_else(|_| "root".into());
            PathBuf::from(format!("/home/{user}"))
        })
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let mut var_name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        var_name.push(c);
                    }
                    if !closed {
                        return Err(PathError::UnclosedVariable {
                            input: format!("${{{var_name}"),
                        });
                    }
                    self.expand_env_var(&var_name, &mut result, path)?;
                }
                '$' => {
                    let mut var_name = String::new();
                    while let Some(&c) = chars.peek() {
                        if !(c.is_alphanumeric() || c == '_') {
                            break;
                        }
                        var_name.push(c);
                        chars.next();
                    }
                    if var_name.is_empty() {
                        result.push('$');
                    } else {
                        self.expand_env_var(&var_name, &mut result, path)?;
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn expand_env_var(
        &self,
        var_name: &str,
        result: &mut String,
        original: &str,
    ) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string with [`SystemPathResolver`].
///
/// See [`PathResolver::resolve_path`].
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// See [`PathResolver::home_dir`].
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// See [`PathResolver::xdg_config_home`].
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_expand_variables_simple_and_braced() {
        env::set_var("DUCKCP_TEST_VAR", "scripts");
        let resolver = SystemPathResolver;
        assert_eq!(
            resolver.expand_variables("$DUCKCP_TEST_VAR/a.sql").unwrap(),
            "scripts/a.sql"
        );
        assert_eq!(
            resolver.expand_variables("${DUCKCP_TEST_VAR}/a.sql").unwrap(),
            "scripts/a.sql"
        );
        env::remove_var("DUCKCP_TEST_VAR");
    }

    #[test]
    #[serial]
    fn test_expand_variables_errors() {
        let resolver = SystemPathResolver;
        assert!(matches!(
            resolver.expand_variables("${DUCKCP_TEST_VAR"),
            Err(PathError::UnclosedVariable { .. })
        ));
        assert!(matches!(
            resolver.expand_variables("$THIS_VAR_DOESNT_EXIST"),
            Err(PathError::MissingEnvVar { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_lone_dollar_is_kept() {
        let resolver = SystemPathResolver;
        assert_eq!(resolver.expand_variables("price$/x").unwrap(), "price$/x");
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        env::set_var("HOME", "/tmp/home");
        env::remove_var("XDG_CONFIG_HOME");
        let resolver = SystemPathResolver;
        assert_eq!(resolver.xdg_config_home(), PathBuf::from("/tmp/home/.config"));

        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(resolver.xdg_config_home(), PathBuf::from("/tmp/config"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_resolve_path() {
        env::set_var("HOME", "/tmp/home");
        let resolver = SystemPathResolver;

        assert!(matches!(resolver.resolve_path("  "), Err(PathError::Empty)));
        assert_eq!(
            resolver.resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolver.resolve_path("~/a.db").unwrap(),
            PathBuf::from("/tmp/home/a.db")
        );

        let relative = resolver.resolve_path("b.db").unwrap();
        assert_eq!(relative, env::current_dir().unwrap().join("b.db"));
    }
}
