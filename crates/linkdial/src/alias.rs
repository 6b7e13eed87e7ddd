//! Connect alias resolution.

use std::collections::HashMap;

use linkdial_core::error::{Error, Result};

/// Maximum number of alias hops followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 8;

/// Follow `name` through the alias table until it names no alias.
///
/// A string that is not an alias resolves to itself. Chains longer than
/// [`MAX_ALIAS_DEPTH`] (including cycles) are a parse error.
///
/// ```
/// use std::collections::HashMap;
/// use linkdial::resolve_alias;
///
/// let aliases = HashMap::from([
///     ("home".to_string(), "hf".to_string()),
///     ("hf".to_string(), "varahf://LA1B?freq=3585".to_string()),
/// ]);
/// assert_eq!(resolve_alias(&aliases, "home").unwrap(), "varahf://LA1B?freq=3585");
/// assert_eq!(resolve_alias(&aliases, "telnet://LA1B").unwrap(), "telnet://LA1B");
/// ```
pub fn resolve_alias<'a>(aliases: &'a HashMap<String, String>, name: &'a str) -> Result<&'a str> {
    let mut current = name;
    for _ in 0..=MAX_ALIAS_DEPTH {
        match aliases.get(current) {
            Some(next) => current = next.as_str(),
            None => return Ok(current),
        }
    }
    Err(Error::Parse(format!(
        "alias '{name}' does not resolve within {MAX_ALIAS_DEPTH} steps"
    )))
}
