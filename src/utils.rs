use std::env::var;

/// Read an environment variable, falling back when it is unset or empty
///
/// An empty value counts as unset, so `PORT=` behaves like no `PORT` at all
pub fn env_var_or_else(var_name: &'static str, or_else: fn() -> String) -> String {
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}
