//! Splitting service declarations and composing per-service arguments.

use keel_config::{Properties, RUNTIME_PREFIX};

const DECLARATION_SEPARATORS: [char; 3] = [' ', '\t', '\n'];

/// Splits a declaration into its entry point and declared arguments.
pub(crate) fn split_declaration(value: &str) -> (&str, Vec<String>) {
    let mut tokens = value
        .split(DECLARATION_SEPARATORS)
        .filter(|token| !token.is_empty());
    let entry_point = tokens.next().unwrap_or_default();
    (entry_point, tokens.map(str::to_owned).collect())
}

/// Concatenates the argument sources for `service`, lowest precedence first:
/// host options scoped to the service, declared arguments, and residual host
/// arguments scoped to the service.
pub(crate) fn compose_arguments(
    service: &str,
    host_options: &[String],
    declared: &[String],
    residual: &[String],
) -> Vec<String> {
    let scope = format!("--{service}.");
    let scoped = |arg: &&String| arg.starts_with(&scope);
    host_options
        .iter()
        .filter(scoped)
        .chain(declared)
        .chain(residual.iter().filter(scoped))
        .cloned()
        .collect()
}

/// Builds the property set handed to `init` and the arguments left over.
///
/// Runtime options (`--Keel.*`) and options scoped to `service` become
/// properties, later tokens overriding earlier ones. Everything else remains
/// an argument.
pub(crate) fn service_properties(service: &str, composed: Vec<String>) -> (Properties, Vec<String>) {
    let mut properties = Properties::new();
    let runtime_residual = properties.parse_command_line_options(RUNTIME_PREFIX, composed);
    let args = properties.parse_command_line_options(service, runtime_residual);
    (properties, args)
}
