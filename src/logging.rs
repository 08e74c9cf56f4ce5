//! Structured logging setup.
//!
//! Every log line carries structured fields (lead ids, agent ids, job names)
//! rather than formatted prose, so log aggregation can slice by entity.

/// Build a tracing filter string from the logging configuration.
///
/// The base level applies to everything; component overrides target
/// `rotor::<component>` modules.
///
/// # Examples
///
/// ```
/// use rotor::config::logging::LoggingConfig;
/// use rotor::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("jobs".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: rotor::config::logging::LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,rotor::jobs=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",rotor::{}={}", component, level));
        }
    }

    filter_str
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, LoggingConfig};
    use std::collections::HashMap;

    #[test]
    fn base_level_alone() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn component_overrides_are_appended_sorted() {
        let mut component_levels = HashMap::new();
        component_levels.insert("scheduler".to_string(), "trace".to_string());
        component_levels.insert("assignment".to_string(), "debug".to_string());

        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            component_levels: Some(component_levels),
        };

        assert_eq!(
            build_filter_directives(&config),
            "warn,rotor::assignment=debug,rotor::scheduler=trace"
        );
    }
}
