//! Tool adapters, routing, and the per-request tool set

pub mod adapter;
pub mod definition;
pub mod fallback;
pub mod intent;
pub mod weather;

pub use definition::{AdaptedTool, ArgCheck, ArgMap, ToolBackend, ToolSet};
pub use fallback::RpcEndpoint;
pub use intent::Intent;

/// Extra alias table applied after underscore expansion
pub const EXTRA_ALIASES: &[(&str, &str)] = &[("post", "cms--create-post")];

/// The always-exposed builtin tools
pub fn builtin_tools() -> ToolSet {
    let mut set = ToolSet::new();
    set.insert(AdaptedTool::new(
        weather::WEATHER_TOOL_NAME,
        weather::description(),
        weather::input_schema(),
        ToolBackend::Weather,
    ));
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tools_contains_weather() {
        let set = builtin_tools();
        assert_eq!(set.len(), 1);
        assert!(set.contains("weather"));
    }

    #[test]
    fn test_extra_alias_table_targets_create_post() {
        assert_eq!(EXTRA_ALIASES, &[("post", "cms--create-post")]);
    }
}
