//! Pools command implementation

use crate::cli::output::{format_pools_json, format_pools_table, PoolMemberView, PoolView};
use crate::cli::PoolsListArgs;
use crate::config::RotorConfig;

/// Handle `rotor pools list`.
///
/// Reads the seeded pools from configuration; ring order and the initial
/// flag placement come out exactly as `serve` would build them.
pub fn handle_pools_list(
    args: &PoolsListArgs,
    config: &RotorConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut views: Vec<PoolView> = config
        .sources
        .iter()
        .filter(|s| args.source.as_ref().is_none_or(|wanted| &s.id == wanted))
        .map(|source| {
            let mut agent_ids = source.agents.clone();
            agent_ids.sort_unstable();
            let members = agent_ids
                .into_iter()
                .enumerate()
                .map(|(i, agent_id)| {
                    let eligible = config
                        .agents
                        .iter()
                        .find(|a| a.id == agent_id)
                        .map(|a| a.active && a.available && !a.excluded)
                        .unwrap_or(false);
                    PoolMemberView {
                        agent_id,
                        next_in_rotation: i == 0,
                        eligible,
                    }
                })
                .collect();
            PoolView {
                source_id: source.id.clone(),
                members,
            }
        })
        .collect();
    views.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    if let Some(wanted) = &args.source {
        if views.is_empty() {
            return Err(format!("No pool configured for source '{}'", wanted).into());
        }
    }

    if args.json {
        Ok(format_pools_json(&views))
    } else {
        Ok(format_pools_table(&views))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentSeed, SourceSeed};
    use std::path::PathBuf;

    fn config_with_pool() -> RotorConfig {
        RotorConfig {
            agents: vec![
                AgentSeed {
                    id: "agent-b".to_string(),
                    name: "Bea".to_string(),
                    active: true,
                    available: true,
                    excluded: false,
                },
                AgentSeed {
                    id: "agent-a".to_string(),
                    name: "Aicha".to_string(),
                    active: true,
                    available: false,
                    excluded: false,
                },
            ],
            sources: vec![SourceSeed {
                id: "portal".to_string(),
                agents: vec!["agent-b".to_string(), "agent-a".to_string()],
            }],
            ..RotorConfig::default()
        }
    }

    fn list_args(json: bool, source: Option<&str>) -> PoolsListArgs {
        PoolsListArgs {
            json,
            source: source.map(String::from),
            config: PathBuf::from("rotor.toml"),
        }
    }

    #[test]
    fn lists_members_in_ring_order_with_flag_on_first() {
        let output = handle_pools_list(&list_args(true, None), &config_with_pool()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let members = &parsed["pools"][0]["members"];
        // Ring order is agent id ascending regardless of config order.
        assert_eq!(members[0]["agent_id"], "agent-a");
        assert_eq!(members[0]["next_in_rotation"], true);
        assert_eq!(members[0]["eligible"], false);
        assert_eq!(members[1]["agent_id"], "agent-b");
        assert_eq!(members[1]["next_in_rotation"], false);
    }

    #[test]
    fn unknown_source_filter_is_an_error() {
        let result = handle_pools_list(&list_args(false, Some("ghost")), &config_with_pool());
        assert!(result.is_err());
    }

    #[test]
    fn table_output_contains_source() {
        let output = handle_pools_list(&list_args(false, None), &config_with_pool()).unwrap();
        assert!(output.contains("portal"));
    }
}
