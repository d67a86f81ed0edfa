//! Agent identity keys.
//!
//! A snapshot agent has no server name until it is created, so agents are
//! matched across snapshots by a derived key instead: the lowercased
//! Dialogflow link, else the lowercased display name, else the lowercased
//! server name.

use crate::types::Agent;
use std::collections::BTreeMap;

/// Derive the comparison key of an agent.
///
/// Agents with no link, display name or server name all share the empty key.
pub fn agent_key(agent: &Agent) -> String {
    let link = agent.dialogflow_agent();
    if !link.is_empty() {
        return link.to_lowercase();
    }
    if !agent.display_name.is_empty() {
        return agent.display_name.to_lowercase();
    }
    agent.name.to_lowercase()
}

/// Index agents by key, ordered by key.
///
/// When two agents share a key the later one wins; this is logged, not
/// rejected.
pub fn index_agents(agents: &[Agent]) -> BTreeMap<String, &Agent> {
    let mut index = BTreeMap::new();
    for agent in agents {
        let key = agent_key(agent);
        if let Some(previous) = index.insert(key.clone(), agent) {
            log::warn!(
                "agents {:?} and {:?} share identity key {:?}; keeping the latter",
                previous.display_name,
                agent.display_name,
                key
            );
        }
    }
    index
}
