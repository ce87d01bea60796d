//! Prompt construction for the generation service.
//!
//! One system instruction shared by every operation, plus per-operation user
//! prompts embedding the YAML-flavored environment description, the chosen
//! attack vector, optional directives, and (for continuations) the serialized
//! step history and the defender's last action.

use adversary_core::types::ScenarioInput;

use crate::ContinuationRequest;

pub const SYSTEM_PROMPT: &str = r#"You are an expert cybersecurity red team operator and AI simulation engine named "ADversary". Your task is to generate a realistic, step-by-step Active Directory attack simulation based on user-defined parameters.
**Instructions:**
1.  **Analyze the Environment:** Carefully parse the provided YAML configuration to understand the network topology, hosts, and services. This is your source of truth.
2.  **Design Attack Path:** Create a logical and credible attack chain based on the primary attack vector.
3.  **Incorporate Directives:** Adhere to any special instructions.
4.  **Generate Narrative:** Create a compelling scenario with a clear attacker objective. The simulation must be educational, demonstrating real-world tactics.
5.  **Be Realistic:** All commands, tool outputs, and system alerts must be technically accurate. For MITRE techniques, provide the ID, name, and a 3-5 bullet point description.
6.  **Populate All Fields:** You MUST fully populate every field in the required JSON shape. The 'compromised_host_ids' array must be cumulative with each step.
7.  **Generate Realistic PowerShell Logs:** For each step involving PowerShell commands, generate a corresponding Event ID 4104 (Script Block Logging) entry whose 'script_block_text' contains the full, unobfuscated command.
Reply with a single valid JSON object and nothing else."#;

/// User prompt for one-shot full-scenario generation.
pub fn scenario_prompt(input: &ScenarioInput) -> String {
    format!(
        r#"**Primary Attack Vector:** "{attack}"
**Attack Directives:** "{directives}"

**User-Defined Environment (YAML):**
```yaml
{environment}
```
Now, generate the complete simulation scenario as a JSON object with the keys: title, description (markdown executive summary), network_topology (nodes with id/label/type/os, edges with from/to), steps (array of attack steps with step, title, description, target_host_id, commands, mitre_tactics, mitre_techniques, system_alerts, defense_recommendations, compromised_host_ids, security_posture, powershell_logs)."#,
        attack = input.attack_type,
        directives = directives_or_none(input),
        environment = input.environment,
    )
}

/// User prompt for the opening move of a turn-based simulation.
pub fn opening_prompt(input: &ScenarioInput) -> String {
    format!(
        r#"**Primary Attack Vector:** "{attack}"
**Attack Directives:** "{directives}"

**User-Defined Environment (YAML):**
```yaml
{environment}
```
This is a turn-based simulation: after each of your moves the defender picks a response, and you will be asked for the next step separately. Generate only the opening as a JSON object with the keys: title, description (markdown mission briefing), network_topology (nodes with id/label/type/os, edges with from/to), first_step (one attack step with step=1, title, description, target_host_id, commands, mitre_tactics, mitre_techniques, system_alerts, defense_recommendations, compromised_host_ids, security_posture, powershell_logs, and defensive_choices: 2-4 short defensive responses for the defender to pick from)."#,
        attack = input.attack_type,
        directives = directives_or_none(input),
        environment = input.environment,
    )
}

/// User prompt for generating the next step of a turn-based simulation.
pub fn continuation_prompt(request: &ContinuationRequest) -> String {
    // Plain struct serialization cannot fail.
    let history = serde_json::to_string_pretty(&request.history)
        .expect("step history serialization should not fail");
    let topology = serde_json::to_string_pretty(&request.topology)
        .expect("topology serialization should not fail");

    format!(
        r#"**Primary Attack Vector:** "{attack}"

**User-Defined Environment (YAML):**
```yaml
{environment}
```

**Network Topology (fixed, do not invent new hosts):**
{topology}

**Attack History So Far (JSON):**
{history}

**Defender's Chosen Response to the Last Step:** "{action}"

React to the defender's response and generate exactly the next attack step as a single JSON object (step number {next_step}) with the keys: step, title, description, target_host_id, commands, mitre_tactics, mitre_techniques, system_alerts, defense_recommendations, compromised_host_ids, security_posture, powershell_logs, defensive_choices. The compromised_host_ids array is cumulative: it must contain every host compromised in earlier steps."#,
        attack = request.input.attack_type,
        environment = request.input.environment,
        topology = topology,
        history = history,
        action = request.last_action,
        next_step = request.history.len() + 1,
    )
}

fn directives_or_none(input: &ScenarioInput) -> &str {
    if input.attack_directives.trim().is_empty() {
        "None"
    } else {
        &input.attack_directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adversary_core::types::NetworkTopology;

    #[test]
    fn scenario_prompt_embeds_inputs() {
        let input = ScenarioInput::new("domain: corp.local", "Kerberoasting", "");
        let prompt = scenario_prompt(&input);
        assert!(prompt.contains("Kerberoasting"));
        assert!(prompt.contains("domain: corp.local"));
        assert!(prompt.contains("\"None\""));
    }

    #[test]
    fn continuation_prompt_numbers_next_step() {
        let request = ContinuationRequest {
            input: ScenarioInput::new("domain: corp.local", "Pass-the-Hash", ""),
            topology: NetworkTopology {
                nodes: vec![],
                edges: vec![],
            },
            history: vec![],
            last_action: "Isolate WS01".to_string(),
        };

        let prompt = continuation_prompt(&request);
        assert!(prompt.contains("step number 1"));
        assert!(prompt.contains("Isolate WS01"));
    }
}
