//! Turn planning: which handlers run this turn, and in what order.

use crate::context::game_digest;
use crate::service::NarrativeService;
use chrono::{DateTime, Utc};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use saga_core::{
    AgentId, Dependency, ExecutionPlan, GameState, GenerationRequest, PlannedAgent, SceneType,
    UsageMetrics, output_format,
};
use saga_error::{GenerationError, GenerationErrorKind, PlanError, PlanErrorKind, SagaResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const ORCHESTRATOR_CONTEXT: &str = "You are the Orchestrator of a multi-agent RPG system. \
Analyze the game state and decide which agents run this turn.\n\n\
Available agents:\n\
- WORLD_BUILDER: environment descriptions and world state\n\
- NPC_PERSONALITY: NPC behavior and attitudes\n\
- DIALOGUE: NPC dialogue\n\
- QUEST_MANAGER: quest offers and progress\n\
- COMBAT: combat resolution\n\
- BETRAYAL: betrayal opportunities\n\
- CONSEQUENCE: outcome of the player's choice (depends on PLAYER_CHOICE)\n\
- INVENTORY: item space and interactions\n\
- PROFILE_TRACKER: personality tracking (depends on PLAYER_CHOICE)\n\
- CONTINUITY: story consistency\n\
- SCENE_COMPOSER: final scene and player choices\n\n\
Consider what is happening in the scene, which NPCs are present, whether \
combat is likely, and whether quests are affected.";

/// One agent entry as the generation service describes it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAgentDocument {
    /// Agent name, e.g. WORLD_BUILDER
    pub agent: String,
    /// Lower runs earlier
    #[serde(default)]
    pub priority: u32,
    /// Why the agent is needed
    #[serde(default)]
    pub reason: String,
    /// Agent names or PLAYER_CHOICE
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A plan as the generation service returns it, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    /// Agents selected for the turn
    pub agents_to_call: Vec<PlannedAgentDocument>,
    /// Order to run them in; derived from priorities when empty
    #[serde(default)]
    pub execution_order: Vec<String>,
    /// combat, dialogue, exploration, quest or betrayal
    #[serde(default)]
    pub scene_type: String,
    /// Urgent situations
    #[serde(default)]
    pub urgent_flags: Vec<String>,
}

impl PlanDocument {
    /// Validate names and dependencies and build an executable plan.
    ///
    /// # Errors
    ///
    /// Fails on an unknown agent, an empty plan, or a dependency cycle.
    pub fn into_plan(self) -> Result<ExecutionPlan, PlanError> {
        if self.agents_to_call.is_empty() && self.execution_order.is_empty() {
            return Err(PlanError::new(PlanErrorKind::EmptyPlan));
        }

        let agents_to_call = self
            .agents_to_call
            .into_iter()
            .map(|doc| {
                let mut planned =
                    PlannedAgent::new(AgentId::parse(&doc.agent)?, doc.priority, doc.reason);
                for dependency in doc.dependencies {
                    planned = planned.depends_on(Dependency::try_from(dependency)?);
                }
                Ok(planned)
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        check_cycles(&agents_to_call)?;

        let execution_order = if self.execution_order.is_empty() {
            optimize_sequence(&agents_to_call)
                .into_iter()
                .map(|p| p.agent)
                .collect()
        } else {
            validate_agents(&self.execution_order)?
        };

        Ok(ExecutionPlan {
            agents_to_call,
            execution_order,
            scene_type: scene_type_from_str(&self.scene_type),
            urgent_flags: self.urgent_flags,
        })
    }
}

/// Unrecognized scene names map to [`SceneType::Unknown`].
fn scene_type_from_str(name: &str) -> SceneType {
    serde_json::from_value(serde_json::Value::String(name.trim().to_lowercase()))
        .unwrap_or(SceneType::Unknown)
}

/// Parse every name against the known agent set.
///
/// # Errors
///
/// Returns an unknown-agent error naming the first unrecognized entry.
pub fn validate_agents<S: AsRef<str>>(names: &[S]) -> Result<Vec<AgentId>, PlanError> {
    names.iter().map(|n| AgentId::parse(n.as_ref())).collect()
}

/// Sort by ascending priority; equal priorities put the entry with more
/// dependencies first. Otherwise the input order is kept.
pub fn optimize_sequence(agents: &[PlannedAgent]) -> Vec<PlannedAgent> {
    let mut sorted = agents.to_vec();
    sorted.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.dependencies.len().cmp(&a.dependencies.len()))
    });
    sorted
}

/// Reject plans whose agent dependencies form a cycle.
///
/// # Errors
///
/// Returns a dependency-cycle error listing the agents involved.
pub fn check_cycles(agents: &[PlannedAgent]) -> Result<(), PlanError> {
    let mut graph = DiGraph::<AgentId, ()>::new();
    let mut nodes: HashMap<AgentId, NodeIndex> = HashMap::new();
    let mut node = |graph: &mut DiGraph<AgentId, ()>, agent: AgentId| {
        *nodes.entry(agent).or_insert_with(|| graph.add_node(agent))
    };

    for planned in agents {
        let from = node(&mut graph, planned.agent);
        for dependency in &planned.dependencies {
            if let Dependency::Agent(upstream) = dependency {
                let to = node(&mut graph, *upstream);
                graph.add_edge(from, to, ());
            }
        }
    }

    for component in kosaraju_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.neighbors(n).any(|m| m == n));
        if cyclic {
            let names = component.iter().map(|&n| graph[n].to_string()).collect();
            return Err(PlanError::new(PlanErrorKind::DependencyCycle(names)));
        }
    }
    Ok(())
}

/// The local plan used whenever the service cannot provide one.
///
/// WORLD_BUILDER then SCENE_COMPOSER, with NPC_PERSONALITY and DIALOGUE
/// inserted after WORLD_BUILDER when NPCs are present, QUEST_MANAGER inserted
/// after WORLD_BUILDER when quests are in play, and CONSEQUENCE last.
pub fn default_plan(state: &GameState) -> ExecutionPlan {
    let mut agents_to_call = vec![
        PlannedAgent::new(AgentId::WorldBuilder, 1, "Generate scene context"),
        PlannedAgent::new(AgentId::SceneComposer, 2, "Create cohesive scene")
            .depends_on(AgentId::WorldBuilder),
    ];
    let mut execution_order = vec![AgentId::WorldBuilder, AgentId::SceneComposer];

    if !state.current_scene.npcs_present.is_empty() {
        agents_to_call.push(
            PlannedAgent::new(AgentId::NpcPersonality, 2, "Manage NPC interactions")
                .depends_on(AgentId::WorldBuilder),
        );
        agents_to_call.push(
            PlannedAgent::new(AgentId::Dialogue, 3, "Generate NPC dialogue")
                .depends_on(AgentId::NpcPersonality),
        );
        execution_order.insert(1, AgentId::Dialogue);
        execution_order.insert(1, AgentId::NpcPersonality);
    }

    if state.quests.active_side().next().is_some() || state.quests.main.is_some() {
        agents_to_call.push(PlannedAgent::new(
            AgentId::QuestManager,
            2,
            "Update quest progress",
        ));
        execution_order.insert(1, AgentId::QuestManager);
    }

    agents_to_call.push(
        PlannedAgent::new(AgentId::Consequence, 10, "Determine outcome of player choice")
            .depends_on(Dependency::PlayerChoice),
    );
    execution_order.push(AgentId::Consequence);

    ExecutionPlan {
        agents_to_call,
        execution_order,
        scene_type: SceneType::Exploration,
        urgent_flags: Vec::new(),
    }
}

/// One recorded planning decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    /// Turn the plan was made for
    pub turn: u32,
    /// The plan
    pub plan: ExecutionPlan,
    /// When it was made
    pub timestamp: DateTime<Utc>,
}

/// Aggregate planning statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorStats {
    /// Plans recorded
    pub total_turns_orchestrated: usize,
    /// Mean number of selected agents per plan
    pub average_agents_per_turn: f64,
    /// How often each scene type was planned
    pub scene_type_distribution: BTreeMap<String, usize>,
    /// Most frequent scene type, if any plan was recorded
    pub most_common_scene: Option<String>,
}

/// Plans turns, preferring the generation service and falling back locally.
#[derive(Debug)]
pub struct Orchestrator {
    service: Arc<NarrativeService>,
    history: Vec<PlanRecord>,
}

impl Orchestrator {
    /// An orchestrator with no recorded plans.
    pub fn new(service: Arc<NarrativeService>) -> Self {
        Self {
            service,
            history: Vec::new(),
        }
    }

    /// Ask the service for a plan; fall back to [`default_plan`] on any
    /// failure. Never fails. Every emitted plan is recorded.
    #[instrument(skip_all, fields(turn = state.turn, stage = state.stage))]
    pub async fn determine_turn_flow(
        &mut self,
        state: &GameState,
        metrics: &mut UsageMetrics,
    ) -> ExecutionPlan {
        let plan = match self.request_plan(state, metrics).await {
            Ok(plan) => {
                debug!(agents = plan.len(), scene = %plan.scene_type, "Using generated plan");
                plan
            }
            Err(e) => {
                warn!(error = %e, "Falling back to default plan");
                metrics.record_fallback();
                default_plan(state)
            }
        };

        info!(
            order = ?plan.execution_order,
            scene = %plan.scene_type,
            "Turn planned"
        );
        self.history.push(PlanRecord {
            turn: state.turn,
            plan: plan.clone(),
            timestamp: Utc::now(),
        });
        plan
    }

    async fn request_plan(
        &self,
        state: &GameState,
        metrics: &mut UsageMetrics,
    ) -> SagaResult<ExecutionPlan> {
        let request = GenerationRequest::builder()
            .system_context(ORCHESTRATOR_CONTEXT)
            .task("Analyze the game state and create an execution plan for this turn.")
            .data(serde_json::json!({
                "gameContext": game_digest(state, 5),
                "currentTurn": state.turn,
                "currentStage": state.stage,
                "lastAction": state.history.last(),
            }))
            .output_format(output_format::<PlanDocument>())
            .max_tokens(1500u32)
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::InvalidRequest(e.to_string())))?;

        let document: PlanDocument = self.service.complete(metrics, &request).await?;
        Ok(document.into_plan()?)
    }

    /// Every recorded plan, oldest first.
    pub fn history(&self) -> &[PlanRecord] {
        &self.history
    }

    /// Statistics over the recorded plans.
    pub fn stats(&self) -> OrchestratorStats {
        let total = self.history.len();
        let agents: usize = self
            .history
            .iter()
            .map(|r| r.plan.agents_to_call.len())
            .sum();

        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        for record in &self.history {
            *distribution
                .entry(record.plan.scene_type.to_string())
                .or_default() += 1;
        }

        // Ties resolve to the alphabetically first scene type
        let most_common_scene = distribution
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(scene, _)| scene.clone());

        OrchestratorStats {
            total_turns_orchestrated: total,
            average_agents_per_turn: if total == 0 {
                0.0
            } else {
                agents as f64 / total as f64
            },
            scene_type_distribution: distribution,
            most_common_scene,
        }
    }
}
