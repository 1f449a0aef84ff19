//! The static Tool Catalog — ground truth for the Planner's
//! prompt, the Executor's dispatch validator, and `dry_run`.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Which model role a step prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredLlm {
    /// General reasoning / planning model.
    Reasoning,
    /// A model specialized for reading or writing code.
    Coding,
    /// A vision-capable model.
    Vision,
}

impl Default for PreferredLlm {
    fn default() -> Self {
        PreferredLlm::Reasoning
    }
}

impl std::str::FromStr for PreferredLlm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reasoning" => Ok(PreferredLlm::Reasoning),
            "coding" => Ok(PreferredLlm::Coding),
            "vision" => Ok(PreferredLlm::Vision),
            _ => Err(()),
        }
    }
}

/// Catalog entry for one `(tool, action)` pair.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    /// Argument names this action requires.
    pub required_args: &'static [&'static str],
    /// Argument names this action accepts but does not require.
    pub optional_args: &'static [&'static str],
    /// Model role used when a plan step omits `preferred_llm`.
    pub default_llm: PreferredLlm,
    /// Whether this action performs a write or other external side effect.
    pub sensitive: bool,
}

/// The full static tool catalog: `tool -> action -> spec`.
pub struct ToolCatalog {
    tools: HashMap<&'static str, HashMap<&'static str, ActionSpec>>,
}

impl ToolCatalog {
    /// Whether `tool` exists in the catalog at all.
    pub fn has_tool(&self, tool: &str) -> bool {
        self.tools.contains_key(tool)
    }

    /// Look up the spec for a `(tool, action)` pair.
    pub fn action(&self, tool: &str, action: &str) -> Option<&ActionSpec> {
        self.tools.get(tool)?.get(action)
    }

    /// Every action name declared for a tool, for prompt rendering and `/health` reporting.
    pub fn actions_for(&self, tool: &str) -> Vec<&'static str> {
        self.tools
            .get(tool)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// All tool names in catalog order.
    pub fn tools(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tools.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Render a compact textual catalog for the Planner's prompt:
    /// one line per `(tool, action)` listing its required args.
    pub fn render_for_prompt(&self) -> String {
        let mut out = String::new();
        for tool in self.tools() {
            let mut actions: Vec<_> = self.actions_for(tool);
            actions.sort_unstable();
            for action in actions {
                let spec = self.action(tool, action).expect("just listed");
                out.push_str(&format!(
                    "- {tool}.{action}(required: {}, optional: {})\n",
                    spec.required_args.join(", "),
                    spec.optional_args.join(", "),
                ));
            }
        }
        out
    }
}

fn spec(
    required: &'static [&'static str],
    optional: &'static [&'static str],
    default_llm: PreferredLlm,
    sensitive: bool,
) -> ActionSpec {
    ActionSpec {
        required_args: required,
        optional_args: optional,
        default_llm,
        sensitive,
    }
}

fn build_catalog() -> ToolCatalog {
    use PreferredLlm::*;
    let mut tools: HashMap<&'static str, HashMap<&'static str, ActionSpec>> = HashMap::new();

    let mut files = HashMap::new();
    files.insert("read_file", spec(&["path"], &[], Reasoning, false));
    files.insert("write_file", spec(&["path", "content"], &[], Coding, true));
    files.insert("list_dir", spec(&["path"], &[], Reasoning, false));
    files.insert("delete_file", spec(&["path"], &[], Reasoning, true));
    files.insert("file_exists", spec(&["path"], &[], Reasoning, false));
    files.insert("file_info", spec(&["path"], &[], Reasoning, false));
    tools.insert("files", files);

    let mut memory = HashMap::new();
    memory.insert(
        "add_message",
        spec(&["session_id", "role", "content"], &["metadata"], Reasoning, false),
    );
    memory.insert("get_messages", spec(&["session_id"], &["limit"], Reasoning, false));
    memory.insert("get_context", spec(&["session_id"], &["max_messages"], Reasoning, false));
    memory.insert("search", spec(&["query"], &["session_id", "limit"], Reasoning, false));
    memory.insert("clear_session", spec(&["session_id"], &[], Reasoning, true));
    memory.insert("list_sessions", spec(&[], &[], Reasoning, false));
    tools.insert("memory", memory);

    let mut rag = HashMap::new();
    rag.insert(
        "add_document",
        spec(&["dataset", "filename", "content"], &["metadata"], Coding, true),
    );
    rag.insert("query", spec(&["dataset", "text"], &["top_k", "filters"], Reasoning, false));
    rag.insert("list_documents", spec(&["dataset"], &[], Reasoning, false));
    rag.insert("list_datasets", spec(&[], &[], Reasoning, false));
    rag.insert("delete_document", spec(&["document_id"], &[], Reasoning, true));
    rag.insert("delete_dataset", spec(&["dataset"], &[], Reasoning, true));
    rag.insert("get_dataset_info", spec(&["dataset"], &[], Reasoning, false));
    rag.insert("cleanup_memory", spec(&[], &["retention_days"], Reasoning, true));
    tools.insert("rag", rag);

    let mut vision = HashMap::new();
    vision.insert("analyze_image", spec(&["path"], &["prompt"], Vision, false));
    vision.insert("extract_text", spec(&["path"], &[], Vision, false));
    vision.insert("analyze_screenshot", spec(&[], &["prompt"], Vision, false));
    tools.insert("vision", vision);

    let mut search = HashMap::new();
    search.insert("search_web", spec(&["query"], &["limit"], Reasoning, false));
    search.insert("search_news", spec(&["query"], &["limit"], Reasoning, false));
    search.insert("search_all", spec(&["query"], &["limit"], Reasoning, false));
    tools.insert("search", search);

    let mut system = HashMap::new();
    system.insert("snapshot", spec(&[], &[], Reasoning, false));
    system.insert("list_processes", spec(&[], &[], Reasoning, false));
    system.insert("kill_process", spec(&["pid"], &[], Reasoning, true));
    system.insert("open_file", spec(&["path"], &[], Reasoning, true));
    system.insert("open_folder", spec(&["path"], &[], Reasoning, true));
    system.insert("run_program", spec(&["path"], &["args"], Reasoning, true));
    tools.insert("system", system);

    let mut control = HashMap::new();
    control.insert("move_mouse", spec(&["x", "y"], &[], Reasoning, true));
    control.insert("click_mouse", spec(&[], &["button"], Reasoning, true));
    control.insert("scroll", spec(&["amount"], &[], Reasoning, true));
    control.insert("type", spec(&["text"], &[], Reasoning, true));
    control.insert("keypress", spec(&["key"], &[], Reasoning, true));
    tools.insert("control", control);

    let mut audio = HashMap::new();
    audio.insert("transcribe", spec(&["path"], &[], Reasoning, false));
    audio.insert("text_to_speech", spec(&["text"], &["voice"], Reasoning, true));
    audio.insert("analyze", spec(&["path"], &[], Reasoning, false));
    tools.insert("audio", audio);

    let mut documents = HashMap::new();
    documents.insert(
        "generate_document",
        spec(&["format", "content"], &["path"], Coding, true),
    );
    documents.insert(
        "fill_template",
        spec(&["template_path", "values"], &["output_path"], Coding, true),
    );
    tools.insert("documents", documents);

    let mut llm = HashMap::new();
    llm.insert("generate", spec(&["prompt"], &["model", "max_tokens"], Reasoning, false));
    llm.insert("chat", spec(&["messages"], &["model"], Reasoning, false));
    llm.insert("list_models", spec(&[], &[], Reasoning, false));
    tools.insert("llm", llm);

    ToolCatalog { tools }
}

/// The process-wide tool catalog singleton.
pub static CATALOG: LazyLock<ToolCatalog> = LazyLock::new(build_catalog);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_tool_from_spec_is_present() {
        for tool in [
            "files", "memory", "rag", "vision", "search", "system", "control", "audio",
            "documents", "llm",
        ] {
            assert!(CATALOG.has_tool(tool), "missing tool {tool}");
        }
    }

    #[test]
    fn sensitive_actions_match_spec_list() {
        assert!(CATALOG.action("files", "write_file").unwrap().sensitive);
        assert!(CATALOG.action("files", "delete_file").unwrap().sensitive);
        assert!(CATALOG.action("system", "kill_process").unwrap().sensitive);
        assert!(CATALOG.action("rag", "add_document").unwrap().sensitive);
        assert!(!CATALOG.action("rag", "query").unwrap().sensitive);
        assert!(!CATALOG.action("files", "read_file").unwrap().sensitive);
    }

    #[test]
    fn unknown_tool_or_action_is_none() {
        assert!(CATALOG.action("nope", "whatever").is_none());
        assert!(CATALOG.action("files", "whatever").is_none());
    }

    #[test]
    fn render_for_prompt_lists_every_tool() {
        let rendered = CATALOG.render_for_prompt();
        assert!(rendered.contains("files.read_file"));
        assert!(rendered.contains("rag.query"));
    }
}
