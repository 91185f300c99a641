//! System prompt assembly.

use crate::tools::ToolRegistry;
use std::path::Path;

/// Builds the system prompt that seeds every session.
///
/// States the workspace root and that staying inside it is an instruction,
/// not an enforced boundary.
#[must_use]
pub fn system_prompt(
    workspace_root: &Path,
    registry: &ToolRegistry,
    instructions: Option<&str>,
) -> String {
    let root = workspace_root.display();
    let mut prompt = format!(
        "You are an operations agent running inside a privileged Docker container with \
Docker-in-Docker enabled; you can and should use `docker` through the shell when the task \
calls for it.\n\
\n\
## Workspace\n\
\n\
The workspace root is `{root}`. Relative paths and shell working directories resolve against \
it. Keep all reads, writes and commands inside `{root}` unless the user explicitly asks \
otherwise.\n\
\n\
This restriction is an instruction to you, not a security boundary: nothing prevents access \
outside `{root}`, and the container itself is privileged. Act accordingly and avoid \
destructive commands outside the workspace.\n\
\n\
## Working style\n\
\n\
Use the tools below to inspect or modify files, run commands and search the web. Call tools \
when you need information or need to act; when the goal is achieved, reply with a final \
answer and no tool calls. Tool errors and non-zero exit codes are returned to you as results: \
read them and correct course.\n\
\n\
## Tools\n\
\n\
{}",
        registry.descriptions()
    );

    if let Some(extra) = instructions.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("\n## Additional instructions\n\n");
        prompt.push_str(extra.trim());
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_root_and_soft_isolation() {
        let prompt = system_prompt(Path::new("/workdir"), &ToolRegistry::new(), None);
        assert!(prompt.contains("The workspace root is `/workdir`"));
        assert!(prompt.contains("not a security boundary"));
        assert!(!prompt.contains("Additional instructions"));
    }

    #[test]
    fn prompt_appends_instructions() {
        let prompt = system_prompt(
            Path::new("/w"),
            &ToolRegistry::new(),
            Some("Prefer alpine images."),
        );
        assert!(prompt.ends_with("## Additional instructions\n\nPrefer alpine images.\n"));
    }
}
