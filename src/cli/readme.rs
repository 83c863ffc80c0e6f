//! `generate-readme` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::GlobalArgs;
use crate::data::ProjectProfile;
use crate::llm::context::readme_context;
use crate::llm::{build_prompt, CompletionClient, Placeholder, PromptValues, TemplateKind};
use crate::render::{format_markdown, Block, Document, MarkdownMode};

/// README generation options.
#[derive(Parser, Debug)]
pub struct GenerateReadmeCommand {
    /// Repository to describe.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

impl GenerateReadmeCommand {
    /// Executes the README command. The README goes to stdout only.
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        crate::utils::check_input_path(&self.path)?;
        let client = super::connect(global)?;
        eprintln!("📝 Generating README...");
        let document = self.build(&client).await?;
        super::print(&document, global)
    }

    /// Profiles the repository and asks the model for a README.
    pub async fn build(&self, client: &CompletionClient) -> Result<Document> {
        let profile = ProjectProfile::analyze(&self.path)?;
        let prompt = build_prompt(
            TemplateKind::GenerateReadme,
            &PromptValues::new().with(Placeholder::AnalysisContext, readme_context(&profile)),
        )?;
        let readme = client.submit(&prompt).await?;
        Ok(readme_document(&readme))
    }
}

/// Shows the README as coloured Markdown source.
pub fn readme_document(readme: &str) -> Document {
    let mut document = Document::new();
    document.push(Block::Lines(format_markdown(
        strip_outer_fence(readme),
        MarkdownMode::Source,
    )));
    document
}

/// Removes a fence wrapping the whole answer, such as "```markdown ... ```".
fn strip_outer_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some((info, body)) = rest.split_once('\n') else {
        return trimmed;
    };
    if !matches!(info.trim(), "" | "md" | "markdown") {
        return trimmed;
    }
    body.trim_end().strip_suffix("```").map_or(trimmed, str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_utils::ConfigurableMockAiClient;

    #[test]
    fn outer_fence_is_removed() {
        assert_eq!(strip_outer_fence("```markdown\n# Demo\n```"), "# Demo");
        assert_eq!(strip_outer_fence("# Demo\n```sh\nrun\n```"), "# Demo\n```sh\nrun\n```");
        assert_eq!(strip_outer_fence("```rust\nfn main() {}\n```"), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn readme_keeps_markdown_source() {
        let text = readme_document("# Demo\n\n- **fast**").to_plain_string(80);
        assert_eq!(text, "# Demo\n\n- **fast**\n");
    }

    #[tokio::test]
    async fn build_sends_project_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "requests\n").unwrap();

        let mock = ConfigurableMockAiClient::new(vec![Ok("# Generated".to_string())]);
        let prompts = mock.prompt_handle();
        let client = CompletionClient::new(Box::new(mock));
        let cmd = GenerateReadmeCommand {
            path: dir.path().to_path_buf(),
        };

        let document = cmd.build(&client).await.unwrap();
        assert_eq!(document.to_plain_string(80), "# Generated\n");

        let (_, user) = &prompts.prompts()[0];
        assert!(user.contains("Project Type: python"));
        assert!(user.contains("- Requirements/Dependencies: yes"));
        assert!(user.contains("main.py"));
    }
}
