//! Terminal approval prompts.

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Select, theme::ColorfulTheme};

use tandem_approval::{
    ApprovalDecision, ApprovalHandler, ApprovalRequest, PresentationKind, Remember,
};

/// Presents approval requests on the terminal.
pub(crate) struct TerminalApprovalHandler;

impl TerminalApprovalHandler {
    pub(crate) fn new() -> Self {
        Self
    }

    fn render(request: &ApprovalRequest) {
        eprintln!();
        eprintln!(
            "{} {}",
            "approval:".yellow().bold(),
            request.tool_name.bold()
        );
        eprintln!("  {}", request.description);
        if let Some(presentation) = &request.presentation {
            let label = match presentation.kind {
                PresentationKind::Command => "command",
                PresentationKind::Diff => "diff",
                PresentationKind::FileContent => "file",
                PresentationKind::Text => "text",
                PresentationKind::Structured => "payload",
            };
            eprintln!("  {label}: {}", presentation.content.dimmed());
        } else {
            eprintln!("  payload: {}", request.payload.to_string().dimmed());
        }
    }
}

#[async_trait]
impl ApprovalHandler for TerminalApprovalHandler {
    async fn decide(&self, request: ApprovalRequest) -> ApprovalDecision {
        Self::render(&request);

        // dialoguer blocks; run it off the async executor.
        let choice = tokio::task::spawn_blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt("allow this call?")
                .items(&["approve once", "approve for session", "deny"])
                .default(0)
                .interact()
        })
        .await;

        match choice {
            Ok(Ok(0)) => ApprovalDecision::approve(),
            Ok(Ok(1)) => ApprovalDecision::approve().with_remember(Remember::Session),
            Ok(Ok(_)) => ApprovalDecision::deny("denied at the terminal"),
            Ok(Err(_)) | Err(_) => ApprovalDecision::deny("approval prompt unavailable"),
        }
    }
}
