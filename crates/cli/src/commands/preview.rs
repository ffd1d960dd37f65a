//! Dry run of the outbound messages for a submission file.

use std::fs;
use std::path::Path;

use intake_core::{QuoteRequest, QuoteSubmission, TemplateRenderer};

use crate::commands::CommandResult;

const COMMAND: &str = "preview";

pub fn run(path: &Path) -> CommandResult {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "read_file",
                format!("could not read `{}`: {error}", path.display()),
                3,
            );
        }
    };

    let submission = match serde_json::from_str::<QuoteSubmission>(&raw) {
        Ok(submission) => submission,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "malformed_payload",
                format!("submission is not valid JSON: {error}"),
                4,
            );
        }
    };

    let request = match QuoteRequest::from_submission(submission) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(COMMAND, "validation", error.to_string(), 2);
        }
    };

    let renderer = match TemplateRenderer::new() {
        Ok(renderer) => renderer,
        Err(error) => return CommandResult::failure(COMMAND, "render", error.to_string(), 5),
    };
    let html = match renderer.email_html(&request, None) {
        Ok(html) => html,
        Err(error) => return CommandResult::failure(COMMAND, "render", error.to_string(), 5),
    };

    let output = [
        "== sms ==".to_string(),
        renderer.sms_text(&request, None),
        String::new(),
        "== email subject ==".to_string(),
        renderer.email_subject(&request),
        String::new(),
        "== email html ==".to_string(),
        html,
    ]
    .join("\n");

    CommandResult { exit_code: 0, output }
}
