use anyhow::Result;
use tokentrack_core::PromptRequest;
use tokentrack_session::{SubmitOutcome, SyncOutcome};

use crate::context::App;
use crate::output;

/// Run `submit`.
pub async fn run_submit(model: Option<String>, prompt: Vec<String>) -> Result<()> {
    let app = App::open()?;
    let model = model.unwrap_or_else(|| app.config.dashboard.default_model.clone());
    let mut request = PromptRequest::new(prompt.join(" "), model);

    if app.has_stored_token()? {
        app.controller.restore().await;
    }
    app.controller.check_health().await;

    match app.controller.submit(&mut request).await? {
        SubmitOutcome::Skipped => println!("Nothing to submit: the prompt is blank."),
        SubmitOutcome::Submitted(outcome) => {
            println!("Prompt processed by {}", request.model_id);
            match outcome {
                SyncOutcome::Published(result) => match &result.error {
                    None => {
                        println!();
                        output::print_stats(&result.stats);
                        if let Some(latest) = result.logs.first() {
                            println!();
                            println!("Latest request");
                            output::print_log(latest);
                        }
                    }
                    Some(err) => eprintln!("Warning: resync after submission failed: {err}"),
                },
                SyncOutcome::Superseded { .. } => {}
            }
        }
    }
    Ok(())
}
