use crate::infra::{build_intake_service, read_fraud_input};
use clap::Args;
use samman::applications::FraudCheckResult;
use samman::config::AppConfig;
use samman::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// JSON file holding the aadhaar, name, address and documents to screen
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Reject documents outside the accepted formats and size limit
    #[arg(long)]
    pub(crate) strict_documents: bool,
    /// Print the raw JSON verdict instead of the summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let mut screening = AppConfig::load()?.screening;
    screening.strict_documents |= args.strict_documents;

    let input = read_fraud_input(&args.file)?;
    let service = build_intake_service(&screening);
    let result = service.detector().detect_fraud(&input).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_verdict(&result);
    }
    Ok(())
}

pub(crate) fn render_verdict(result: &FraudCheckResult) {
    println!("{}", result.message);
    println!("Risk score: {}/100", result.risk_score);
    if !result.reasons.is_empty() {
        println!("Reasons");
        for reason in &result.reasons {
            println!("- {}", reason);
        }
    }
}
