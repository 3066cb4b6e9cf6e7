use crate::infra::build_intake_service;
use crate::screen::render_verdict;
use clap::Args;
use samman::applications::{
    Application, ApplicationData, ApplicationServiceError, ApplicationStatus,
    ApplicationSubmission, DocumentReview, DocumentType, FraudCheckInput, NewApplicant,
    ResidentialAddress, StatusChange, SubmittedDocument,
};
use samman::config::AppConfig;
use samman::error::AppError;

const CLEAN_AADHAAR: &str = "482915736041";
const FLAGGED_AADHAAR: &str = "731845062910";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stop after intake; skip document verification and the status walk.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let screening = AppConfig::load()?.screening;
    let service = build_intake_service(&screening);

    println!("Benefit intake demo");
    println!(
        "High-risk districts: {}",
        screening.high_risk_districts.join(", ")
    );

    service
        .register_applicant(applicant(CLEAN_AADHAAR, "Suresh Oraon", "Ranchi"))
        .await?;
    service
        .register_applicant(applicant(FLAGGED_AADHAAR, "Ram Kumar", "Bokaro"))
        .await?;

    println!("\nClean submission");
    let accepted = service
        .submit(
            CLEAN_AADHAAR,
            submission(clean_form(), documents("suresh")),
        )
        .await?;
    render_application(&accepted);

    println!("\nFlagged submission");
    let flagged_form = flagged_form();
    let preview = FraudCheckInput::for_submission(
        FLAGGED_AADHAAR,
        &flagged_form,
        &documents("ram"),
    );
    render_verdict(&service.detector().detect_fraud(&preview).await);
    match service
        .submit(FLAGGED_AADHAAR, submission(flagged_form, documents("ram")))
        .await
    {
        Err(ApplicationServiceError::FraudDetected { reasons, .. }) => {
            println!("Intake refused: {}", reasons.join("; "));
        }
        Err(other) => return Err(other.into()),
        Ok(application) => {
            println!("Intake accepted unexpectedly");
            render_application(&application);
        }
    }

    if args.skip_review {
        return Ok(());
    }

    println!("\nReview");
    let verified = service
        .verify_document(
            &accepted.id,
            DocumentType::Aadhaar,
            DocumentReview {
                verified: true,
                notes: Some("matches UIDAI record".to_string()),
            },
        )
        .await?;
    println!("- aadhaar verified, risk score {}", verified.risk_score());

    let under_review = service
        .update_status(
            &accepted.id,
            StatusChange {
                status: ApplicationStatus::UnderReview,
                notes: "field visit scheduled".to_string(),
                verified_by: Some("block-officer".to_string()),
            },
        )
        .await?;
    println!(
        "- moved to {}, risk score {}",
        under_review.status.label(),
        under_review.risk_score()
    );

    let rejected = service
        .update_status(
            &accepted.id,
            StatusChange {
                status: ApplicationStatus::Rejected,
                notes: "bank account does not match applicant".to_string(),
                verified_by: Some("block-officer".to_string()),
            },
        )
        .await?;
    println!(
        "- moved to {}, risk score {}",
        rejected.status.label(),
        rejected.risk_score()
    );

    let status = service.status_by_aadhaar(CLEAN_AADHAAR).await?;
    println!(
        "\nLatest status for {}: {} (updated {})",
        CLEAN_AADHAAR,
        status.status,
        status.last_updated.format("%Y-%m-%d %H:%M:%S")
    );

    let queue = service.verification_queue(10).await?;
    if queue.is_empty() {
        println!("Verification queue: empty");
    } else {
        println!("Verification queue");
        for application in &queue {
            render_application(application);
        }
    }

    Ok(())
}

fn render_application(application: &Application) {
    println!(
        "- {} | {} | {} | risk score {} | {} document(s)",
        application.id,
        application.application_data.full_name,
        application.status.label(),
        application.risk_score(),
        application.documents.len()
    );
}

fn applicant(aadhaar: &str, name: &str, district: &str) -> NewApplicant {
    NewApplicant {
        aadhaar_number: aadhaar.to_string(),
        name: name.to_string(),
        address: Some(ResidentialAddress {
            district: district.to_string(),
            block: "Sadar".to_string(),
            panchayat: "Kanke".to_string(),
        }),
    }
}

fn submission(
    application_data: ApplicationData,
    documents: Vec<SubmittedDocument>,
) -> ApplicationSubmission {
    ApplicationSubmission {
        application_data,
        documents: Some(documents),
        location_coordinates: None,
    }
}

fn documents(prefix: &str) -> Vec<SubmittedDocument> {
    vec![
        SubmittedDocument {
            doc_type: DocumentType::Aadhaar,
            file_url: format!("https://uploads.local/{prefix}/aadhaar.jpg"),
            size_bytes: Some(48_000),
        },
        SubmittedDocument {
            doc_type: DocumentType::BankStatement,
            file_url: format!("https://uploads.local/{prefix}/passbook.png"),
            size_bytes: Some(61_000),
        },
    ]
}

fn clean_form() -> ApplicationData {
    ApplicationData {
        full_name: "Suresh Oraon".to_string(),
        age: 42,
        district: "Ranchi".to_string(),
        block: "Bero".to_string(),
        panchayat: "Itki".to_string(),
        village: "Hutup".to_string(),
        monthly_income: 8_000,
        dependents: 2,
        bank_account: "30912874561".to_string(),
        ifsc_code: "SBIN0001234".to_string(),
        bank_name: "State Bank of India".to_string(),
    }
}

fn flagged_form() -> ApplicationData {
    ApplicationData {
        full_name: "Ram Kumar".to_string(),
        age: 35,
        district: "Bokaro".to_string(),
        block: "Chas".to_string(),
        panchayat: "Temporary".to_string(),
        village: "Pindrajora".to_string(),
        monthly_income: 12_500,
        dependents: 0,
        bank_account: "50100234987".to_string(),
        ifsc_code: "HDFC0002211".to_string(),
        bank_name: "HDFC Bank".to_string(),
    }
}
