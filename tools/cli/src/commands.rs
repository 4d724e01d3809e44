use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use log::info;

use crate::admin::{AdminDispatcher, AdminOp};
use crate::claim::Role;
use crate::config::{self, Config};
use crate::dashboard::{AssignedClaims, ClaimDashboard};
use crate::gateway::{ContractGateway, HttpGateway, SubmitClaimParams};
use crate::pinning::PinningClient;
use crate::projection::{project_party, ClaimView, PartyView};
use crate::records::{RecordKind, UploadRecord, UploadRecorder};
use crate::session::Session;
use crate::utils::{
    colorize_status, format_table, parse_units, truncate_address, validate_address,
    AMOUNT_DECIMALS,
};
use crate::{
    AdminAction, ClaimAction, CompanyAction, HospitalAction, OutputFormat, UploadAction,
};

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn claim_rows(views: &[ClaimView]) -> Vec<Vec<String>> {
    views
        .iter()
        .map(|v| {
            vec![
                v.id.to_string(),
                v.claimant_short.clone(),
                v.amount_display.clone(),
                v.date_display.clone(),
                v.status_label.to_string(),
            ]
        })
        .collect()
}

const CLAIM_HEADERS: [&str; 5] = ["Claim", "From", "Amount", "Date", "Status"];

fn print_claim_detail(view: &ClaimView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(view)?),
        OutputFormat::Table => {
            println!("Claim Details:");
            println!("  Claim ID: {}", view.id);
            println!("  Claimant: {}", view.claimant_short);
            println!("  Amount: {}", view.amount_display);
            println!("  Submission Date: {}", view.date_display);
            println!("  Status: {}", colorize_status(view.status_label));
            println!("  Hospital Verified: {}", yes_no(view.hospital_verified));
            println!("  Company Verified: {}", yes_no(view.company_verified));
            println!("  Can Verify: {}", yes_no(view.can_verify));
        }
    }
    Ok(())
}

fn print_party(kind: &str, address: &str, view: &PartyView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(view)?),
        OutputFormat::Table => {
            println!("{} Profile", kind);
            println!("  Name: {}", view.name);
            println!("  Address: {}", truncate_address(address));
            println!("  Status: {}", colorize_status(view.status_label));
            println!("  Total Verifications: {}", view.total_verifications);
            println!("  Last Verification: {}", view.last_verification);
        }
    }
    Ok(())
}

fn print_assigned(assigned: &AssignedClaims, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(assigned)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(assigned)?),
        OutputFormat::Table => {
            println!("Pending Claims:");
            println!("{}", format_table(&CLAIM_HEADERS, &claim_rows(&assigned.pending)));
            println!();
            println!("Verified Claims:");
            println!("{}", format_table(&CLAIM_HEADERS, &claim_rows(&assigned.verified)));
        }
    }
    Ok(())
}

async fn verify_claim(
    dashboard: &ClaimDashboard<HttpGateway>,
    claim_id: u64,
    format: OutputFormat,
) -> Result<()> {
    dashboard.load(claim_id).await?;

    let bar = spinner("Waiting for transaction receipt...");
    let result = dashboard.verify(claim_id).await;
    bar.finish_and_clear();

    let view = result?;
    println!("✅ Claim {} verified", claim_id);
    print_claim_detail(&view, format)
}

pub async fn hospital(action: HospitalAction, config: &Config, format: OutputFormat) -> Result<()> {
    let session = Session::connect(config)?;
    let viewer = session.require_account()?;
    let gateway = session.gateway();

    match action {
        HospitalAction::Status => {
            let party = gateway.hospital(&viewer).await?;
            let authorized = gateway.is_authorized_hospital(&viewer).await?;
            print_party("Hospital", &viewer, &project_party(&party, authorized), format)
        }
        HospitalAction::Claims => {
            let dashboard = ClaimDashboard::new(Role::Hospital, &viewer, gateway);
            let assigned = dashboard.list_assigned().await?;
            print_assigned(&assigned, format)
        }
        HospitalAction::Verify { claim_id } => {
            let dashboard = ClaimDashboard::new(Role::Hospital, &viewer, gateway);
            verify_claim(&dashboard, claim_id, format).await
        }
    }
}

pub async fn company(action: CompanyAction, config: &Config, format: OutputFormat) -> Result<()> {
    let session = Session::connect(config)?;
    let viewer = session.require_account()?;
    let gateway = session.gateway();

    match action {
        CompanyAction::Status => {
            let party = gateway.company(&viewer).await?;
            let authorized = gateway.is_authorized_company(&viewer).await?;
            print_party("Company", &viewer, &project_party(&party, authorized), format)
        }
        CompanyAction::Show { claim_id } => {
            let dashboard = ClaimDashboard::new(Role::Company, &viewer, gateway);
            let view = dashboard.load(claim_id).await?;
            print_claim_detail(&view, format)
        }
        CompanyAction::Verify { claim_id } => {
            let dashboard = ClaimDashboard::new(Role::Company, &viewer, gateway);
            verify_claim(&dashboard, claim_id, format).await
        }
    }
}

pub async fn admin(action: AdminAction, config: &Config) -> Result<()> {
    let session = Session::connect(config)?;
    let dispatcher = AdminDispatcher::new(session.gateway());

    let op = match action {
        AdminAction::AddHospital { address, name } => {
            AdminOp::AddAuthorizedHospital { address, name }
        }
        AdminAction::AddCompany { address, name } => AdminOp::AddAuthorizedCompany { address, name },
        AdminAction::AddOracle { address } => AdminOp::AddAuthorizedAiOracle { address },
        AdminAction::TransferOwnership { new_owner } => AdminOp::TransferOwnership { new_owner },
        AdminAction::Pause => AdminOp::PauseContract,
        AdminAction::Unpause => AdminOp::UnpauseContract,
        AdminAction::EmergencyWithdraw => AdminOp::EmergencyWithdraw,
    };
    let method = op.method();

    let bar = spinner("Waiting for transaction receipt...");
    let result = dispatcher.dispatch(op).await;
    bar.finish_and_clear();

    let receipt = result.with_context(|| format!("Error with {}", method))?;
    println!("✅ {} completed successfully", method);
    println!("Transaction: {}", receipt.tx_hash);
    Ok(())
}

pub async fn claim(action: ClaimAction, config: &Config, format: OutputFormat) -> Result<()> {
    let session = Session::connect(config)?;
    let gateway = session.gateway();

    match action {
        ClaimAction::Submit {
            amount,
            document,
            claim_type,
            hospital,
            oracle,
        } => {
            validate_address(&hospital).context("invalid hospital address")?;
            validate_address(&oracle).context("invalid oracle address")?;
            let amount = parse_units(&amount, AMOUNT_DECIMALS).context("invalid claim amount")?;

            let params = SubmitClaimParams {
                amount,
                document_hash: document,
                claim_type,
                hospital,
                oracle,
            };

            let bar = spinner("Submitting claim...");
            let result = gateway.submit_claim(&params).await;
            bar.finish_and_clear();

            let receipt = result?;
            if !receipt.success {
                anyhow::bail!(
                    "claim submission reverted: {}",
                    receipt.error.as_deref().unwrap_or("unknown reason")
                );
            }
            info!("claim submitted in {}", receipt.tx_hash);
            println!("✅ Claim submitted successfully!");
            if let Some(claim_id) = receipt.claim_id {
                println!("Claim ID: {}", claim_id);
            }
            println!("Transaction: {}", receipt.tx_hash);
            Ok(())
        }
        ClaimAction::Show { claim_id } => {
            let viewer = session.account().unwrap_or_default();
            let dashboard = ClaimDashboard::new(Role::Claimant, &viewer, gateway);
            let view = dashboard.load(claim_id).await?;
            print_claim_detail(&view, format)
        }
    }
}

pub async fn upload(action: UploadAction, config: &Config) -> Result<()> {
    let (api_key, secret_key) = config::pinning_credentials(config)?;
    let client = PinningClient::new(
        &config.pinning.api_url,
        &config.pinning.gateway_url,
        &api_key,
        &secret_key,
    );
    let recorder = UploadRecorder::new(config::records_path(config)?);
    let wallet = config::account(config);

    match action {
        UploadAction::File {
            path,
            document_type,
        } => {
            let pinned = client.pin_file(&path, document_type).await?;
            let size = tokio::fs::metadata(&path).await?.len();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();

            recorder
                .append(UploadRecord {
                    kind: RecordKind::Document,
                    document_type: Some(document_type),
                    name: name.clone(),
                    content_hash: pinned.hash.clone(),
                    url: pinned.url.clone(),
                    size,
                    timestamp: Utc::now(),
                    wallet,
                })
                .await?;

            println!("✅ Uploaded {}", name);
            println!("Content hash: {}", pinned.hash);
            println!("URL: {}", pinned.url);
            Ok(())
        }
        UploadAction::Form { path } => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("cannot read {}", path.display()))?;
            let form: serde_json::Value =
                serde_json::from_str(&content).context("claim form must be valid JSON")?;

            let pinned = client.pin_json(&form).await?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("form")
                .to_string();

            recorder
                .append(UploadRecord {
                    kind: RecordKind::Form,
                    document_type: None,
                    name,
                    content_hash: pinned.hash.clone(),
                    url: pinned.url.clone(),
                    size: content.len() as u64,
                    timestamp: Utc::now(),
                    wallet,
                })
                .await?;

            println!("✅ Form submitted successfully!");
            println!("Content hash: {}", pinned.hash);
            Ok(())
        }
    }
}

pub async fn records(config: &Config, format: OutputFormat) -> Result<()> {
    let recorder = UploadRecorder::new(config::records_path(config)?);
    let records = recorder.list().await?;

    if records.is_empty() {
        println!("No upload records found");
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&records)?),
        OutputFormat::Table => {
            let rows = records
                .iter()
                .map(|r| {
                    let kind = match r.document_type {
                        Some(dt) => dt.as_str().to_string(),
                        None => "form".to_string(),
                    };
                    vec![
                        kind,
                        r.name.clone(),
                        r.content_hash.clone(),
                        r.size.to_string(),
                        r.timestamp.format("%Y-%m-%d").to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            println!(
                "{}",
                format_table(&["Type", "Name", "Hash", "Size", "Date"], &rows)
            );
        }
    }
    Ok(())
}

pub async fn status(config: &Config) -> Result<()> {
    println!("MediSure CLI Status");
    println!("===================");
    println!();

    // Check configuration
    println!("Configuration:");
    println!(
        "  Network: {} ({})",
        config.network.name, config.network.rpc_url
    );
    println!(
        "  Contract Address: {}",
        config.contract.address.as_deref().unwrap_or("Not set")
    );
    println!(
        "  Account: {}",
        config::account(config)
            .as_deref()
            .map(truncate_address)
            .unwrap_or_else(|| "Not connected".to_string())
    );
    println!();

    print!("Signer key: ");
    if config::secret_key(config).is_some() {
        println!("✅ Configured");
    } else {
        println!("❌ Not set");
        println!("   Set MEDISURE_SECRET_KEY or auth.secret_key to sign transactions");
    }

    print!("Pinning credentials: ");
    if config::pinning_credentials(config).is_ok() {
        println!("✅ Configured");
    } else {
        println!("❌ Not set");
        println!("   Set MEDISURE_PINNING_KEY and MEDISURE_PINNING_SECRET to upload documents");
    }

    print!("Record store: ");
    let recorder = UploadRecorder::new(config::records_path(config)?);
    match recorder.list().await {
        Ok(records) => println!("✅ {} ({} records)", recorder.path().display(), records.len()),
        Err(_) => println!("❌ {} is not readable", recorder.path().display()),
    }

    println!();
    println!("Ready to use MediSure CLI!");

    Ok(())
}
