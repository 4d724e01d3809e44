use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod admin;
pub mod claim;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod pinning;
pub mod projection;
pub mod records;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

use claim::ClaimType;
use records::DocumentType;

#[derive(Parser)]
#[command(name = "medisure-cli")]
#[command(about = "CLI client for the MediSure insurance claims contract")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "~/.medisure/config.toml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format for claims and records
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hospital dashboard: profile, assigned claims, verification
    Hospital {
        #[command(subcommand)]
        action: HospitalAction,
    },

    /// Company dashboard: profile, claim lookup, verification
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// Owner-only contract management
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Submit and inspect claims
    Claim {
        #[command(subcommand)]
        action: ClaimAction,
    },

    /// Pin documents or claim forms to the content-addressed store
    Upload {
        #[command(subcommand)]
        action: UploadAction,
    },

    /// List locally recorded uploads
    Records,

    /// Show CLI status
    Status,
}

#[derive(Subcommand)]
pub enum HospitalAction {
    /// Show the connected hospital's profile
    Status,

    /// List claims assigned to this hospital
    Claims,

    /// Verify a claim as the assigned hospital
    Verify {
        /// Claim to verify
        #[arg(long)]
        claim_id: u64,
    },
}

#[derive(Subcommand)]
pub enum CompanyAction {
    /// Show the connected company's profile
    Status,

    /// Fetch details for one claim
    Show {
        /// Claim to look up
        #[arg(long)]
        claim_id: u64,
    },

    /// Verify a claim as the assigned company
    Verify {
        /// Claim to verify
        #[arg(long)]
        claim_id: u64,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Authorize a hospital
    AddHospital {
        /// Hospital address
        #[arg(long)]
        address: String,

        /// Hospital name
        #[arg(long)]
        name: String,
    },

    /// Authorize an insurance company
    AddCompany {
        /// Company address
        #[arg(long)]
        address: String,

        /// Company name
        #[arg(long)]
        name: String,
    },

    /// Authorize an AI oracle
    AddOracle {
        /// Oracle address
        #[arg(long)]
        address: String,
    },

    /// Transfer contract ownership
    TransferOwnership {
        /// New owner address
        #[arg(long)]
        new_owner: String,
    },

    /// Pause the contract
    Pause,

    /// Unpause the contract
    Unpause,

    /// Withdraw the contract balance to the owner
    EmergencyWithdraw,
}

#[derive(Subcommand)]
pub enum ClaimAction {
    /// Submit a new claim
    Submit {
        /// Claim amount in whole tokens, e.g. 1.5
        #[arg(long)]
        amount: String,

        /// Content hash of the supporting documents
        #[arg(long)]
        document: String,

        /// Claim category
        #[arg(long, value_enum, default_value = "medical")]
        claim_type: ClaimType,

        /// Authorized hospital to assign
        #[arg(long)]
        hospital: String,

        /// AI oracle to assign
        #[arg(long)]
        oracle: String,
    },

    /// Show one claim from the claimant's point of view
    Show {
        /// Claim to look up
        #[arg(long)]
        claim_id: u64,
    },
}

#[derive(Subcommand)]
pub enum UploadAction {
    /// Pin a document file
    File {
        /// File to upload
        path: PathBuf,

        /// Document category recorded with the upload
        #[arg(long, value_enum)]
        document_type: DocumentType,
    },

    /// Pin a claim form JSON payload
    Form {
        /// JSON file with the form contents
        path: PathBuf,
    },
}
