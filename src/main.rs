use chrono::{Duration, Utc};
use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use payflow::application::coordinator::FlowCoordinator;
use payflow::domain::credentials::{Credentials, CredentialsProvider};
use payflow::domain::ports::SharedApiClient;
use payflow::domain::transaction::{TransactionState, TransactionSummary};
use payflow::flow::configuration::FlowConfiguration;
use payflow::flow::state::{FlowEvent, FlowOutcome, FlowState, FlowStateKind};
use payflow::infrastructure::in_memory::{InMemoryApiClient, StaticCredentialsFetcher};
use payflow::interfaces::console::{ConsoleContainerFactory, ConsoleDelegate};
use payflow::interfaces::csv::PaymentMethodReader;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Drives a payment flow from the command line", long_about = None)]
struct Cli {
    /// Space the transaction belongs to
    #[arg(long, env = "PAYFLOW_SPACE_ID")]
    space_id: u64,

    /// Transaction to pay
    #[arg(long, env = "PAYFLOW_TRANSACTION_ID", default_value_t = 1)]
    transaction_id: u64,

    /// Access token issued for the transaction
    #[arg(long, env = "PAYFLOW_TOKEN", default_value = "offline")]
    token: String,

    /// Web service base URL
    #[arg(long, env = "PAYFLOW_BASE_URL")]
    base_url: Option<String>,

    /// Payment methods CSV file. If provided, runs offline without the web service.
    #[arg(long)]
    methods: Option<PathBuf>,

    /// Payment method to pay with. Without it the methods are listed and the flow is cancelled.
    #[arg(long)]
    select: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn offline_client(cli: &Cli, path: &PathBuf) -> Result<SharedApiClient> {
    let file = File::open(path).into_diagnostic()?;
    let reader = PaymentMethodReader::new(file, cli.space_id);
    let mut methods = Vec::new();
    for method in reader.payment_methods() {
        match method {
            Ok(method) => methods.push(method),
            Err(e) => eprintln!("Error reading payment method: {}", e),
        }
    }

    let client = InMemoryApiClient::new(cli.space_id)
        .with_methods(methods)
        .with_transaction(TransactionSummary {
            id: cli.transaction_id,
            state: TransactionState::Authorized,
            authorization_amount: Decimal::ZERO,
            currency: "CHF".to_string(),
        });
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let credentials = Credentials::new(
        cli.space_id,
        cli.transaction_id,
        cli.token.clone(),
        Utc::now() + Duration::hours(1),
    )
    .into_diagnostic()?;
    let provider = CredentialsProvider::new(
        cli.space_id,
        Arc::new(StaticCredentialsFetcher::new(credentials)),
    );

    // The configuration only holds a weak reference, main keeps the delegate alive.
    let delegate = Arc::new(ConsoleDelegate);
    let mut builder = FlowConfiguration::builder(provider);
    builder
        .set_container_factory(Arc::new(ConsoleContainerFactory))
        .set_delegate(&delegate);
    if let Some(base_url) = &cli.base_url {
        builder.set_api_base_url(base_url.clone());
    }
    if let Some(path) = &cli.methods {
        builder.set_api_client(offline_client(&cli, path)?);
    }
    let configuration = builder.build().into_diagnostic()?;

    let mut coordinator = FlowCoordinator::new(configuration);
    let events = coordinator.events();
    coordinator.start().into_diagnostic()?;

    let mut handled: Option<FlowStateKind> = None;
    let outcome = loop {
        let kind = coordinator.current_state().kind();
        if handled != Some(kind) {
            handled = Some(kind);
            let event = match coordinator.current_state() {
                FlowState::MethodSelection { methods } => match cli.select {
                    Some(id) if methods.iter().any(|method| method.id == id) => {
                        Some(FlowEvent::PaymentMethodSelected(id))
                    }
                    Some(id) => {
                        warn!(method_id = id, "unknown payment method");
                        eprintln!("Unknown payment method {}", id);
                        Some(FlowEvent::Cancel)
                    }
                    None => Some(FlowEvent::Cancel),
                },
                FlowState::DataCollection { .. } => Some(FlowEvent::PaymentFormSubmitted),
                _ => None,
            };
            if let Some(event) = event {
                events.send(event).into_diagnostic()?;
            }
        }

        if let Some(outcome) = coordinator.step().await.into_diagnostic()? {
            break outcome;
        }
    };

    match outcome {
        FlowOutcome::Completed => {
            println!("Outcome: completed");
            Ok(())
        }
        FlowOutcome::Cancelled => {
            println!("Outcome: cancelled");
            Ok(())
        }
        FlowOutcome::Failed(error) => Err(miette!(
            "payment flow failed with code {}: {}",
            error.code(),
            error
        )),
    }
}
