use clap::Parser;
use serde_json::Value;
use std::fs;
use std::time::Instant;
use stepform::prelude::*;
use tracing_subscriber::EnvFilter;

/// Replays one form submission from JSON files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the form definition JSON file (steps, constraints, options)
    definition_path: String,
    /// Optional path to a draft JSON file, merged over the definition's initial values
    draft_path: Option<String>,
    /// Optional path to a recorded server response (`{"data": ...}` or `{"error": ...}`)
    #[arg(short, long)]
    response: Option<String>,

    /// Validate against the strict (final) constraint set
    #[arg(short, long)]
    strict: bool,

    /// Print the controller's debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "stepform=debug"
    } else {
        "stepform=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. Loading ---
    let definition = FormDefinition::from_file(&cli.definition_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load form definition '{}': {}",
            cli.definition_path, e
        ))
    });
    let seed = cli.draft_path.as_deref().map(|path| {
        Draft::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load draft '{}': {}", path, e)))
    });
    let response = cli.response.as_deref().map(|path| {
        let content = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read response file '{}': {}", path, e))
        });
        serde_json::from_str::<Value>(&content)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse response JSON: {}", e)))
    });

    let mut form = definition
        .into_controller(seed)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid form definition: {}", e)));

    println!(
        "Loaded form with {} steps ({} draft fields)",
        form.step_count(),
        form.draft().len()
    );
    for (index, step) in form.steps().iter().enumerate() {
        println!("  -> Step {} '{}': {}", index, step.name, step.fields.join(", "));
    }

    // --- 2. Validation / Submission ---
    let mode = if cli.strict { "strict" } else { "draft" };
    let attempt = match response {
        Some(response) => {
            println!("\nSubmitting in {} mode...", mode);
            let submitter = FnSubmitter::new(move |_draft, _strict| parse_response(response.clone()));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));
            runtime
                .block_on(form.submit(cli.strict, &submitter))
                .unwrap_or_else(|e| exit_with_error(&format!("Submission failed: {}", e)))
        }
        None => {
            println!("\nValidating in {} mode (no response file, nothing is sent)...", mode);
            let valid = form
                .apply_validation(cli.strict)
                .unwrap_or_else(|e| exit_with_error(&format!("Validation failed: {}", e)));
            if valid {
                println!("  -> Draft is valid");
                print_summary(&form, None, total_start);
                return;
            }
            SubmitAttempt::NotSent
        }
    };

    print_summary(&form, Some(attempt), total_start);
}

fn print_summary(form: &FormController, attempt: Option<SubmitAttempt>, start: Instant) {
    println!("\n--- Form State ---");
    if let Some(attempt) = attempt {
        println!("Attempt:          {:?}", attempt);
    }
    println!("Submission state: {:?}", form.state());
    println!(
        "Current step:     {} '{}'",
        form.current_step(),
        form.current_step_name()
    );
    let outcome = form.outcome();
    println!("Has server id:    {}", outcome.has_server_id);
    println!("Fully validated:  {}", outcome.is_fully_validated);

    if form.errors().is_empty() {
        println!("Errors:           none");
    } else {
        let rendered = serde_json::to_string_pretty(form.errors())
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to render errors: {}", e)));
        println!("Errors:\n{}", rendered);
    }

    println!("\n--- Draft ---");
    let draft = serde_json::to_string_pretty(form.draft())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render draft: {}", e)));
    println!("{}", draft);

    println!("\nTotal Execution: {:?}", start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
