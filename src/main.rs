use clap::Parser;
use iframe_repost::config::Command;
use iframe_repost::domain::model::BatchEntryResult;
use iframe_repost::utils::error::ErrorSeverity;
use iframe_repost::utils::{logger, validation::Validate};
use iframe_repost::{
    CliConfig, DocumentConfig, HtmlFormSubmitter, QueryStringCodec, RePostController,
    RecordingSubmitter, RepostError,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    let result = match config.command {
        Command::Decode { url, json } => decode(&url, json),
        Command::Run {
            config,
            json,
            dry_run,
            delay_ms,
        } => run(&config, json, dry_run, delay_ms).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!(
                "❌ iframe-repost failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

fn decode(url: &str, json: bool) -> Result<bool, RepostError> {
    let clean_url = QueryStringCodec::strip_fragment(url);
    if !QueryStringCodec::has_query_component(clean_url) {
        println!("No query string in {}, nothing to post", url);
        return Ok(true);
    }

    let parsed = QueryStringCodec::new().parse(clean_url)?;
    let destination = QueryStringCodec::destination_of(&parsed);
    let fields = QueryStringCodec::parameters_of(&parsed)?;

    if json {
        let value = serde_json::json!({
            "destination": destination,
            "fields": fields,
            "body": QueryStringCodec::encode_fields(&fields),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("POST {}", destination);
        for (name, value) in &fields {
            println!("  {} = {}", name, value);
        }
    }
    Ok(true)
}

async fn run(
    path: &str,
    json: bool,
    dry_run: bool,
    delay_ms: Option<u64>,
) -> Result<bool, RepostError> {
    tracing::info!("📁 Loading document from: {}", path);
    let document = DocumentConfig::from_file(path)?;
    document.validate()?;

    let settings = document.controller_settings()?;
    let delay = delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| document.inter_element_delay());
    let mut elements = document.elements();

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be dispatched");
        let controller =
            RePostController::with_settings(Arc::new(RecordingSubmitter::new()), settings);
        let mut all_ok = true;
        for element in &elements {
            match controller.plan(element) {
                Ok(Some(request)) if json => println!("{}", serde_json::to_string(&request)?),
                Ok(Some(request)) => {
                    println!("{} -> POST {}", element.identifier(), request.destination);
                    println!("  body: {}", request.form_body());
                }
                Ok(None) => println!("{} -> nothing to post", element.identifier()),
                Err(e) => {
                    all_ok = false;
                    println!("{} -> ❌ {}", element.identifier(), e);
                }
            }
        }
        return Ok(all_ok);
    }

    let submitter = Arc::new(HtmlFormSubmitter::new());
    let mut controller = RePostController::with_settings(Arc::clone(&submitter), settings);
    let report = controller.process_all(&mut elements, delay).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for form in submitter.rendered() {
            println!("{}", form);
        }
        for entry in &report.entries {
            if let BatchEntryResult::Failed { error } = &entry.result {
                eprintln!("❌ {}: {}", entry.identifier, error);
            }
        }
        println!(
            "✅ Posted {} of {} frame(s)",
            report.submitted(),
            report.entries.len()
        );
    }

    Ok(!report.has_failures())
}
