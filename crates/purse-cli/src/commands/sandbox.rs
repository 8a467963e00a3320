use super::script::{LAST_TOKEN, ScriptCommand, ScriptLine, parse_script};
use anyhow::{Context, Result};
use purse_application::{BillingSession, CallbackDispatcher, EventReceiver};
use purse_core::config::SessionConfig;
use purse_core::error::{PurseError, Result as PurseResult};
use purse_core::BillingEvent;
use purse_core::model::{OperationResult, ProductKind};
use purse_infrastructure::{SandboxBackend, SandboxFixture};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Synchronous outcome of one script line.
#[derive(Debug, Serialize)]
struct CommandOutput<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    line: usize,
    command: &'a str,
    result: OperationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(fixture: &Path, script: &Path, config: SessionConfig) -> Result<()> {
    let fixture = SandboxFixture::from_file(fixture)
        .await
        .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
    let content = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let lines = parse_script(&content).context("Failed to parse script")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(fixture, config, &lines, &mut out).await
}

/// Runs a parsed script against a fresh sandbox session, writing JSON lines.
pub async fn run<W: Write>(
    fixture: SandboxFixture,
    config: SessionConfig,
    lines: &[ScriptLine],
    out: &mut W,
) -> Result<()> {
    let backend = Arc::new(SandboxBackend::new(fixture));
    let (session, dispatcher, events) = BillingSession::new(backend, config);
    let mut runner = ScriptRunner {
        session,
        dispatcher,
        events,
        last_token: None,
    };

    for line in lines {
        tracing::debug!("[Sandbox] line {}: {}", line.line, line.text);
        let outcome = runner.apply(&line.command).await;
        match outcome {
            Ok(Some(result)) => write_command(out, line, result, None)?,
            Ok(None) => {}
            Err(err) => {
                let result = err.to_operation_result();
                write_command(out, line, result, Some(err.to_string()))?;
            }
        }
        runner.flush(out).await?;
    }

    Ok(())
}

struct ScriptRunner {
    session: BillingSession,
    dispatcher: CallbackDispatcher,
    events: EventReceiver,
    last_token: Option<String>,
}

impl ScriptRunner {
    /// Applies one command. Only flow launches produce a synchronous result.
    async fn apply(&self, command: &ScriptCommand) -> PurseResult<Option<OperationResult>> {
        let session = &self.session;

        match command {
            ScriptCommand::Connect => session.connect().await,
            ScriptCommand::Disconnect => session.disconnect().await,
            ScriptCommand::Resume => session.notify_resumed(),
            ScriptCommand::SetAccountId(id) => session.set_account_id(id.as_str()).await,
            ScriptCommand::SetProfileId(id) => session.set_profile_id(id.as_str()).await,
            ScriptCommand::SetPersonalized(flag) => session.set_personalized(*flag).await,
            ScriptCommand::QueryCatalog(pairs) => {
                let (ids, kinds): (Vec<String>, Vec<ProductKind>) = pairs.iter().cloned().unzip();
                session.query_catalog(&ids, &kinds).await?;
            }
            ScriptCommand::QueryPurchases(kind) => session.query_purchases(*kind).await?,
            ScriptCommand::PurchaseOneTime(product_id) => {
                return session.purchase_one_time(product_id).await.map(Some);
            }
            ScriptCommand::PurchaseConsumable(product_ids) => {
                return session.purchase_consumable(product_ids).await.map(Some);
            }
            ScriptCommand::PurchaseSubscription {
                product_id,
                base_plan_id,
            } => {
                return session
                    .purchase_subscription(product_id, base_plan_id)
                    .await
                    .map(Some);
            }
            ScriptCommand::UpdateSubscription {
                product_id,
                base_plan_id,
                old_purchase_token,
                replacement_mode,
                external_transaction_id,
            } => {
                let old_token = self.resolve(old_purchase_token)?;
                return session
                    .update_subscription(
                        product_id,
                        base_plan_id,
                        &old_token,
                        external_transaction_id.as_deref(),
                        *replacement_mode,
                    )
                    .await
                    .map(Some);
            }
            ScriptCommand::Acknowledge(token) => session.acknowledge(&self.resolve(token)?).await?,
            ScriptCommand::Consume(token) => session.consume(&self.resolve(token)?).await?,
        }

        Ok(None)
    }

    fn resolve(&self, token: &str) -> PurseResult<String> {
        if token != LAST_TOKEN {
            return Ok(token.to_string());
        }
        self.last_token
            .clone()
            .ok_or_else(|| PurseError::malformed("no purchase token delivered yet for $last"))
    }

    /// Dispatches queued callbacks and prints the resulting events.
    async fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.dispatcher.dispatch_pending().await;

        while let Ok(event) = self.events.try_recv() {
            if let BillingEvent::PurchasesUpdated { purchases, .. } = &event {
                if let Some(last) = purchases.last() {
                    self.last_token = Some(last.purchase_token.clone());
                }
            }
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }

        Ok(())
    }
}

fn write_command<W: Write>(
    out: &mut W,
    line: &ScriptLine,
    result: OperationResult,
    error: Option<String>,
) -> Result<()> {
    let output = CommandOutput {
        kind: "command_result",
        line: line.line,
        command: &line.text,
        result,
        error,
    };
    writeln!(out, "{}", serde_json::to_string(&output)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const FIXTURE: &str = r#"{
        "package_name": "com.example.game",
        "products": [
            { "product_id": "coins", "product_type": "inapp", "title": "Coins" },
            {
                "product_id": "premium",
                "product_type": "subs",
                "subscription_offer_details": [
                    { "base_plan_id": "monthly", "offer_token": "tok-monthly" }
                ]
            }
        ]
    }"#;

    async fn run_script(script: &str) -> Vec<Value> {
        let fixture = SandboxFixture::from_json_str(FIXTURE).unwrap();
        let lines = parse_script(script).unwrap();
        let mut out = Vec::new();
        run(fixture, SessionConfig::default(), &lines, &mut out)
            .await
            .unwrap();

        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_purchase_then_consume_last() {
        let output = run_script(
            "connect\n\
             query-catalog coins:inapp premium:subs\n\
             purchase-one-time coins\n\
             consume $last\n",
        )
        .await;

        let types: Vec<&str> = output.iter().map(|v| v["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec![
                "connection_ready",
                "catalog_query_completed",
                "command_result",
                "purchases_updated",
                "consume_completed",
            ]
        );
        assert_eq!(output[2]["result"]["status_code"], 0);
        assert_eq!(output[4]["result"]["status_code"], 0);
        assert_eq!(
            output[4]["purchase_token"],
            output[3]["purchases"][0]["purchase_token"]
        );
    }

    #[tokio::test]
    async fn test_errors_are_reported_as_command_results() {
        let output = run_script(
            "purchase-one-time coins\n\
             connect\n\
             query-catalog coins:inapp\n\
             disconnect\n\
             purchase-one-time coins\n",
        )
        .await;

        assert_eq!(output[0]["type"], "command_result");
        assert_eq!(output[0]["line"], 1);
        assert_eq!(output[0]["result"]["status_code"], 4);

        assert_eq!(output[1]["type"], "connection_ready");
        assert_eq!(output[2]["type"], "catalog_query_completed");

        assert_eq!(output[3]["line"], 5);
        assert_eq!(output[3]["result"]["status_code"], -1);
        assert!(output[3]["error"].as_str().unwrap().contains("not ready"));
        assert_eq!(output.len(), 4);
    }

    #[tokio::test]
    async fn test_last_token_before_any_purchase_is_malformed() {
        let output = run_script("connect\nacknowledge $last\n").await;

        assert_eq!(output[1]["type"], "command_result");
        assert_eq!(output[1]["result"]["status_code"], 5);
    }

    #[tokio::test]
    async fn test_bundled_demo_runs() {
        let fixture =
            SandboxFixture::from_json_str(include_str!("../../fixtures/sandbox.json")).unwrap();
        let lines = parse_script(include_str!("../../fixtures/demo.purse")).unwrap();
        let mut out = Vec::new();

        run(fixture, SessionConfig::default(), &lines, &mut out)
            .await
            .unwrap();

        let output: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let failures: Vec<&str> = output
            .iter()
            .filter(|v| v.get("error").is_some())
            .map(|v| v["command"].as_str().unwrap())
            .collect();
        assert_eq!(failures, vec!["purchase-one-time missing_sku"]);
        assert_eq!(output.last().unwrap()["type"], "session_resumed");
    }
}
