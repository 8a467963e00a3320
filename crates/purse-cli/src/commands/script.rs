//! Line-oriented sandbox script format.
//!
//! One command per line, arguments separated by whitespace. Blank lines and
//! lines starting with `#` are ignored. The token `$last` stands for the most
//! recent purchase token delivered by a purchase update.

use anyhow::{Context, Result, anyhow, bail};
use purse_core::flow::ReplacementMode;
use purse_core::model::ProductKind;

/// Placeholder resolved at run time to the latest minted purchase token.
pub const LAST_TOKEN: &str = "$last";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Connect,
    Disconnect,
    Resume,
    SetAccountId(String),
    SetProfileId(String),
    SetPersonalized(bool),
    QueryCatalog(Vec<(String, ProductKind)>),
    QueryPurchases(ProductKind),
    PurchaseOneTime(String),
    PurchaseConsumable(Vec<String>),
    PurchaseSubscription {
        product_id: String,
        base_plan_id: String,
    },
    UpdateSubscription {
        product_id: String,
        base_plan_id: String,
        old_purchase_token: String,
        replacement_mode: ReplacementMode,
        external_transaction_id: Option<String>,
    },
    Acknowledge(String),
    Consume(String),
}

/// A parsed command with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub text: String,
    pub command: ScriptCommand,
}

pub fn parse_script(content: &str) -> Result<Vec<ScriptLine>> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                return None;
            }
            Some(
                parse_line(text)
                    .map(|command| ScriptLine {
                        line: index + 1,
                        text: text.to_string(),
                        command,
                    })
                    .with_context(|| format!("line {}: '{}'", index + 1, text)),
            )
        })
        .collect()
}

pub fn parse_line(text: &str) -> Result<ScriptCommand> {
    let mut parts = text.split_whitespace();
    let name = parts.next().ok_or_else(|| anyhow!("empty command"))?;
    let args: Vec<&str> = parts.collect();

    let command = match name {
        "connect" => {
            no_args(name, &args)?;
            ScriptCommand::Connect
        }
        "disconnect" => {
            no_args(name, &args)?;
            ScriptCommand::Disconnect
        }
        "resume" => {
            no_args(name, &args)?;
            ScriptCommand::Resume
        }
        "set-account-id" => ScriptCommand::SetAccountId(single(name, &args)?),
        "set-profile-id" => ScriptCommand::SetProfileId(single(name, &args)?),
        "set-personalized" => {
            let value = single(name, &args)?;
            let flag = value
                .parse::<bool>()
                .with_context(|| format!("expected true or false, got '{}'", value))?;
            ScriptCommand::SetPersonalized(flag)
        }
        "query-catalog" => {
            if args.is_empty() {
                bail!("query-catalog needs at least one id:kind pair");
            }
            let pairs = args
                .iter()
                .map(|arg| parse_pair(arg))
                .collect::<Result<Vec<_>>>()?;
            ScriptCommand::QueryCatalog(pairs)
        }
        "query-purchases" => ScriptCommand::QueryPurchases(parse_kind(&single(name, &args)?)?),
        "purchase-one-time" => ScriptCommand::PurchaseOneTime(single(name, &args)?),
        "purchase-consumable" => {
            if args.is_empty() {
                bail!("purchase-consumable needs at least one product id");
            }
            ScriptCommand::PurchaseConsumable(args.iter().map(|a| a.to_string()).collect())
        }
        "purchase-subscription" => match args.as_slice() {
            [product_id, base_plan_id] => ScriptCommand::PurchaseSubscription {
                product_id: product_id.to_string(),
                base_plan_id: base_plan_id.to_string(),
            },
            _ => bail!("usage: purchase-subscription <product> <base-plan>"),
        },
        "update-subscription" => match args.as_slice() {
            [product_id, base_plan_id, old_token, mode, rest @ ..] if rest.len() <= 1 => {
                ScriptCommand::UpdateSubscription {
                    product_id: product_id.to_string(),
                    base_plan_id: base_plan_id.to_string(),
                    old_purchase_token: old_token.to_string(),
                    replacement_mode: parse_replacement_mode(mode)?,
                    external_transaction_id: rest.first().map(|s| s.to_string()),
                }
            }
            _ => bail!(
                "usage: update-subscription <product> <base-plan> <old-token> <mode> [external-id]"
            ),
        },
        "acknowledge" => ScriptCommand::Acknowledge(single(name, &args)?),
        "consume" => ScriptCommand::Consume(single(name, &args)?),
        other => bail!("unknown command '{}'", other),
    };

    Ok(command)
}

fn no_args(name: &str, args: &[&str]) -> Result<()> {
    if !args.is_empty() {
        bail!("{} takes no arguments", name);
    }
    Ok(())
}

fn single(name: &str, args: &[&str]) -> Result<String> {
    match args {
        [value] => Ok(value.to_string()),
        _ => bail!("{} takes exactly one argument", name),
    }
}

fn parse_kind(value: &str) -> Result<ProductKind> {
    Ok(value.parse::<ProductKind>()?)
}

fn parse_pair(arg: &str) -> Result<(String, ProductKind)> {
    let (id, kind) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("expected id:kind, got '{}'", arg))?;
    Ok((id.to_string(), parse_kind(kind)?))
}

/// Accepts a numeric backend code or a snake_case mode name.
fn parse_replacement_mode(value: &str) -> Result<ReplacementMode> {
    if let Ok(code) = value.parse::<i32>() {
        return Ok(ReplacementMode::from_code(code));
    }

    let mode = match value {
        "with_time_proration" => ReplacementMode::WithTimeProration,
        "charge_prorated_price" => ReplacementMode::ChargeProratedPrice,
        "without_proration" => ReplacementMode::WithoutProration,
        "charge_full_price" => ReplacementMode::ChargeFullPrice,
        "deferred" => ReplacementMode::Deferred,
        "unknown" => ReplacementMode::Unknown,
        other => bail!("unknown replacement mode '{}'", other),
    };
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let script = parse_script("# setup\n\nconnect\n  # indented comment\nresume\n").unwrap();

        assert_eq!(script.len(), 2);
        assert_eq!(script[0].line, 3);
        assert_eq!(script[0].command, ScriptCommand::Connect);
        assert_eq!(script[1].line, 5);
    }

    #[test]
    fn test_query_catalog_pairs() {
        let command = parse_line("query-catalog coins:inapp premium:subscription").unwrap();

        assert_eq!(
            command,
            ScriptCommand::QueryCatalog(vec![
                ("coins".to_string(), ProductKind::OneTime),
                ("premium".to_string(), ProductKind::Subscription),
            ])
        );
    }

    #[test]
    fn test_query_catalog_rejects_bare_id() {
        assert!(parse_line("query-catalog coins").is_err());
        assert!(parse_line("query-catalog coins:weekly").is_err());
    }

    #[test]
    fn test_update_subscription_with_and_without_external_id() {
        let plain = parse_line("update-subscription premium annual $last 2").unwrap();
        let external =
            parse_line("update-subscription premium annual old deferred ext-1").unwrap();

        assert_eq!(
            plain,
            ScriptCommand::UpdateSubscription {
                product_id: "premium".to_string(),
                base_plan_id: "annual".to_string(),
                old_purchase_token: LAST_TOKEN.to_string(),
                replacement_mode: ReplacementMode::ChargeProratedPrice,
                external_transaction_id: None,
            }
        );
        match external {
            ScriptCommand::UpdateSubscription {
                replacement_mode,
                external_transaction_id,
                ..
            } => {
                assert_eq!(replacement_mode, ReplacementMode::Deferred);
                assert_eq!(external_transaction_id.as_deref(), Some("ext-1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_argument_count_is_checked() {
        assert!(parse_line("connect now").is_err());
        assert!(parse_line("acknowledge").is_err());
        assert!(parse_line("purchase-subscription premium").is_err());
        assert!(parse_line("set-personalized maybe").is_err());
    }

    #[test]
    fn test_error_names_the_line() {
        let err = parse_script("connect\nfly-away\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
