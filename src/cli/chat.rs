//! `chat` and `test` commands.

use serde::Serialize;

use crate::cli::args::{ChatArgs, OutputFormat};
use crate::core::gateway::{GatewayClient, SequenceToken};
use crate::core::http::RequestOutcome;
use crate::core::models::{ChatCompletion, ChatMessage, Usage};
use crate::error::{ClassifiedError, DiagnosticCode, ExitCode, GatewayError, Result};
use crate::render;
use crate::storage::GatewayConfig;

/// A reply as shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub sequence: SequenceToken,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// True when the first attempt got a 401 and was retried.
    pub reauthenticated: bool,
    pub mock: bool,
}

/// Result of `chatgate test`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub connected: bool,
    pub mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
}

/// Send one conversation; on a 401, optionally clear the token and retry once.
///
/// Returns the sequence token of the dispatch whose reply is returned and
/// whether a retry happened.
///
/// # Errors
///
/// Returns the classified failure of the last attempt.
pub async fn send_with_reauth(
    client: &GatewayClient,
    messages: &[ChatMessage],
    reauth: bool,
) -> Result<(SequenceToken, ChatCompletion, bool)> {
    let (sequence, outcome) = client.dispatch_chat(messages, false).await;
    match outcome {
        RequestOutcome::Failure(err) if reauth && err.code == DiagnosticCode::Unauthorized => {
            tracing::info!(
                sequence = sequence.get(),
                "Got 401, clearing token cache and retrying once"
            );
            client.clear_token_cache();
            let (sequence, outcome) = client.dispatch_chat(messages, false).await;
            Ok((sequence, outcome.into_result()?, true))
        }
        outcome => Ok((sequence, outcome.into_result()?, false)),
    }
}

/// Execute the `chat` command.
///
/// # Errors
///
/// Returns configuration errors, the classified request failure, or an
/// `Unknown` failure when the reply has no choices.
pub async fn execute(
    args: &ChatArgs,
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let system = args
        .system
        .clone()
        .unwrap_or_else(|| config.system_prompt.clone());
    let client = GatewayClient::new(config)?;

    let mut messages = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(args.text()));

    let (sequence, completion, reauthenticated) =
        send_with_reauth(&client, &messages, !args.no_reauth).await?;
    let content = completion
        .first_content()
        .ok_or_else(|| {
            GatewayError::Request(ClassifiedError::new(
                DiagnosticCode::Unknown,
                "API returned no completion choices",
            ))
        })?
        .to_string();

    let reply = ChatReply {
        sequence,
        content,
        model: completion.model,
        usage: completion.usage,
        reauthenticated,
        mock: client.config().use_mock_data,
    };
    println!("{}", render::render_chat(&reply, format, pretty, no_color)?);
    Ok(ExitCode::Success)
}

/// Execute the `test` command. Exit 0 when connected, 1 otherwise.
///
/// # Errors
///
/// Returns configuration errors only; request failures are reported.
pub async fn execute_test(
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let client = GatewayClient::new(config)?;
    let outcome = client.probe_connection().await;
    let report = ConnectionReport {
        connected: outcome.is_success(),
        mock: client.config().use_mock_data,
        error: outcome.failure().cloned(),
    };
    println!(
        "{}",
        render::render_connection(&report, format, pretty, no_color)?
    );
    Ok(if report.connected {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    })
}
